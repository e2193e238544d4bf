//! # ADC Telemetry Application Entry Point
//!
//! This binary wires the acquisition core together: it solves the APLL
//! coefficients for the configured ADC clock, brings up the bus transport
//! and data-ready trigger (or the simulated producer when built without
//! hardware support), and dispatches the two consumer-facing operations:
//! a blocking local reader and the UDP telemetry streamer.

// Test modules
#[cfg(test)]
mod tests;

#[cfg(all(target_os = "linux", feature = "hardware"))]
mod gpio_trigger;
#[cfg(all(target_os = "linux", feature = "hardware"))]
mod hw_spi_spidev;

use adc_telemetry_lib::{
    clock,
    config::Config,
    link::{LinkControl, LinkEvent, LinkMonitor, LinkStateHandle},
    queue::SampleQueue,
    sim, telemetry,
};
use anyhow::Context;
use std::env;
use std::time::Duration;
use tracing::info;

/// Interval between simulated samples (roughly 1 kS/s).
const SIM_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Connect attempts are a no-op when the operating system manages the
/// interface; the state machine still gates telemetry.
struct OsManagedLink;

impl LinkControl for OsManagedLink {
    fn connect(&mut self) {}
}

fn usage() -> ! {
    eprintln!("usage: adc-telemetry [--simulate] <command>");
    eprintln!("commands:");
    eprintln!("  solve <hz>                       solve APLL coefficients for a frequency");
    eprintln!("  read <count>                     print <count> samples from the queue");
    eprintln!("  stream <count> [<host> <port>]   send <count> samples as UDP telemetry");
    std::process::exit(2);
}

/// Solve the ADC clock and start the sample producer, returning the
/// queue consumers drain.
fn start_acquisition(config: &Config, simulate: bool) -> anyhow::Result<SampleQueue> {
    let queue = SampleQueue::with_capacity(config.queue.capacity);

    let solution = clock::solve_with_reference(config.clock.target_hz, config.clock.fxtal_hz)
        .context("solving ADC clock coefficients")?;
    let c = solution.coefficients;
    info!(
        target_hz = solution.target_hz,
        achieved_hz = solution.achieved_hz,
        sdm0 = c.sdm0,
        sdm1 = c.sdm1,
        sdm2 = c.sdm2,
        odiv = c.odiv,
        "ADC clock solved"
    );

    if simulate {
        sim::spawn_producer(queue.clone(), SIM_SAMPLE_INTERVAL);
        return Ok(queue);
    }

    start_hardware_acquisition(config, &queue)?;
    Ok(queue)
}

/// Open the bus, configure the device, and arm the data-ready trigger.
#[cfg(all(target_os = "linux", feature = "hardware"))]
fn start_hardware_acquisition(config: &Config, queue: &SampleQueue) -> anyhow::Result<()> {
    use adc_telemetry_lib::transport::{AdcTransport, TriggerSource};

    let bus = hw_spi_spidev::SpidevAdcBus::open(&config.adc.spi_device, config.adc.spi_clock_hz)
        .context("opening ADC serial bus")?;
    let transport =
        AdcTransport::initialize(bus, &config.adc, queue.clone()).context("configuring ADC")?;
    gpio_trigger::CdevTrigger::new(&config.adc.gpio_chip, config.adc.data_ready_gpio)
        .context("opening data-ready trigger line")?
        .arm(transport)
        .context("arming data-ready trigger")?;
    Ok(())
}

#[cfg(not(all(target_os = "linux", feature = "hardware")))]
fn start_hardware_acquisition(_config: &Config, _queue: &SampleQueue) -> anyhow::Result<()> {
    anyhow::bail!("hardware support not enabled; rebuild with --features hardware or pass --simulate")
}

/// Bring the link state machine up for an OS-managed interface.
fn bring_up_link() -> LinkStateHandle {
    let (mut monitor, handle) = LinkMonitor::new(OsManagedLink);
    monitor.handle_event(LinkEvent::StationStart);
    monitor.handle_event(LinkEvent::GotAddress);
    handle
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let all_args: Vec<String> = env::args().skip(1).collect();
    let simulate = all_args.iter().any(|arg| arg == "--simulate");
    let args: Vec<&str> = all_args
        .iter()
        .map(String::as_str)
        .filter(|arg| *arg != "--simulate")
        .collect();

    let config = Config::load();

    match args.as_slice() {
        ["solve", hz] => {
            let target_hz: f64 = hz.parse().context("parsing target frequency")?;
            let solution = clock::solve_with_reference(target_hz, config.clock.fxtal_hz)
                .context("solving APLL coefficients")?;
            let c = solution.coefficients;
            println!("Desired Frequency: {}", solution.target_hz);
            println!("Closest Frequency: {}", solution.achieved_hz);
            println!(
                "sdm0: {}, sdm1: {}, sdm2: {}, odiv: {}",
                c.sdm0, c.sdm1, c.sdm2, c.odiv
            );
        }
        ["read", count] => {
            let count: usize = count.parse().context("parsing sample count")?;
            let queue = start_acquisition(&config, simulate)?;
            for _ in 0..count {
                println!("{}", queue.pop_blocking());
            }
        }
        ["stream", rest @ ..] => {
            let (host, port, count) = match rest {
                [count] => (
                    config.telemetry.host.clone(),
                    config.telemetry.port,
                    count.parse().context("parsing sample count")?,
                ),
                [count, host, port] => (
                    host.to_string(),
                    port.parse().context("parsing port")?,
                    count.parse().context("parsing sample count")?,
                ),
                _ => usage(),
            };
            let queue = start_acquisition(&config, simulate)?;
            let link = bring_up_link();
            telemetry::stream(&host, port, count, &queue, &link)
                .context("streaming telemetry")?;
        }
        _ => usage(),
    }

    Ok(())
}
