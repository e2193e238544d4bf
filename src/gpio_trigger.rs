// src/gpio_trigger.rs
use adc_telemetry_lib::transport::{AdcBus, AdcTransport, TransportError, TriggerSource};
use gpio_cdev::{Chip, EventRequestFlags, Line, LineRequestFlags};
use std::thread;
use tracing::warn;

/// Rising-edge data-ready trigger on a GPIO character device line.
pub struct CdevTrigger {
    line: Line,
}

impl CdevTrigger {
    pub fn new(chip_path: &str, offset: u32) -> Result<Self, TransportError> {
        let mut chip =
            Chip::new(chip_path).map_err(|e| TransportError::TriggerConfig(e.to_string()))?;
        let line = chip
            .get_line(offset)
            .map_err(|e| TransportError::TriggerConfig(e.to_string()))?;
        Ok(Self { line })
    }
}

impl TriggerSource for CdevTrigger {
    /// Request rising-edge events on the line and service them on a
    /// dedicated thread, one acquisition per edge, for the life of the
    /// process.
    fn arm<B: AdcBus + Send + 'static>(
        self,
        mut transport: AdcTransport<B>,
    ) -> Result<(), TransportError> {
        let events = self
            .line
            .events(
                LineRequestFlags::INPUT,
                EventRequestFlags::RISING_EDGE,
                "adc-telemetry",
            )
            .map_err(|e| TransportError::TriggerConfig(e.to_string()))?;

        thread::spawn(move || {
            for event in events {
                match event {
                    Ok(_) => transport.on_data_ready(),
                    Err(e) => warn!("data-ready event stream error: {e}"),
                }
            }
        });
        Ok(())
    }
}
