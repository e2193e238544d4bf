//! # Simulated Sample Producer
//!
//! Development-mode stand-in for the hardware acquisition path: a thread
//! that synthesizes a deterministic triangle wave, runs each value through
//! the real wire encode/decode, and pushes it into the distribution queue
//! at a fixed rate. This lets the local reader and the telemetry streamer
//! be exercised on any host, with no SPI bus or trigger line attached.

use crate::queue::SampleQueue;
use crate::transport::{decode_sample, RESULT_BYTES};
use crate::Sample;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Peak amplitude of the synthetic triangle wave (about 1/8 full scale).
const AMPLITUDE: Sample = 1 << 20;
/// Step between consecutive synthetic samples.
const STEP: Sample = 1 << 12;

/// Encode a sample into the device's 3-byte offset-binary wire form.
fn encode_sample(sample: Sample) -> [u8; RESULT_BYTES] {
    let code = (sample + (1 << 23)) as u32;
    [code as u8, (code >> 8) as u8, (code >> 16) as u8]
}

/// The triangle wave value at step `n`.
fn triangle(n: u64) -> Sample {
    let period = (4 * AMPLITUDE / STEP) as u64;
    let phase = (n % period) as Sample * STEP;
    if phase < 2 * AMPLITUDE {
        phase - AMPLITUDE
    } else {
        3 * AMPLITUDE - phase
    }
}

/// Spawn the synthetic producer. Pushes one sample per `interval` into
/// `queue` for the life of the process, dropping on overflow exactly like
/// the trigger path.
pub fn spawn_producer(queue: SampleQueue, interval: Duration) -> thread::JoinHandle<()> {
    info!("starting simulated sample producer");
    thread::spawn(move || {
        let mut n: u64 = 0;
        loop {
            // Round-trip through the wire format so the simulated stream
            // covers the same decode path as real acquisitions.
            let sample = decode_sample(encode_sample(triangle(n)));
            queue.push_from_producer(sample);
            n += 1;
            thread::sleep(interval);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_is_bounded_and_periodic() {
        let period = (4 * AMPLITUDE / STEP) as u64;
        for n in 0..2 * period {
            let value = triangle(n);
            assert!((-AMPLITUDE..=AMPLITUDE).contains(&value));
            assert_eq!(value, triangle(n + period));
        }
    }

    #[test]
    fn wave_survives_wire_round_trip() {
        for n in 0..64 {
            let value = triangle(n);
            assert_eq!(decode_sample(encode_sample(value)), value);
        }
    }
}
