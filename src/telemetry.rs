//! # UDP Telemetry Streamer
//!
//! Drains samples from the distribution queue and forwards each one as a
//! discrete, unacknowledged UDP datagram to a configured remote endpoint.
//! Streaming is gated on the connectivity state machine: if the link is
//! not up the call fails immediately, before any address resolution or
//! socket work.
//!
//! ## Wire format
//!
//! One datagram per sample. The payload is a fixed-length 100-byte
//! buffer starting with the ASCII text `adcReading:<signed decimal>|t`
//! and zero-padded to the full length, byte-compatible with the reference
//! firmware's collector. No framing, no acknowledgment, no ordering
//! guarantee from the transport.
//!
//! ## Failure policy
//!
//! Endpoint resolution failure and a missing link are reported to the
//! caller and never retried here. A failed send of an individual
//! datagram is logged and skipped; the loop continues with the next
//! sample. There is no cancellation: a stream runs to completion of its
//! requested count.

use crate::link::LinkStateHandle;
use crate::queue::SampleQueue;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use thiserror::Error;
use tracing::{debug, error, info};

/// Every telemetry datagram is exactly this long, padded with zeros.
pub const DATAGRAM_LEN: usize = 100;

/// Errors that can occur while setting up a telemetry stream.
///
/// Per-datagram send failures are deliberately absent: they are logged
/// and skipped rather than surfaced.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The connectivity state machine is not `Up`
    #[error("network link is not up")]
    NotConnected,

    /// The endpoint did not resolve to any address
    #[error("could not resolve telemetry endpoint {0}")]
    Resolution(String),

    /// Opening the local socket failed
    #[error("socket error: {0}")]
    Socket(#[from] io::Error),
}

/// Format one sample into its fixed-length datagram payload.
pub fn format_datagram(sample: crate::Sample) -> [u8; DATAGRAM_LEN] {
    use std::io::Write;

    let mut payload = [0u8; DATAGRAM_LEN];
    let mut cursor = &mut payload[..];
    // A sign plus ten digits fits well inside the buffer; the write
    // cannot fail.
    let _ = write!(cursor, "adcReading:{sample}|t");
    payload
}

/// Stream `count` samples to `host:port`, one datagram each.
///
/// Blocks on the queue between sends; runs until `count` samples have
/// been dequeued (failed sends still consume their sample). The socket
/// and the resolved address are released when the loop finishes.
pub fn stream(
    host: &str,
    port: u16,
    count: usize,
    samples: &SampleQueue,
    link: &LinkStateHandle,
) -> Result<(), TelemetryError> {
    if !link.is_up() {
        return Err(TelemetryError::NotConnected);
    }

    info!(host, port, "resolving telemetry endpoint");
    let endpoint: SocketAddr = (host, port)
        .to_socket_addrs()
        .map_err(|_| TelemetryError::Resolution(format!("{host}:{port}")))?
        .next()
        .ok_or_else(|| TelemetryError::Resolution(format!("{host}:{port}")))?;

    info!(%endpoint, "opening telemetry socket");
    let socket = UdpSocket::bind(("0.0.0.0", 0))?;

    info!(count, "beginning transmission of telemetry data");
    for _ in 0..count {
        let sample = samples.pop_blocking();
        let payload = format_datagram(sample);
        debug!(sample, "sending telemetry reading packet");
        if let Err(e) = socket.send_to(&payload, endpoint) {
            error!("failed to send a telemetry reading packet: {e}");
        }
    }

    Ok(())
}
