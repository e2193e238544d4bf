//! # ADC Telemetry Core Library
//!
//! This library implements the acquisition core for an external 24-bit
//! delta-sigma ADC clocked by a locally synthesized reference and sampled
//! over a synchronous serial bus. Samples are fanned out through a bounded
//! queue to a blocking local reader and a UDP telemetry streamer.
//!
//! ## Architecture
//!
//! The pipeline has five pieces, wired leaves-first:
//!
//! 1. [`clock`]: converts a target clock frequency into fractional-divider
//!    (APLL) synthesizer coefficients by exhaustive search.
//! 2. [`transport`]: owns the serial bus handle, writes the digital-filter
//!    register once at init, and turns every "data ready" rising edge into
//!    exactly one decoded sample.
//! 3. [`queue`]: a bounded single-producer FIFO between the trigger context
//!    and any number of blocking consumers. The producer side never blocks;
//!    overflow drops the newest sample.
//! 4. [`link`]: a small state machine tracking the outbound network path
//!    (`Down` / `Starting` / `Up`), reconnecting unconditionally on loss.
//! 5. [`telemetry`]: drains the queue and forwards each sample as one
//!    unacknowledged UDP datagram while the link is up.
//!
//! ## Concurrency model
//!
//! One producer context (the trigger handler) that must never block, plus
//! consumer threads that may block indefinitely on dequeue. The sample
//! queue is the only shared mutable structure between them; the link state
//! is a lock-free atomic read before each send. A link transition between
//! that read and the send is tolerated (best-effort check, not a guarded
//! transaction).
//!
//! ## Hardware backends
//!
//! The library is hardware-free and fully testable on any host. The
//! spidev/gpio-cdev backends live in the binary crate behind the
//! `hardware` feature; everything here talks to traits
//! ([`transport::AdcBus`], [`transport::TriggerSource`],
//! [`link::LinkControl`]) instead.

// Module declarations
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod link;
pub mod queue;
pub mod sim;
pub mod telemetry;
pub mod transport;
pub mod vga;

/// A single ADC conversion result.
///
/// The device produces a 24-bit two's-complement code; the transport
/// sign-extends it to a host integer, so values span
/// `[-8_388_608, 8_388_607]`. A sample has no identity beyond its queue
/// position and is consumed exactly once by whichever consumer dequeues it.
pub type Sample = i32;
