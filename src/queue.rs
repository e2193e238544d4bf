//! # Sample Distribution Queue
//!
//! A bounded FIFO between the acquisition trigger context and the
//! consumers (local reader, telemetry streamer). The producer side must
//! never block: it runs in the data-ready trigger context, which has no
//! business waiting on a consumer. On a full queue the newest sample is
//! dropped (the reference hardware behaves the same way: the trigger
//! context cannot be stalled, so overflow loses data rather than time).
//!
//! The queue is a single destructive stream. When the local reader and
//! the telemetry streamer drain it concurrently they compete for samples;
//! each sample is delivered to at most one consumer.
//!
//! Built on a bounded `crossbeam-channel`, which gives us a lock-free
//! `try_send` for the producer and an indefinitely blocking `recv` for
//! consumers without holding any lock across the wait.

use crate::Sample;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Default queue depth, matching the reference firmware.
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded single-producer FIFO of [`Sample`]s.
///
/// Cloning yields another handle onto the same queue; clones share the
/// underlying channel, so consumers on different threads compete for the
/// same stream.
#[derive(Clone)]
pub struct SampleQueue {
    tx: Sender<Sample>,
    rx: Receiver<Sample>,
    capacity: usize,
}

impl SampleQueue {
    /// Create a queue with the reference capacity of 100 samples.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a queue holding at most `capacity` pending samples.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// Enqueue a sample from the producer (trigger) context.
    ///
    /// Never blocks. Returns `true` if the sample was accepted, `false`
    /// if the queue was full and the sample was dropped.
    pub fn push_from_producer(&self, sample: Sample) -> bool {
        match self.tx.try_send(sample) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            // Every handle owns both ends, so the channel cannot be
            // disconnected while a handle exists.
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Dequeue one sample, blocking the calling consumer indefinitely
    /// until one is available.
    pub fn pop_blocking(&self) -> Sample {
        self.rx
            .recv()
            .expect("queue handle owns a sender, channel cannot disconnect")
    }

    /// Number of samples currently pending.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// True if no samples are pending.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Maximum number of pending samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SampleQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order_preserved() {
        let queue = SampleQueue::with_capacity(10);
        for sample in [-3, 0, 7, 8_388_607, -8_388_608] {
            assert!(queue.push_from_producer(sample));
        }
        for expected in [-3, 0, 7, 8_388_607, -8_388_608] {
            assert_eq!(queue.pop_blocking(), expected);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_drops_newest_deterministically() {
        let queue = SampleQueue::with_capacity(3);
        assert!(queue.push_from_producer(1));
        assert!(queue.push_from_producer(2));
        assert!(queue.push_from_producer(3));

        // Queue is full: further pushes are rejected, earlier samples kept.
        assert!(!queue.push_from_producer(4));
        assert!(!queue.push_from_producer(5));
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.pop_blocking(), 1);
        assert_eq!(queue.pop_blocking(), 2);
        assert_eq!(queue.pop_blocking(), 3);
    }

    #[test]
    fn pop_blocks_until_sample_arrives() {
        let queue = SampleQueue::with_capacity(4);
        let consumer_side = queue.clone();

        let handle = thread::spawn(move || consumer_side.pop_blocking());

        // Give the consumer time to park on the empty queue.
        thread::sleep(Duration::from_millis(50));
        assert!(queue.push_from_producer(42));
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn clones_compete_for_the_same_stream() {
        let queue = SampleQueue::with_capacity(4);
        let other = queue.clone();

        assert!(queue.push_from_producer(11));
        assert_eq!(other.pop_blocking(), 11);
        assert!(queue.is_empty());
    }
}
