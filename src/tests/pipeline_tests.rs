//! # End-to-End Pipeline Tests
//!
//! These tests drive the whole chain the way the hardware would: scripted
//! bus replies stand in for the ADC, trigger edges are delivered by
//! calling the acquisition callback directly, and telemetry datagrams are
//! collected on a loopback UDP socket.

use adc_telemetry_lib::config::AdcConfig;
use adc_telemetry_lib::link::{LinkControl, LinkEvent, LinkMonitor, LinkStateHandle};
use adc_telemetry_lib::queue::SampleQueue;
use adc_telemetry_lib::telemetry;
use adc_telemetry_lib::transport::{
    AdcBus, AdcTransport, BusTransaction, Opcode, TransportError, RESULT_BYTES,
};
use std::collections::VecDeque;
use std::net::UdpSocket;
use std::time::Duration;

/// Bus double replaying conversion results in order.
struct CannedBus {
    reads: VecDeque<[u8; RESULT_BYTES]>,
}

impl CannedBus {
    fn new(reads: &[[u8; RESULT_BYTES]]) -> Self {
        Self {
            reads: reads.iter().copied().collect(),
        }
    }
}

impl AdcBus for CannedBus {
    fn transact(&mut self, txn: &BusTransaction, rx: &mut [u8]) -> Result<(), TransportError> {
        match txn.opcode {
            Opcode::Write => Ok(()),
            Opcode::Read => {
                let payload = self
                    .reads
                    .pop_front()
                    .ok_or_else(|| TransportError::Transaction("out of canned reads".into()))?;
                rx.copy_from_slice(&payload);
                Ok(())
            }
        }
    }
}

struct NullControl;
impl LinkControl for NullControl {
    fn connect(&mut self) {}
}

fn link_up() -> LinkStateHandle {
    let (mut monitor, handle) = LinkMonitor::new(NullControl);
    monitor.handle_event(LinkEvent::StationStart);
    monitor.handle_event(LinkEvent::GotAddress);
    handle
}

fn datagram_text(payload: &[u8]) -> &str {
    let end = payload
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(payload.len());
    std::str::from_utf8(&payload[..end]).unwrap()
}

#[test]
fn trigger_edges_arrive_as_udp_datagrams() {
    // Full-scale negative, zero, full-scale positive.
    let bus = CannedBus::new(&[
        [0x00, 0x00, 0x00],
        [0x00, 0x00, 0x80],
        [0xff, 0xff, 0xff],
    ]);
    let queue = SampleQueue::with_capacity(10);
    let mut transport =
        AdcTransport::initialize(bus, &AdcConfig::default(), queue.clone()).unwrap();

    for _ in 0..3 {
        transport.on_data_ready();
    }
    assert_eq!(queue.len(), 3);

    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = receiver.local_addr().unwrap().port();

    telemetry::stream("127.0.0.1", port, 3, &queue, &link_up()).unwrap();

    let mut buf = [0u8; 256];
    for expected in [
        "adcReading:-8388608|t",
        "adcReading:0|t",
        "adcReading:8388607|t",
    ] {
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(len, telemetry::DATAGRAM_LEN);
        assert_eq!(datagram_text(&buf[..len]), expected);
    }
    assert!(queue.is_empty());
}

#[test]
fn local_reader_and_streamer_compete_for_samples() {
    // One destructive stream: whatever the local reader takes, the
    // streamer never sees.
    let bus = CannedBus::new(&[
        [0x01, 0x00, 0x80],
        [0x02, 0x00, 0x80],
        [0x03, 0x00, 0x80],
        [0x04, 0x00, 0x80],
    ]);
    let queue = SampleQueue::with_capacity(10);
    let mut transport =
        AdcTransport::initialize(bus, &AdcConfig::default(), queue.clone()).unwrap();
    for _ in 0..4 {
        transport.on_data_ready();
    }

    // Local reader drains the first two.
    assert_eq!(queue.pop_blocking(), 1);
    assert_eq!(queue.pop_blocking(), 2);

    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = receiver.local_addr().unwrap().port();

    telemetry::stream("127.0.0.1", port, 2, &queue, &link_up()).unwrap();

    let mut buf = [0u8; 256];
    let (len, _) = receiver.recv_from(&mut buf).unwrap();
    assert_eq!(datagram_text(&buf[..len]), "adcReading:3|t");
    let (len, _) = receiver.recv_from(&mut buf).unwrap();
    assert_eq!(datagram_text(&buf[..len]), "adcReading:4|t");
}

#[test]
fn overrun_loses_newest_samples_end_to_end() {
    // More edges than queue slots: the earliest conversions survive.
    let bus = CannedBus::new(&[
        [0x01, 0x00, 0x80],
        [0x02, 0x00, 0x80],
        [0x03, 0x00, 0x80],
    ]);
    let queue = SampleQueue::with_capacity(2);
    let mut transport =
        AdcTransport::initialize(bus, &AdcConfig::default(), queue.clone()).unwrap();
    for _ in 0..3 {
        transport.on_data_ready();
    }

    assert_eq!(transport.dropped_acquisitions(), 1);
    assert_eq!(queue.pop_blocking(), 1);
    assert_eq!(queue.pop_blocking(), 2);
    assert!(queue.is_empty());
}
