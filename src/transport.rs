//! # ADC Bus Transport
//!
//! Owns the synchronous serial bus connection to the external delta-sigma
//! ADC. The device protocol is a 2-bit command plus a 6-bit register
//! address followed by the payload: a one-byte write to the digital-filter
//! register at initialization, then a 3-byte read of the conversion-result
//! register on every data-ready edge.
//!
//! The actual bus is behind the [`AdcBus`] trait so the acquisition path
//! can be exercised against a scripted bus in tests; the spidev-backed
//! implementation lives in the binary crate behind the `hardware` feature.
//!
//! ## The trigger context
//!
//! [`AdcTransport::on_data_ready`] is the acquisition callback. It runs in
//! the trigger's execution context, where blocking and allocation are off
//! limits and there is nobody to report an error to. A failed transaction
//! or a full queue therefore drops the sample silently; a relaxed counter
//! records the loss for diagnosis but is not an error path.

use crate::config::AdcConfig;
use crate::queue::SampleQueue;
use crate::Sample;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

/// Register index of the digital-filter configuration register.
pub const DIGITAL_FILTER_REGISTER: u8 = 0x19;
/// Register index of the conversion-result register.
pub const CONVERSION_RESULT_REGISTER: u8 = 0x2c;
/// A conversion result is exactly three bytes (24 data bits).
pub const RESULT_BYTES: usize = 3;

/// Offset subtracted to turn the 24-bit unsigned ADC code into a signed
/// sample (half the representable range).
const SIGN_OFFSET: i32 = 1 << 23;

/// Errors from bus, device, or trigger setup and from bus transactions.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Line configuration or bus open failed
    #[error("serial bus initialization failed: {0}")]
    BusInit(String),
    /// The device rejected or failed the filter-configuration write
    #[error("device configuration failed: {0}")]
    DeviceConfig(String),
    /// The data-ready trigger line or its edge interrupt could not be set up
    #[error("trigger configuration failed: {0}")]
    TriggerConfig(String),
    /// A single bus transaction failed
    #[error("bus transaction failed: {0}")]
    Transaction(String),
}

/// 2-bit bus command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Write = 0b00,
    Read = 0b01,
}

/// One fixed-format transaction on the ADC bus.
///
/// Two canonical instances exist: the one-time filter-configuration write
/// and the per-trigger conversion-result read. Only the receive buffer of
/// the read mutates per invocation; the templates themselves are immutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusTransaction {
    pub opcode: Opcode,
    /// 6-bit register index
    pub address: u8,
    /// Payload length in bits
    pub data_bits: u8,
    /// Transmit payload; meaningful for writes only
    pub tx_data: [u8; 1],
}

impl BusTransaction {
    /// A one-byte register write.
    pub fn write(address: u8, value: u8) -> Self {
        Self {
            opcode: Opcode::Write,
            address,
            data_bits: 8,
            tx_data: [value],
        }
    }

    /// A register read of `data_bits` bits.
    pub fn read(address: u8, data_bits: u8) -> Self {
        Self {
            opcode: Opcode::Read,
            address,
            data_bits,
            tx_data: [0],
        }
    }

    /// Wire header: 2-bit command in the top bits, 6-bit address below.
    pub fn header_byte(&self) -> u8 {
        ((self.opcode as u8) << 6) | (self.address & 0x3f)
    }
}

/// Digital-filter register payload: filter type code in the upper bits,
/// decimation rate in the lower.
pub fn filter_configuration(filter_type: u8, decimation_rate: u8) -> u8 {
    ((filter_type & 0b111) << 4) | (decimation_rate & 0b1111)
}

/// Reassemble three little-endian bytes into a signed 24-bit sample.
///
/// `sample = (b0 + 256*b1 + 65536*b2) - 2^23`, yielding a value in
/// `[-8_388_608, 8_388_607]`.
pub fn decode_sample(raw: [u8; RESULT_BYTES]) -> Sample {
    let code = raw[0] as i32 + ((raw[1] as i32) << 8) + ((raw[2] as i32) << 16);
    code - SIGN_OFFSET
}

/// Synchronous full-duplex access to the ADC's serial bus.
///
/// `transact` sends the transaction header and payload and fills `rx`
/// with the received payload bytes (empty for writes). Implementations
/// must complete synchronously: the read path is called from the trigger
/// context and waits for completion in place.
pub trait AdcBus {
    fn transact(&mut self, txn: &BusTransaction, rx: &mut [u8]) -> Result<(), TransportError>;
}

/// A source of rising-edge data-ready events.
///
/// `arm` binds the transport's acquisition callback to the edge source;
/// after it returns, every rising edge invokes
/// [`AdcTransport::on_data_ready`] exactly once.
pub trait TriggerSource {
    fn arm<B: AdcBus + Send + 'static>(
        self,
        transport: AdcTransport<B>,
    ) -> Result<(), TransportError>;
}

/// The ADC producer: owns the bus handle and converts each trigger event
/// into exactly one sample pushed to the distribution queue.
pub struct AdcTransport<B: AdcBus> {
    bus: B,
    queue: SampleQueue,
    read_transaction: BusTransaction,
    dropped: AtomicU64,
}

impl<B: AdcBus> AdcTransport<B> {
    /// Open the transport: take ownership of the configured bus and issue
    /// the one-time filter-configuration write.
    pub fn initialize(
        mut bus: B,
        config: &AdcConfig,
        queue: SampleQueue,
    ) -> Result<Self, TransportError> {
        let filter_write = BusTransaction::write(
            DIGITAL_FILTER_REGISTER,
            filter_configuration(config.filter_type, config.decimation_rate),
        );
        bus.transact(&filter_write, &mut [])
            .map_err(|e| TransportError::DeviceConfig(e.to_string()))?;
        debug!(
            payload = filter_write.tx_data[0],
            "ADC digital filter configured"
        );

        Ok(Self {
            bus,
            queue,
            read_transaction: BusTransaction::read(CONVERSION_RESULT_REGISTER, 24),
            dropped: AtomicU64::new(0),
        })
    }

    /// Acquisition callback, invoked once per data-ready rising edge.
    ///
    /// Issues the conversion-result read synchronously, decodes the
    /// 24-bit code, and pushes the sample with a non-blocking enqueue.
    /// Infallible from the caller's point of view: failures drop the
    /// sample and acquisition continues on the next edge.
    pub fn on_data_ready(&mut self) {
        let mut raw = [0u8; RESULT_BYTES];
        if self.bus.transact(&self.read_transaction, &mut raw).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if !self.queue.push_from_producer(decode_sample(raw)) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of trigger events that produced no sample (failed read or
    /// full queue) since initialization.
    pub fn dropped_acquisitions(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Handle onto the queue this transport produces into.
    pub fn queue(&self) -> SampleQueue {
        self.queue.clone()
    }
}
