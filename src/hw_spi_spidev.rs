// src/hw_spi_spidev.rs
use adc_telemetry_lib::transport::{AdcBus, BusTransaction, Opcode, TransportError};
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

/// Kernel spidev backend for the ADC bus.
///
/// The device samples on the trailing clock edge with the clock idling
/// high, i.e. SPI mode 3.
pub struct SpidevAdcBus {
    dev: Spidev,
}

impl SpidevAdcBus {
    pub fn open(path: &str, clock_hz: u32) -> Result<Self, TransportError> {
        let mut dev = Spidev::open(path).map_err(|e| TransportError::BusInit(e.to_string()))?;

        let opts = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(clock_hz)
            .mode(SpiModeFlags::SPI_MODE_3)
            .build();
        dev.configure(&opts)
            .map_err(|e| TransportError::BusInit(e.to_string()))?;
        Ok(Self { dev })
    }
}

impl AdcBus for SpidevAdcBus {
    fn transact(&mut self, txn: &BusTransaction, rx: &mut [u8]) -> Result<(), TransportError> {
        // Header byte plus payload in a single chip-select window.
        let payload_len = txn.data_bits as usize / 8;
        let len = 1 + payload_len;

        let mut tx_buf = [0u8; 4];
        let mut rx_buf = [0u8; 4];
        tx_buf[0] = txn.header_byte();
        if txn.opcode == Opcode::Write {
            tx_buf[1..len].copy_from_slice(&txn.tx_data[..payload_len]);
        }

        let mut transfer = SpidevTransfer::read_write(&tx_buf[..len], &mut rx_buf[..len]);
        self.dev
            .transfer(&mut transfer)
            .map_err(|e| TransportError::Transaction(e.to_string()))?;

        if txn.opcode == Opcode::Read {
            rx.copy_from_slice(&rx_buf[1..len]);
        }
        Ok(())
    }
}
