//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! adc-config.toml file. It provides a centralized way to configure the
//! synthesized ADC clock, the serial bus and digital filter, the sample
//! queue, and the telemetry endpoint.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Application configuration loaded from adc-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// ADC master clock synthesis
    pub clock: ClockConfig,
    /// Serial bus and digital filter settings
    pub adc: AdcConfig,
    /// Sample distribution queue settings
    pub queue: QueueConfig,
    /// Telemetry endpoint defaults
    pub telemetry: TelemetryConfig,
}

/// ADC master clock configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct ClockConfig {
    /// Desired ADC master clock frequency in Hz
    pub target_hz: f64,
    /// Reference crystal frequency feeding the synthesizer in Hz
    pub fxtal_hz: f64,
}

/// Serial bus and digital filter configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct AdcConfig {
    /// spidev device node for the ADC bus
    pub spi_device: String,
    /// Bus clock rate in Hz
    pub spi_clock_hz: u32,
    /// Digital filter type code (3 bits)
    pub filter_type: u8,
    /// Digital filter decimation rate code
    pub decimation_rate: u8,
    /// GPIO line number carrying the data-ready signal
    pub data_ready_gpio: u32,
    /// GPIO character device exposing that line
    pub gpio_chip: String,
}

/// Sample distribution queue configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Maximum number of pending samples
    pub capacity: usize,
}

/// Telemetry endpoint configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Default remote host for telemetry datagrams
    pub host: String,
    /// Default remote UDP port
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clock: ClockConfig {
                target_hz: 16.384e6,
                fxtal_hz: crate::clock::FXTAL_HZ,
            },
            adc: AdcConfig::default(),
            queue: QueueConfig {
                capacity: crate::queue::DEFAULT_CAPACITY,
            },
            telemetry: TelemetryConfig {
                host: "localhost".to_string(),
                port: 8125,
            },
        }
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        AdcConfig {
            spi_device: "/dev/spidev0.0".to_string(),
            spi_clock_hz: 20_000_000,
            filter_type: 0b100,     // sinc filter
            decimation_rate: 0b111, // maximum decimation
            data_ready_gpio: 34,
            gpio_chip: "/dev/gpiochip0".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from adc-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("adc-config.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        target_hz = config.clock.target_hz,
                        "loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    warn!("invalid config file format: {e}");
                    warn!("using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration to adc-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("adc-config.toml", contents)?;
        info!("configuration saved to adc-config.toml");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.clock.target_hz, 16.384e6);
        assert_eq!(config.clock.fxtal_hz, 40e6);
        assert_eq!(config.adc.spi_device, "/dev/spidev0.0");
        assert_eq!(config.adc.filter_type, 0b100);
        assert_eq!(config.queue.capacity, 100);
        assert_eq!(config.telemetry.port, 8125);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.clock.target_hz, parsed.clock.target_hz);
        assert_eq!(config.adc.decimation_rate, parsed.adc.decimation_rate);
        assert_eq!(config.telemetry.host, parsed.telemetry.host);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.queue.capacity, 100);
    }

    #[test]
    fn test_load_partial_file_falls_back() {
        // Missing sections are a format error, not a crash.
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[clock]\ntarget_hz = 1.0e6").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.clock.target_hz, 16.384e6);
    }
}
