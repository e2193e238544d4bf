//! # Auxiliary Diagnostic Voltage Inputs
//!
//! The acquisition board exposes three slow analog test points beside the
//! main delta-sigma converter: the amplifier output, the virtual ground,
//! and the reference voltage. They are read on demand (typically from an
//! operator console) to sanity-check the analog front end.
//!
//! Calibration of these inputs is handled by the host ADC driver and is
//! out of scope here; this module only names the inputs and defines the
//! reading seam. Readings come back in millivolts from the backend and
//! are converted to volts for display.

use thiserror::Error;

/// One of the board's diagnostic test points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticInput {
    /// Amplifier output
    AmpOut,
    /// Virtual ground of the analog front end
    VirtualGround,
    /// Reference voltage
    Reference,
}

impl DiagnosticInput {
    /// Console-facing name of the input.
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticInput::AmpOut => "amp_out",
            DiagnosticInput::VirtualGround => "virtual_ground",
            DiagnosticInput::Reference => "reference",
        }
    }

    /// Parse a console-facing name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "amp_out" => Some(DiagnosticInput::AmpOut),
            "virtual_ground" => Some(DiagnosticInput::VirtualGround),
            "reference" => Some(DiagnosticInput::Reference),
            _ => None,
        }
    }
}

/// Errors from diagnostic voltage reads.
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("failed to read {input}: {details}")]
    ReadFailed {
        input: &'static str,
        details: String,
    },
}

/// Backend seam for the slow auxiliary ADC.
pub trait DiagnosticAdc {
    /// Read one input, in millivolts.
    fn read_millivolts(&mut self, input: DiagnosticInput) -> Result<u32, DiagnosticsError>;
}

/// Read one input and convert to volts.
pub fn read_volts<A: DiagnosticAdc>(
    adc: &mut A,
    input: DiagnosticInput,
) -> Result<f32, DiagnosticsError> {
    Ok(adc.read_millivolts(input)? as f32 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAdc;
    impl DiagnosticAdc for FixedAdc {
        fn read_millivolts(&mut self, input: DiagnosticInput) -> Result<u32, DiagnosticsError> {
            Ok(match input {
                DiagnosticInput::AmpOut => 1650,
                DiagnosticInput::VirtualGround => 1500,
                DiagnosticInput::Reference => 3300,
            })
        }
    }

    #[test]
    fn converts_millivolts_to_volts() {
        let mut adc = FixedAdc;
        assert_eq!(read_volts(&mut adc, DiagnosticInput::AmpOut).unwrap(), 1.65);
        assert_eq!(
            read_volts(&mut adc, DiagnosticInput::Reference).unwrap(),
            3.3
        );
    }

    #[test]
    fn names_round_trip() {
        for input in [
            DiagnosticInput::AmpOut,
            DiagnosticInput::VirtualGround,
            DiagnosticInput::Reference,
        ] {
            assert_eq!(DiagnosticInput::from_name(input.name()), Some(input));
        }
        assert_eq!(DiagnosticInput::from_name("bogus"), None);
    }
}
