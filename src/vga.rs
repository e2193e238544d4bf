//! # Variable Gain Amplifier Control
//!
//! The analog front end feeding the delta-sigma converter runs through a
//! variable gain amplifier whose gain is selected by three digital lines
//! (G0..G2). Valid gains are zero and the powers of two up to 64; each
//! maps to a 3-bit code driven out on the select lines, G0 carrying the
//! least significant bit.
//!
//! The gain-to-code mapping is pure logic here; the actual line driver is
//! behind the [`GainPins`] seam, matching how the bus and trigger
//! backends are split out of the acquisition path.

use thiserror::Error;
use tracing::info;

/// Number of gain-select lines.
pub const GAIN_LINES: usize = 3;

/// Highest selectable gain.
pub const MAX_GAIN: u32 = 64;

/// Errors from gain selection.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VgaError {
    /// The requested gain is not zero or a power of two up to 64
    #[error("gain {0} is not zero or a power of two less than or equal to 64")]
    InvalidGain(u32),

    /// Driving a gain-select line failed
    #[error("failed to drive gain-select line G{line}: {details}")]
    PinWrite { line: usize, details: String },
}

/// Backend seam for the three gain-select lines.
pub trait GainPins {
    /// Drive line `G<line>` high or low.
    fn set_line(&mut self, line: usize, high: bool) -> Result<(), VgaError>;
}

/// Map a gain setting to its 3-bit select code.
///
/// Accepts zero and powers of two up to [`MAX_GAIN`]; anything else is
/// rejected rather than asserted away, since the value typically arrives
/// from an operator console.
pub fn gain_code(gain: u32) -> Result<u8, VgaError> {
    match gain {
        0 => Ok(0b000),
        1 => Ok(0b001),
        2 => Ok(0b010),
        4 => Ok(0b011),
        8 => Ok(0b100),
        16 => Ok(0b101),
        32 => Ok(0b110),
        64 => Ok(0b111),
        _ => Err(VgaError::InvalidGain(gain)),
    }
}

/// Select an amplifier gain by driving the select lines.
pub fn set_gain<P: GainPins>(pins: &mut P, gain: u32) -> Result<(), VgaError> {
    let code = gain_code(gain)?;
    info!(gain, code, "setting VGA gain");
    for line in 0..GAIN_LINES {
        pins.set_line(line, (code >> line) & 1 == 1)?;
    }
    Ok(())
}
