//! # APLL Clock Synthesizer Coefficient Search
//!
//! The external ADC is clocked by a fractional frequency synthesizer (APLL)
//! driven from a fixed 40 MHz crystal. Its output frequency is determined by
//! four integer coefficients:
//!
//! ```text
//! dividend = fxtal * (sdm2 + sdm1 / 2^8 + sdm0 / 2^16 + 4)
//! f_out    = dividend / (2 * (odiv + 2))
//! ```
//!
//! The intermediate dividend is the VCO frequency and must stay inside
//! [350 MHz, 500 MHz]. That band is a hardware stability constraint, not a
//! tunable.
//!
//! [`solve`] performs an exhaustive search of the full coefficient space
//! (256 x 256 x 64 x 32 tuples) and returns the tuple whose output is
//! closest to the requested frequency. The search runs once at startup; it
//! is a deterministic, CPU-bound computation with a fixed worst case, so
//! there is no reason to trade its exactness for an iterative method.

use thiserror::Error;
use tracing::debug;

/// Reference crystal frequency feeding the synthesizer, in Hz.
pub const FXTAL_HZ: f64 = 40e6;

/// VCO stability band: the dividend must land inside this range.
pub const DIVIDEND_MIN_HZ: f64 = 350e6;
pub const DIVIDEND_MAX_HZ: f64 = 500e6;

const SDM0_MAX: u32 = 255;
const SDM1_MAX: u32 = 255;
const SDM2_MAX: u32 = 63;
const ODIV_MAX: u32 = 31;

/// Errors from the coefficient search.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClockError {
    /// No coefficient tuple puts the dividend inside the VCO band. With the
    /// stock 40 MHz crystal this cannot happen, but a caller-supplied
    /// reference frequency can empty the search space.
    #[error("no APLL coefficients satisfy the VCO band for the requested frequency")]
    NoSolutionFound,
}

/// Integer coefficients of the fractional synthesizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApllCoefficients {
    /// Fractional divider byte 0 (weight 2^-16), 0..=255
    pub sdm0: u8,
    /// Fractional divider byte 1 (weight 2^-8), 0..=255
    pub sdm1: u8,
    /// Integer divider part, 0..=63
    pub sdm2: u8,
    /// Output divider: divisor is `2 * (odiv + 2)`, 0..=31
    pub odiv: u8,
}

/// Result of the coefficient search: the closest achievable frequency and
/// the coefficients producing it. Computed once at initialization and
/// immutable thereafter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencySolution {
    /// Frequency the caller asked for, in Hz
    pub target_hz: f64,
    /// Closest frequency the synthesizer can actually produce, in Hz
    pub achieved_hz: f64,
    /// Coefficients producing `achieved_hz`
    pub coefficients: ApllCoefficients,
}

impl FrequencySolution {
    /// Absolute frequency error of the solution, in Hz.
    pub fn error_hz(&self) -> f64 {
        (self.achieved_hz - self.target_hz).abs()
    }
}

/// VCO frequency for a fractional-divider tuple.
pub fn dividend(fxtal_hz: f64, sdm0: u32, sdm1: u32, sdm2: u32) -> f64 {
    fxtal_hz * (sdm2 as f64 + sdm1 as f64 / 256.0 + sdm0 as f64 / 65536.0 + 4.0)
}

/// Output divisor for an `odiv` setting.
pub fn divisor(odiv: u32) -> f64 {
    (2 * (odiv + 2)) as f64
}

/// Search the coefficient space for the closest achievable frequency,
/// using the stock 40 MHz reference crystal.
pub fn solve(target_hz: f64) -> Result<FrequencySolution, ClockError> {
    solve_with_reference(target_hz, FXTAL_HZ)
}

/// Search the coefficient space for the closest achievable frequency.
///
/// Enumerates tuples in (sdm0, sdm1, sdm2, odiv) order and keeps the first
/// tuple that strictly improves on the best error seen so far, so ties go
/// to the earliest tuple in enumeration order. Returns
/// [`ClockError::NoSolutionFound`] if no tuple puts the dividend inside
/// the VCO band.
pub fn solve_with_reference(
    target_hz: f64,
    fxtal_hz: f64,
) -> Result<FrequencySolution, ClockError> {
    let mut best: Option<(f64, ApllCoefficients)> = None;

    for sdm0 in 0..=SDM0_MAX {
        for sdm1 in 0..=SDM1_MAX {
            for sdm2 in 0..=SDM2_MAX {
                // The dividend does not depend on odiv; hoisting it out of
                // the inner loop keeps the enumeration order intact.
                let candidate_dividend = dividend(fxtal_hz, sdm0, sdm1, sdm2);
                if !(DIVIDEND_MIN_HZ..=DIVIDEND_MAX_HZ).contains(&candidate_dividend) {
                    continue;
                }
                for odiv in 0..=ODIV_MAX {
                    let candidate_hz = candidate_dividend / divisor(odiv);
                    let error = (candidate_hz - target_hz).abs();
                    let improved = match best {
                        None => true,
                        Some((best_hz, _)) => error < (best_hz - target_hz).abs(),
                    };
                    if improved {
                        best = Some((
                            candidate_hz,
                            ApllCoefficients {
                                sdm0: sdm0 as u8,
                                sdm1: sdm1 as u8,
                                sdm2: sdm2 as u8,
                                odiv: odiv as u8,
                            },
                        ));
                    }
                }
            }
        }
    }

    let (achieved_hz, coefficients) = best.ok_or(ClockError::NoSolutionFound)?;
    debug!(
        target_hz,
        achieved_hz,
        sdm0 = coefficients.sdm0,
        sdm1 = coefficients.sdm1,
        sdm2 = coefficients.sdm2,
        odiv = coefficients.odiv,
        "APLL coefficient search complete"
    );
    Ok(FrequencySolution {
        target_hz,
        achieved_hz,
        coefficients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Recompute a solution's output frequency from its coefficients.
    fn recompute(fxtal_hz: f64, c: ApllCoefficients) -> f64 {
        dividend(fxtal_hz, c.sdm0 as u32, c.sdm1 as u32, c.sdm2 as u32) / divisor(c.odiv as u32)
    }

    #[test]
    fn solution_dividend_stays_in_vco_band() {
        let solution = solve(16.384e6).unwrap();
        let c = solution.coefficients;
        let d = dividend(FXTAL_HZ, c.sdm0 as u32, c.sdm1 as u32, c.sdm2 as u32);
        assert!(
            (DIVIDEND_MIN_HZ..=DIVIDEND_MAX_HZ).contains(&d),
            "dividend {} outside VCO band",
            d
        );
    }

    #[test]
    fn achieved_frequency_matches_coefficients() {
        let solution = solve(16.384e6).unwrap();
        let recomputed = recompute(FXTAL_HZ, solution.coefficients);
        assert_eq!(solution.achieved_hz, recomputed);
    }

    #[test]
    fn adc_clock_target_within_tolerance() {
        // The design target: 16.384 MHz ADC master clock from a 40 MHz
        // crystal must be achievable to better than 0.1%.
        let solution = solve(16.384e6).unwrap();
        let relative_error = solution.error_hz() / solution.target_hz;
        assert!(
            relative_error < 1e-3,
            "relative error {} exceeds 0.1%",
            relative_error
        );
    }

    #[test]
    fn never_beaten_by_explicit_candidates() {
        // The solver must never return a worse error than any in-band
        // candidate we can construct by hand.
        let target = 16.384e6;
        let solution = solve(target).unwrap();

        for &(sdm0, sdm1, sdm2) in &[(0, 0, 5), (148, 212, 5), (255, 255, 8), (17, 93, 6)] {
            let d = dividend(FXTAL_HZ, sdm0, sdm1, sdm2);
            if !(DIVIDEND_MIN_HZ..=DIVIDEND_MAX_HZ).contains(&d) {
                continue;
            }
            for odiv in 0..=ODIV_MAX {
                let candidate_error = (d / divisor(odiv) - target).abs();
                assert!(
                    solution.error_hz() <= candidate_error,
                    "solver error {} beaten by candidate ({},{},{},{}) with {}",
                    solution.error_hz(),
                    sdm0,
                    sdm1,
                    sdm2,
                    odiv,
                    candidate_error
                );
            }
        }
    }

    #[test]
    fn unreachable_band_reports_no_solution() {
        // A tiny reference frequency cannot lift the dividend into the VCO
        // band for any tuple.
        let result = solve_with_reference(1e6, 1.0);
        assert_eq!(result, Err(ClockError::NoSolutionFound));
    }
}
