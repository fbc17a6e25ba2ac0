//! Shape and physical-invariant checks run before any numerical stage.

use crate::error::{AnalysisError, AnalysisResult};
use crate::signal::MeasurementTriple;

pub fn ensure_non_empty(what: &'static str, data: &[f64]) -> AnalysisResult<()> {
    if data.is_empty() {
        return Err(AnalysisError::EmptyInput { what });
    }
    Ok(())
}

/// `other` must be as long as `reference`; `what` names `other` in the error.
pub fn ensure_same_len(
    what: &'static str,
    reference: &[f64],
    other: &[f64],
) -> AnalysisResult<()> {
    if reference.len() != other.len() {
        return Err(AnalysisError::LengthMismatch {
            what,
            expected: reference.len(),
            actual: other.len(),
        });
    }
    Ok(())
}

pub fn ensure_strictly_positive(data: &[f64]) -> AnalysisResult<()> {
    match data.iter().position(|&x| !(x > 0.0)) {
        Some(index) => Err(AnalysisError::NonPositiveCurrent {
            index,
            value: data[index],
        }),
        None => Ok(()),
    }
}

pub fn ensure_non_decreasing(data: &[f64]) -> AnalysisResult<()> {
    match data.windows(2).position(|w| !(w[1] >= w[0])) {
        Some(index) => Err(AnalysisError::NonMonotonicSoc { index: index + 1 }),
        None => Ok(()),
    }
}

/// Gate for the DV analyzer: equal lengths, at least two samples, current > 0
/// and non-decreasing SOC.
pub fn validate_triple(triple: &MeasurementTriple) -> AnalysisResult<()> {
    ensure_non_empty("voltage", &triple.voltage)?;
    ensure_same_len("current", &triple.voltage, &triple.current)?;
    ensure_same_len("soc", &triple.voltage, &triple.soc)?;
    if triple.len() < 2 {
        return Err(AnalysisError::TooShort {
            what: "measurement",
            min: 2,
            len: triple.len(),
        });
    }
    ensure_strictly_positive(&triple.current)?;
    ensure_non_decreasing(&triple.soc)?;
    Ok(())
}

/// Gate for the SOH calculator: a non-empty quantity and a time axis of the
/// same length.
pub fn validate_series_pair(values: &[f64], time: &[f64]) -> AnalysisResult<()> {
    ensure_non_empty("quantity", values)?;
    ensure_same_len("time", values, time)?;
    Ok(())
}
