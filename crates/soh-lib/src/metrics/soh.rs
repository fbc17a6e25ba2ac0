use crate::{
    config::AnalysisConfig,
    error::{AnalysisError, AnalysisResult},
    preprocess::{apply_voltage_window, count_gaps},
    validate,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Which quantity was integrated. Both variants share one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SohMethod {
    Capacity,
    Energy,
}

impl SohMethod {
    pub fn name(&self) -> &'static str {
        match self {
            SohMethod::Capacity => "capacity",
            SohMethod::Energy => "energy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SohResult {
    pub method: SohMethod,
    /// Net charge over net discharge; not clamped to [0, 1].
    pub soh: f64,
    pub charge: Vec<f64>,
    pub discharge: Vec<f64>,
    /// Samples dropped by the voltage window.
    pub gaps: usize,
}

pub fn capacity_soh(
    capacity: &[f64],
    time: &[f64],
    cfg: &AnalysisConfig,
) -> AnalysisResult<SohResult> {
    estimate_soh(SohMethod::Capacity, capacity, time, cfg)
}

pub fn energy_soh(energy: &[f64], time: &[f64], cfg: &AnalysisConfig) -> AnalysisResult<SohResult> {
    estimate_soh(SohMethod::Energy, energy, time, cfg)
}

/// Validate, window, integrate, gate on cutoffs and reduce. Every failure
/// comes back as an `Err`; callers read it as "no SOH for this window".
pub fn estimate_soh(
    method: SohMethod,
    values: &[f64],
    time: &[f64],
    cfg: &AnalysisConfig,
) -> AnalysisResult<SohResult> {
    run_pipeline(method, values, time, cfg).map_err(|err| {
        warn!("{} SOH undefined for this window: {}", method.name(), err);
        err
    })
}

fn run_pipeline(
    method: SohMethod,
    values: &[f64],
    time: &[f64],
    cfg: &AnalysisConfig,
) -> AnalysisResult<SohResult> {
    validate::validate_series_pair(values, time)?;
    let windowed = apply_voltage_window(values, time, cfg.voltage_window)?;
    let gaps = count_gaps(&windowed);
    if gaps > 0 {
        debug!(
            "{} SOH: {} of {} samples outside the voltage window",
            method.name(),
            gaps,
            windowed.len()
        );
    }
    let (charge, discharge) = integrate_charge_discharge(&windowed, time)?;
    validate_cutoffs(&charge, &discharge, cfg)?;
    let soh = reduce_soh(&charge, &discharge)?;
    Ok(SohResult {
        method,
        soh,
        charge,
        discharge,
        gaps,
    })
}

/// Running trapezoidal integral starting at zero. A segment touching a NaN
/// gap contributes nothing; the accumulator carries across the gap.
pub fn cumulative_trapezoid(data: &[f64], time: &[f64]) -> AnalysisResult<Vec<f64>> {
    validate::ensure_same_len("time", data, time)?;
    let n = data.len();
    let mut out = Vec::with_capacity(n);
    if n == 0 {
        return Ok(out);
    }
    let mut acc = 0.0;
    out.push(acc);
    for i in 1..n {
        let segment = 0.5 * (data[i] + data[i - 1]) * (time[i] - time[i - 1]);
        if !segment.is_nan() {
            acc += segment;
        }
        out.push(acc);
    }
    Ok(out)
}

/// Charge integrates the signal, discharge integrates its negation.
pub fn integrate_charge_discharge(
    data: &[f64],
    time: &[f64],
) -> AnalysisResult<(Vec<f64>, Vec<f64>)> {
    let negated: Vec<f64> = data.iter().map(|x| -x).collect();
    Ok((
        cumulative_trapezoid(data, time)?,
        cumulative_trapezoid(&negated, time)?,
    ))
}

/// Reject the window if any accumulated sample falls below its cutoff.
pub fn validate_cutoffs(
    charge: &[f64],
    discharge: &[f64],
    cfg: &AnalysisConfig,
) -> AnalysisResult<()> {
    check_cutoff("charge", charge, cfg.cutoff_charge)?;
    check_cutoff("discharge", discharge, cfg.cutoff_discharge)
}

fn check_cutoff(accumulator: &'static str, data: &[f64], cutoff: f64) -> AnalysisResult<()> {
    match data.iter().position(|&x| x < cutoff) {
        Some(index) => Err(AnalysisError::CutoffViolation {
            accumulator,
            index,
            value: data[index],
            cutoff,
        }),
        None => Ok(()),
    }
}

/// (charge[last] - charge[0]) / (discharge[last] - discharge[0])
pub fn reduce_soh(charge: &[f64], discharge: &[f64]) -> AnalysisResult<f64> {
    let (Some(c0), Some(c1)) = (charge.first(), charge.last()) else {
        return Err(AnalysisError::EmptyInput { what: "charge" });
    };
    let (Some(d0), Some(d1)) = (discharge.first(), discharge.last()) else {
        return Err(AnalysisError::EmptyInput { what: "discharge" });
    };
    let net_discharge = d1 - d0;
    if net_discharge == 0.0 {
        return Err(AnalysisError::Degenerate(
            "net discharge over the window is zero".into(),
        ));
    }
    let soh = (c1 - c0) / net_discharge;
    if !soh.is_finite() {
        return Err(AnalysisError::Degenerate(format!(
            "SOH ratio {} / {} is not finite",
            c1 - c0,
            net_discharge
        )));
    }
    Ok(soh)
}
