use crate::{
    config::AnalysisConfig,
    error::{AnalysisError, AnalysisResult},
    preprocess::{gradient, smooth},
    signal::{DegradationMode, MeasurementTriple},
    validate,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Smoothed dV/dSOC curve plus the curve indices flagged per degradation mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DvCurveResult {
    /// Smoothed differential voltage, `window_size - 1` samples shorter than
    /// the input.
    pub curve: Vec<f64>,
    /// SOC values at the centre of each smoothing window.
    pub soc: Vec<f64>,
    /// Raw sample index that curve index 0 corresponds to.
    pub offset: usize,
    pub modes: BTreeMap<DegradationMode, Vec<usize>>,
}

impl DvCurveResult {
    pub fn indices(&self, mode: DegradationMode) -> &[usize] {
        self.modes.get(&mode).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lam_pe(&self) -> &[usize] {
        self.indices(DegradationMode::LamPe)
    }

    pub fn lam_ne(&self) -> &[usize] {
        self.indices(DegradationMode::LamNe)
    }

    pub fn lli(&self) -> &[usize] {
        self.indices(DegradationMode::Lli)
    }

    /// Map a curve index back onto the input sample it is centred on.
    pub fn raw_index(&self, curve_index: usize) -> usize {
        curve_index + self.offset
    }

    pub fn total_detections(&self) -> usize {
        self.modes.values().map(Vec::len).sum()
    }
}

/// Validate, differentiate, smooth and classify one measurement run.
pub fn analyze_dv(
    triple: &MeasurementTriple,
    cfg: &AnalysisConfig,
) -> AnalysisResult<DvCurveResult> {
    validate::validate_triple(triple)?;
    let raw = differential_voltage(&triple.voltage, &triple.soc)?;
    let curve = smooth(&raw, cfg.dv_window_size)?;
    let offset = (cfg.dv_window_size - 1) / 2;
    let soc = triple.soc[offset..offset + curve.len()].to_vec();
    let modes = classify_modes(&curve, cfg);
    debug!(
        "dv curve: {} raw samples -> {} smoothed, {} detections",
        raw.len(),
        curve.len(),
        modes.values().map(Vec::len).sum::<usize>()
    );
    Ok(DvCurveResult {
        curve,
        soc,
        offset,
        modes,
    })
}

/// Unsmoothed dV/dSOC, same length as the input. Samples where the SOC
/// gradient vanishes come out as NaN.
pub fn differential_voltage(voltage: &[f64], soc: &[f64]) -> AnalysisResult<Vec<f64>> {
    validate::ensure_same_len("soc", voltage, soc)?;
    let dv = gradient(voltage);
    let dsoc = gradient(soc);
    let curve: Vec<f64> = dv
        .iter()
        .zip(&dsoc)
        .map(|(v, s)| {
            let ratio = v / s;
            if ratio.is_finite() {
                ratio
            } else {
                f64::NAN
            }
        })
        .collect();
    let undefined = curve.iter().filter(|x| x.is_nan()).count();
    if undefined > 0 {
        debug!("dv curve: {} samples with flat SOC left undefined", undefined);
    }
    Ok(curve)
}

/// Run all three mode detectors over an already smoothed curve.
pub fn classify_modes(
    curve: &[f64],
    cfg: &AnalysisConfig,
) -> BTreeMap<DegradationMode, Vec<usize>> {
    DegradationMode::ALL
        .iter()
        .map(|&mode| (mode, detect_mode(curve, mode, cfg)))
        .collect()
}

pub fn detect_mode(curve: &[f64], mode: DegradationMode, cfg: &AnalysisConfig) -> Vec<usize> {
    let min_distance = cfg.min_peak_distance;
    match mode {
        DegradationMode::LamPe => detect_peaks(curve, cfg.lam_pe_threshold, min_distance),
        DegradationMode::LamNe => {
            let negated: Vec<f64> = curve.iter().map(|x| -x).collect();
            detect_peaks(&negated, cfg.lam_ne_threshold.abs(), min_distance)
        }
        DegradationMode::Lli => detect_peaks(curve, cfg.lli_threshold, min_distance),
    }
}

/// Local maxima above `threshold`, thinned so that no two survivors are closer
/// than `min_distance` samples. The larger peak wins a conflict; equal peaks
/// resolve to the earlier index. Endpoints are never peaks.
pub fn detect_peaks(data: &[f64], threshold: f64, min_distance: usize) -> Vec<usize> {
    if data.len() < 3 {
        return Vec::new();
    }
    let mut candidates: Vec<usize> = (1..data.len() - 1)
        .filter(|&i| {
            let y = data[i];
            y.is_finite() && y > threshold && y > data[i - 1] && y >= data[i + 1]
        })
        .collect();

    // stable: ties keep ascending index order
    candidates.sort_by(|&a, &b| data[b].total_cmp(&data[a]));

    let reach = min_distance.max(1) - 1;
    let mut kept = BTreeSet::new();
    for idx in candidates {
        let lo = idx.saturating_sub(reach);
        let hi = idx.saturating_add(reach);
        if kept.range(lo..=hi).next().is_none() {
            kept.insert(idx);
        }
    }
    kept.into_iter().collect()
}

/// Min-max scale a feature vector onto [0, 1].
pub fn normalize_features(features: &[f64]) -> AnalysisResult<Vec<f64>> {
    validate::ensure_non_empty("features", features)?;
    let min = features.iter().copied().fold(f64::INFINITY, f64::min);
    let max = features.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return Err(AnalysisError::Degenerate(format!(
            "feature range [{}, {}] cannot be normalized",
            min, max
        )));
    }
    Ok(features.iter().map(|x| (x - min) / range).collect())
}
