use crate::error::{AnalysisError, AnalysisResult};
use log::warn;
use serde::{Deserialize, Serialize};

/// Acceptance limits for a measurement campaign sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Inclusive cell temperature band in °C.
    pub temperature_range: [f64; 2],
    /// Samples further than this many standard deviations from the mean are anomalies.
    pub anomaly_sigma: f64,
    /// Samples further than this many standard deviations flag a defective cell.
    pub defective_sigma: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            temperature_range: [0.0, 45.0],
            anomaly_sigma: 3.0,
            defective_sigma: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub temperature: f64,
    pub temperature_valid: bool,
    pub mean: f64,
    pub std_dev: f64,
    pub anomalies: Vec<usize>,
    pub defective_cells: Vec<usize>,
}

impl QualityReport {
    pub fn is_acceptable(&self) -> bool {
        self.temperature_valid && self.defective_cells.is_empty()
    }
}

pub fn check_temperature(temperature: f64, range: [f64; 2]) -> AnalysisResult<()> {
    let [lower, upper] = range;
    if temperature >= lower && temperature <= upper {
        Ok(())
    } else {
        Err(AnalysisError::OutOfRange {
            what: "temperature",
            value: temperature,
            lower,
            upper,
        })
    }
}

fn mean_and_std(data: &[f64]) -> (f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0);
    }
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Indices whose distance from the mean exceeds `sigma` standard deviations.
pub fn detect_anomalies(data: &[f64], sigma: f64) -> Vec<usize> {
    if data.len() < 2 {
        return Vec::new();
    }
    let (mean, sd) = mean_and_std(data);
    if sd == 0.0 || !sd.is_finite() {
        return Vec::new();
    }
    let limit = sigma * sd;
    data.iter()
        .enumerate()
        .filter(|(_, x)| (*x - mean).abs() > limit)
        .map(|(i, _)| i)
        .collect()
}

pub fn assess_quality(temperature: f64, data: &[f64], cfg: &QualityConfig) -> QualityReport {
    let temperature_valid = match check_temperature(temperature, cfg.temperature_range) {
        Ok(()) => true,
        Err(err) => {
            warn!("{}", err);
            false
        }
    };
    let (mean, std_dev) = mean_and_std(data);
    let anomalies = detect_anomalies(data, cfg.anomaly_sigma);
    let defective_cells = detect_anomalies(data, cfg.defective_sigma);
    if !defective_cells.is_empty() {
        warn!("{} samples flagged as defective cells", defective_cells.len());
    }
    QualityReport {
        temperature,
        temperature_valid,
        mean,
        std_dev,
        anomalies,
        defective_cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn temperature_band_is_inclusive() {
        assert!(check_temperature(0.0, [0.0, 45.0]).is_ok());
        assert!(check_temperature(45.0, [0.0, 45.0]).is_ok());
        let err = check_temperature(-5.0, [0.0, 45.0]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InputSemantic);
        assert!(check_temperature(f64::NAN, [0.0, 45.0]).is_err());
    }

    #[test]
    fn outlier_is_flagged() {
        let mut data = vec![3.7; 30];
        data[12] = 4.5;
        data[3] = 3.69;
        let anomalies = detect_anomalies(&data, 3.0);
        assert_eq!(anomalies, vec![12]);
    }

    #[test]
    fn flat_or_tiny_series_has_no_anomalies() {
        assert!(detect_anomalies(&[1.0, 1.0, 1.0], 0.1).is_empty());
        assert!(detect_anomalies(&[1.0], 0.1).is_empty());
    }

    #[test]
    fn report_combines_checks() {
        let mut data = vec![3.7; 40];
        data[20] = 5.0;
        let report = assess_quality(25.0, &data, &QualityConfig::default());
        assert!(report.temperature_valid);
        assert_eq!(report.anomalies, vec![20]);
        assert_eq!(report.defective_cells, vec![20]);
        assert!(!report.is_acceptable());

        let clean = assess_quality(25.0, &[3.7, 3.71, 3.69, 3.7], &QualityConfig::default());
        assert!(clean.is_acceptable());
        let hot = assess_quality(60.0, &[3.7, 3.71], &QualityConfig::default());
        assert!(!hot.is_acceptable());
    }
}
