use crate::error::{AnalysisError, AnalysisResult};
use crate::validate;
use serde::{Deserialize, Serialize};

/// Ordered (time, value) samples with a strictly increasing time axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    pub time: Vec<f64>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> AnalysisResult<Self> {
        validate::ensure_same_len("values", &time, &values)?;
        if let Some(index) = time.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(AnalysisError::NonIncreasingTime { index: index + 1 });
        }
        Ok(Self { time, values })
    }

    /// Uniformly spaced series starting at t = 0.
    pub fn from_uniform(fs: f64, values: Vec<f64>) -> Self {
        let dt = 1.0 / fs;
        let time = (0..values.len()).map(|i| i as f64 * dt).collect();
        Self { time, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// Voltage, current and SOC sampled at matching indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementTriple {
    pub voltage: Vec<f64>,
    pub current: Vec<f64>,
    pub soc: Vec<f64>,
}

impl MeasurementTriple {
    pub fn new(voltage: Vec<f64>, current: Vec<f64>, soc: Vec<f64>) -> Self {
        Self {
            voltage,
            current,
            soc,
        }
    }

    pub fn len(&self) -> usize {
        self.voltage.len()
    }
    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationMode {
    /// Loss of active material on the positive electrode.
    LamPe,
    /// Loss of active material on the negative electrode.
    LamNe,
    /// Loss of cyclable lithium.
    Lli,
}

impl DegradationMode {
    pub const ALL: [DegradationMode; 3] = [
        DegradationMode::LamPe,
        DegradationMode::LamNe,
        DegradationMode::Lli,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DegradationMode::LamPe => "lam_pe",
            DegradationMode::LamNe => "lam_ne",
            DegradationMode::Lli => "lli",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_series_rejects_repeated_timestamps() {
        let err = TimeSeries::new(vec![0.0, 1.0, 1.0], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, AnalysisError::NonIncreasingTime { index: 2 });
    }

    #[test]
    fn time_series_rejects_length_mismatch() {
        assert!(TimeSeries::new(vec![0.0, 1.0], vec![1.0]).is_err());
    }

    #[test]
    fn uniform_series_duration() {
        let ts = TimeSeries::from_uniform(10.0, vec![0.0; 11]);
        assert_eq!(ts.len(), 11);
        assert!((ts.duration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mode_names_match_serde_keys() {
        for mode in DegradationMode::ALL {
            let json = serde_json::to_string(&mode).expect("serialize mode");
            assert_eq!(json, format!("\"{}\"", mode.name()));
        }
    }
}
