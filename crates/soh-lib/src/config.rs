use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Inclusive acceptance band applied before integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageWindow {
    pub lower: f64,
    pub upper: f64,
}

impl VoltageWindow {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn unbounded() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

impl Default for VoltageWindow {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Parameters shared by the DV analyzer and the SOH calculator.
///
/// Built once per analysis run and only ever borrowed by the analyzers. The
/// `with_*` helpers consume the value and hand back an updated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Moving-average length applied to the raw dV/dSOC curve (samples).
    pub dv_window_size: usize,
    /// Peaks of the curve above this value flag positive-electrode lamination.
    pub lam_pe_threshold: f64,
    /// Troughs of the curve below this value flag negative-electrode lamination.
    pub lam_ne_threshold: f64,
    /// Peaks of the curve above this value flag lithium-inventory loss.
    pub lli_threshold: f64,
    /// Minimum index separation between two peaks of the same mode.
    pub min_peak_distance: usize,
    pub cutoff_charge: f64,
    pub cutoff_discharge: f64,
    /// Relative weight of the capacity-based estimate for callers that blend.
    pub capacity_weight: f64,
    /// Relative weight of the energy-based estimate for callers that blend.
    pub energy_weight: f64,
    /// Kept last so it renders as a trailing TOML table.
    pub voltage_window: VoltageWindow,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dv_window_size: 5,
            lam_pe_threshold: 0.05,
            lam_ne_threshold: -0.05,
            lli_threshold: -0.1,
            min_peak_distance: 5,
            cutoff_charge: f64::NEG_INFINITY,
            cutoff_discharge: f64::NEG_INFINITY,
            capacity_weight: 0.6,
            energy_weight: 0.4,
            voltage_window: VoltageWindow::unbounded(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: AnalysisConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dv_window_size == 0 {
            return Err(ConfigError::Invalid(
                "dv_window_size must be at least 1".into(),
            ));
        }
        let window = self.voltage_window;
        if window.lower.is_nan() || window.upper.is_nan() || window.lower > window.upper {
            return Err(ConfigError::Invalid(format!(
                "voltage_window [{}, {}] is not a valid range",
                window.lower, window.upper
            )));
        }
        let thresholds = [
            ("lam_pe_threshold", self.lam_pe_threshold),
            ("lam_ne_threshold", self.lam_ne_threshold),
            ("lli_threshold", self.lli_threshold),
            ("cutoff_charge", self.cutoff_charge),
            ("cutoff_discharge", self.cutoff_discharge),
        ];
        for (name, value) in thresholds {
            if value.is_nan() {
                return Err(ConfigError::Invalid(format!("{} must not be NaN", name)));
            }
        }
        for (name, value) in [
            ("capacity_weight", self.capacity_weight),
            ("energy_weight", self.energy_weight),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn with_window_size(self, dv_window_size: usize) -> Self {
        Self {
            dv_window_size,
            ..self
        }
    }

    pub fn with_thresholds(self, lam_pe: f64, lam_ne: f64, lli: f64) -> Self {
        Self {
            lam_pe_threshold: lam_pe,
            lam_ne_threshold: lam_ne,
            lli_threshold: lli,
            ..self
        }
    }

    pub fn with_min_peak_distance(self, min_peak_distance: usize) -> Self {
        Self {
            min_peak_distance,
            ..self
        }
    }

    pub fn with_voltage_window(self, lower: f64, upper: f64) -> Self {
        Self {
            voltage_window: VoltageWindow::new(lower, upper),
            ..self
        }
    }

    pub fn with_cutoffs(self, cutoff_charge: f64, cutoff_discharge: f64) -> Self {
        Self {
            cutoff_charge,
            cutoff_discharge,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = AnalysisConfig::from_toml_str("dv_window_size = 3\nlli_threshold = -0.2\n")
            .expect("parse config");
        assert_eq!(cfg.dv_window_size, 3);
        assert_eq!(cfg.lli_threshold, -0.2);
        assert_eq!(cfg.lam_pe_threshold, 0.05);
        assert_eq!(cfg.voltage_window, VoltageWindow::unbounded());
    }

    #[test]
    fn voltage_window_and_cutoffs_parse() {
        let text = r#"
cutoff_charge = 0.0
cutoff_discharge = -inf

[voltage_window]
lower = 2.5
upper = 4.2
"#;
        let cfg = AnalysisConfig::from_toml_str(text).expect("parse config");
        assert_eq!(cfg.voltage_window, VoltageWindow::new(2.5, 4.2));
        assert_eq!(cfg.cutoff_charge, 0.0);
        assert!(cfg.cutoff_discharge.is_infinite());
    }

    #[test]
    fn rejects_zero_window_and_inverted_band() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("dv_window_size = 0"),
            Err(ConfigError::Invalid(_))
        ));
        let inverted = AnalysisConfig::default().with_voltage_window(4.0, 3.0);
        assert!(inverted.validate().is_err());
        let negative_weight = AnalysisConfig {
            energy_weight: -0.1,
            ..AnalysisConfig::default()
        };
        assert!(negative_weight.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("dv_window_size = \"five\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn with_helpers_leave_original_untouched() {
        let base = AnalysisConfig::default();
        let updated = base.clone().with_window_size(9).with_cutoffs(1.0, 2.0);
        assert_eq!(base.dv_window_size, 5);
        assert_eq!(updated.dv_window_size, 9);
        assert_eq!(updated.cutoff_discharge, 2.0);
    }

    #[test]
    fn default_config_survives_toml_round_trip() {
        let text = AnalysisConfig::default()
            .to_toml_string()
            .expect("render config");
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(text.as_bytes()).expect("write config");
        let loaded = AnalysisConfig::load(file.path()).expect("load config");
        assert_eq!(loaded, AnalysisConfig::default());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AnalysisConfig::load(Path::new("/nonexistent/soh.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/soh.toml"));
    }
}
