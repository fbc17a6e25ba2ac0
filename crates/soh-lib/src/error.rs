use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse failure classes reported to callers alongside the detailed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Mismatched or empty array lengths, unusable window sizes.
    InputShape,
    /// Physically impossible input (non-positive current, falling SOC, ...).
    InputSemantic,
    /// Division by zero or a flat feature vector.
    DegenerateComputation,
    /// Integrated charge/discharge dipped below its configured cutoff.
    CutoffViolation,
}

impl ErrorCategory {
    /// Soft failures: the measurement window yields no defined value, but the
    /// input itself was well-formed.
    pub fn is_undefined_result(&self) -> bool {
        matches!(
            self,
            ErrorCategory::DegenerateComputation | ErrorCategory::CutoffViolation
        )
    }

    /// Hard failures raised by the validation gate.
    pub fn is_invalid_input(&self) -> bool {
        !self.is_undefined_result()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("{what} is empty")]
    EmptyInput { what: &'static str },
    #[error("{what} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{what} needs at least {min} samples, got {len}")]
    TooShort {
        what: &'static str,
        min: usize,
        len: usize,
    },
    #[error("window size {window} is invalid for {len} samples")]
    InvalidWindow { window: usize, len: usize },
    #[error("current must be strictly positive (sample {index} is {value})")]
    NonPositiveCurrent { index: usize, value: f64 },
    #[error("SOC must be non-decreasing (sample {index} drops below its predecessor)")]
    NonMonotonicSoc { index: usize },
    #[error("time axis must be strictly increasing (sample {index})")]
    NonIncreasingTime { index: usize },
    #[error("{what} {value} is outside [{lower}, {upper}]")]
    OutOfRange {
        what: &'static str,
        value: f64,
        lower: f64,
        upper: f64,
    },
    #[error("degenerate computation: {0}")]
    Degenerate(String),
    #[error("{accumulator} accumulator falls below cutoff {cutoff} (sample {index} is {value})")]
    CutoffViolation {
        accumulator: &'static str,
        index: usize,
        value: f64,
        cutoff: f64,
    },
}

impl AnalysisError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::EmptyInput { .. }
            | AnalysisError::LengthMismatch { .. }
            | AnalysisError::TooShort { .. }
            | AnalysisError::InvalidWindow { .. } => ErrorCategory::InputShape,
            AnalysisError::NonPositiveCurrent { .. }
            | AnalysisError::NonMonotonicSoc { .. }
            | AnalysisError::NonIncreasingTime { .. }
            | AnalysisError::OutOfRange { .. } => ErrorCategory::InputSemantic,
            AnalysisError::Degenerate(_) => ErrorCategory::DegenerateComputation,
            AnalysisError::CutoffViolation { .. } => ErrorCategory::CutoffViolation,
        }
    }

    pub fn is_undefined_result(&self) -> bool {
        self.category().is_undefined_result()
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
