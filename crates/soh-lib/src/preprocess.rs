use crate::config::VoltageWindow;
use crate::error::{AnalysisError, AnalysisResult};
use crate::validate;

/// Centered moving average with "valid" edges: the output is
/// `window_size - 1` samples shorter than the input.
pub fn smooth(data: &[f64], window_size: usize) -> AnalysisResult<Vec<f64>> {
    if window_size == 0 || window_size > data.len() {
        return Err(AnalysisError::InvalidWindow {
            window: window_size,
            len: data.len(),
        });
    }
    if window_size == 1 {
        return Ok(data.to_vec());
    }
    let scale = 1.0 / window_size as f64;
    Ok(data
        .windows(window_size)
        .map(|w| w.iter().sum::<f64>() * scale)
        .collect())
}

/// Replace every sample outside `[lower, upper]` with NaN, keeping length and
/// alignment with `time`.
pub fn apply_voltage_window(
    data: &[f64],
    time: &[f64],
    window: VoltageWindow,
) -> AnalysisResult<Vec<f64>> {
    validate::ensure_same_len("time", data, time)?;
    Ok(data
        .iter()
        .map(|&x| if window.contains(x) { x } else { f64::NAN })
        .collect())
}

/// Numerical gradient with unit spacing: central differences inside,
/// one-sided differences at both ends.
pub fn gradient(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mut out = Vec::with_capacity(n);
    out.push(data[1] - data[0]);
    for i in 1..n - 1 {
        out.push((data[i + 1] - data[i - 1]) * 0.5);
    }
    out.push(data[n - 1] - data[n - 2]);
    out
}

/// Number of NaN gap markers in a windowed series.
pub fn count_gaps(data: &[f64]) -> usize {
    data.iter().filter(|x| x.is_nan()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_shortens_by_window_minus_one() {
        let data: Vec<f64> = (0..20).map(|i| (i as f64 * 0.3).sin()).collect();
        for w in 1..=data.len() {
            let out = smooth(&data, w).expect("valid window");
            assert_eq!(out.len(), data.len() - (w - 1));
        }
    }

    #[test]
    fn unit_window_is_identity() {
        let data = [0.3, -1.2, 5.5, 2.0];
        assert_eq!(smooth(&data, 1).unwrap(), data.to_vec());
    }

    #[test]
    fn box_filter_values() {
        let out = smooth(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(out.len(), 3);
        for (got, want) in out.iter().zip([2.0, 3.0, 4.0]) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_zero_and_oversized_windows() {
        assert_eq!(
            smooth(&[1.0, 2.0], 0).unwrap_err(),
            AnalysisError::InvalidWindow { window: 0, len: 2 }
        );
        assert!(smooth(&[1.0, 2.0], 3).is_err());
        assert!(smooth(&[], 1).is_err());
    }

    #[test]
    fn voltage_window_marks_gaps_inclusively() {
        let data = [2.9, 3.0, 3.5, 4.2, 4.3];
        let time = [0.0, 1.0, 2.0, 3.0, 4.0];
        let out = apply_voltage_window(&data, &time, VoltageWindow::new(3.0, 4.2)).unwrap();
        assert_eq!(out.len(), data.len());
        assert!(out[0].is_nan());
        assert_eq!(&out[1..4], &[3.0, 3.5, 4.2]);
        assert!(out[4].is_nan());
        assert_eq!(count_gaps(&out), 2);
    }

    #[test]
    fn voltage_window_requires_aligned_time() {
        assert!(apply_voltage_window(&[1.0, 2.0], &[0.0], VoltageWindow::unbounded()).is_err());
    }

    #[test]
    fn gradient_matches_central_and_edge_differences() {
        let g = gradient(&[1.0, 2.0, 4.0, 7.0]);
        assert_eq!(g, vec![1.0, 1.5, 2.5, 3.0]);
        assert_eq!(gradient(&[2.0, 5.0]), vec![3.0, 3.0]);
        assert_eq!(gradient(&[1.0]), vec![0.0]);
    }
}
