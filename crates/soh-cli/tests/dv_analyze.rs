use assert_cmd::cargo::cargo_bin_cmd;
use soh_lib::detectors::dv::DvCurveResult;
use std::{error::Error, path::PathBuf};

fn sample_path(relative: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(relative)
        .to_string_lossy()
        .to_string()
}

#[test]
fn linear_run_has_flat_curve_and_no_modes() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("soh");
    cmd.args([
        "dv-analyze",
        "--input",
        &sample_path("test_data/linear_dv.csv"),
        "--window",
        "1",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let result: DvCurveResult = serde_json::from_slice(&out)?;
    assert_eq!(result.curve.len(), 5);
    for v in &result.curve {
        assert!((v - 0.5).abs() < 1e-9, "expected 0.5, got {}", v);
    }
    // 0.5 sits above every default threshold, but a flat curve has no local maxima
    assert_eq!(result.total_detections(), 0);
    Ok(())
}

#[test]
fn bump_is_reported_as_positive_lamination() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("soh");
    cmd.args(["dv-analyze", "--input", &sample_path("test_data/dv_bump.csv")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let result: DvCurveResult = serde_json::from_slice(&out)?;
    assert_eq!(result.curve.len(), 40 - 4);
    assert_eq!(result.offset, 2);
    assert!(result.lam_pe().contains(&15), "lam_pe = {:?}", result.lam_pe());
    assert!(result.lam_ne().is_empty());
    Ok(())
}

#[test]
fn zero_current_aborts_with_semantic_error() {
    let mut cmd = cargo_bin_cmd!("soh");
    cmd.args([
        "dv-analyze",
        "--input",
        &sample_path("test_data/bad_current.csv"),
        "--window",
        "1",
    ]);
    let out = cmd.assert().failure().get_output().stderr.clone();
    let stderr = String::from_utf8_lossy(&out);
    assert!(stderr.contains("InputSemantic"), "stderr: {}", stderr);
}

#[test]
fn zero_window_is_rejected_before_reading() {
    let mut cmd = cargo_bin_cmd!("soh");
    cmd.args([
        "dv-analyze",
        "--input",
        &sample_path("test_data/linear_dv.csv"),
        "--window",
        "0",
    ]);
    cmd.assert().failure();
}
