use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, fs, path::PathBuf};
use tempfile::tempdir;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    total_beats: usize,
    abnormal_beats: usize,
    diagnosis: String,
    risk_level: String,
    confidence: f64,
    anomaly_indices: Vec<usize>,
}

#[derive(Deserialize)]
struct Beat {
    #[serde(rename = "peakIndex")]
    peak_index: usize,
    samples: Vec<f64>,
}

#[derive(Deserialize)]
struct BeatsOutput {
    fs: f64,
    peaks: Vec<usize>,
    windows: Vec<Beat>,
}

fn simulate_into(dir: &std::path::Path) -> Result<PathBuf, Box<dyn Error>> {
    let out = cargo_bin_cmd!("cardio")
        .args(["simulate", "--seed", "11"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let path = dir.join("sim.json");
    fs::write(&path, out)?;
    Ok(path)
}

#[test]
fn simulated_rhythm_is_normal() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let input = simulate_into(temp.path())?;

    let mut cmd = cargo_bin_cmd!("cardio");
    cmd.args(["analyze", "--input", input.to_str().expect("utf8 path")]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let report: Report = serde_json::from_slice(&output)?;

    assert!(report.total_beats > 0);
    assert_eq!(report.abnormal_beats, 0);
    assert_eq!(report.diagnosis, "Normal Sinus Rhythm");
    assert_eq!(report.risk_level, "Low");
    assert!(report.confidence > 50.0 && report.confidence <= 100.0);
    assert!(report.anomaly_indices.is_empty());
    Ok(())
}

#[test]
fn find_beats_emits_classifier_batch() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let input = simulate_into(temp.path())?;

    let mut cmd = cargo_bin_cmd!("cardio");
    cmd.args(["find-beats", "--input", input.to_str().expect("utf8 path")]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let beats: BeatsOutput = serde_json::from_slice(&output)?;

    assert_eq!(beats.fs, 250.0);
    assert_eq!(beats.peaks.len(), 10);
    assert!(beats.peaks.windows(2).all(|p| p[1] - p[0] >= 100));
    assert!(!beats.windows.is_empty());
    for w in &beats.windows {
        assert_eq!(w.samples.len(), 360);
        assert!(beats.peaks.contains(&w.peak_index));
    }
    Ok(())
}

#[test]
fn short_signal_gets_sentinel_report() -> Result<(), Box<dyn Error>> {
    let input = workspace_root().join("test_data/short_signal.json");
    let mut cmd = cargo_bin_cmd!("cardio");
    cmd.args(["analyze", "--input", input.to_str().expect("utf8 path")]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let report: Report = serde_json::from_slice(&output)?;

    assert_eq!(report.total_beats, 0);
    assert_eq!(report.diagnosis, "Error: Signal too short.");
    assert_eq!(report.risk_level, "Unknown");
    Ok(())
}

#[test]
fn empty_uploads_get_sentinel_report() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let json = temp.path().join("empty.json");
    fs::write(&json, br#"{"signal": []}"#)?;
    let txt = temp.path().join("empty.txt");
    fs::write(&txt, b"# nothing recorded\n")?;

    for input in [json, txt] {
        let output = cargo_bin_cmd!("cardio")
            .args(["analyze", "--input", input.to_str().expect("utf8 path")])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let report: Report = serde_json::from_slice(&output)?;
        assert_eq!(report.total_beats, 0);
        assert_eq!(report.diagnosis, "Error: Signal too short.");
        assert_eq!(report.risk_level, "Unknown");
    }
    Ok(())
}

#[test]
fn unsupported_format_is_rejected() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("trace.pdf");
    fs::write(&input, b"%PDF-1.4")?;
    cargo_bin_cmd!("cardio")
        .args(["analyze", "--input", input.to_str().expect("utf8 path")])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn json_without_signal_key_is_rejected() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("bad.json");
    fs::write(&input, br#"{"samples": [1, 2, 3]}"#)?;
    let assert = cargo_bin_cmd!("cardio")
        .args(["analyze", "--input", input.to_str().expect("utf8 path")])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("'signal'"), "stderr: {}", stderr);
    Ok(())
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}
