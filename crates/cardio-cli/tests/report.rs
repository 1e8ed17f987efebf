use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::{error::Error, fs, path::PathBuf};
use tempfile::tempdir;

fn beats_path() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("test_data/classified_beats.json")
        .to_string_lossy()
        .to_string()
}

#[test]
fn report_from_external_classifications() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("cardio");
    cmd.args(["report", "--input", &beats_path()]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: Value = serde_json::from_slice(&out)?;
    assert_eq!(value["totalBeats"], 10);
    assert_eq!(value["abnormalBeats"], 1);
    assert_eq!(value["riskLevel"], "Medium");
    assert_eq!(
        value["diagnosis"],
        "Occasional Ectopic/Abnormal beats detected."
    );
    assert_eq!(value["confidence"], 92.8);
    assert_eq!(value["anomalyIndices"], serde_json::json!([810]));
    Ok(())
}

#[test]
fn config_moves_high_risk_boundary() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("cardio.toml");
    fs::write(&config, "[report]\nhigh_risk_percent = 5.0\n")?;
    let mut cmd = cargo_bin_cmd!("cardio");
    cmd.args([
        "report",
        "--config",
        config.to_str().expect("utf8 path"),
        "--input",
        &beats_path(),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: Value = serde_json::from_slice(&out)?;
    assert_eq!(value["riskLevel"], "High");
    Ok(())
}
