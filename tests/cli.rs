//! Exit codes and output of the `reimburse` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use reimburse::common::config::{ENV_CONFIG, ENV_LOG, ENV_MODEL_DIR, ENV_PROFILE};
use reimburse::features::profiles::SINGLE_V1;
use reimburse::model::domain::{LinearRegressor, ModelArtifact, ModelFile};
use reimburse::model::repo_fs::FsModelRepo;

/// `1 + trip_duration_days` under the single-case layout.
fn install_model(dir: &Path) {
    FsModelRepo::in_dir(dir)
        .put_model(&ModelFile {
            profile: Some(SINGLE_V1.to_string()),
            model: ModelArtifact::Linear(LinearRegressor {
                intercept: 1.0,
                coefficients: vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            }),
        })
        .unwrap();
}

fn reimburse(model_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reimburse"))
        .env_remove(ENV_CONFIG)
        .env_remove(ENV_MODEL_DIR)
        .env_remove(ENV_PROFILE)
        .env_remove(ENV_LOG)
        .args(["--log-level", "error", "--model-dir"])
        .arg(model_dir)
        .args(args)
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn predict_prints_one_two_decimal_line() {
    let dir = tempfile::tempdir().unwrap();
    install_model(dir.path());

    let out = reimburse(dir.path(), &["predict", "3", "10", "10"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "4.00\n");
}

#[test]
fn predict_rejects_zero_duration_with_code_3() {
    let dir = tempfile::tempdir().unwrap();
    install_model(dir.path());

    let out = reimburse(dir.path(), &["predict", "0", "10", "10"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("trip_duration_days must be positive"));
}

#[test]
fn predict_without_model_exits_with_code_4() {
    let dir = tempfile::tempdir().unwrap();
    let out = reimburse(dir.path(), &["predict", "3", "10", "10"]);
    assert_eq!(out.status.code(), Some(4));
}

#[test]
fn batch_writes_one_line_per_case() {
    let dir = tempfile::tempdir().unwrap();
    install_model(dir.path());
    let cases = dir.path().join("cases.json");
    fs::write(
        &cases,
        r#"[
            {"trip_duration_days": 1, "miles_traveled": 5, "total_receipts_amount": 5},
            {"trip_duration_days": "2.5", "miles_traveled": "0", "total_receipts_amount": "0"}
        ]"#,
    )
    .unwrap();

    let out = reimburse(dir.path(), &["batch", cases.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "2.00\n3.50\n");
}

#[test]
fn batch_with_an_invalid_case_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    install_model(dir.path());
    let cases = dir.path().join("cases.json");
    let results = dir.path().join("results.txt");
    fs::write(
        &cases,
        r#"[
            {"trip_duration_days": 1, "miles_traveled": 5, "total_receipts_amount": 5},
            {"trip_duration_days": 0, "miles_traveled": 5, "total_receipts_amount": 5}
        ]"#,
    )
    .unwrap();

    let out = reimburse(
        dir.path(),
        &["batch", cases.to_str().unwrap(), "-o", results.to_str().unwrap()],
    );
    assert_eq!(out.status.code(), Some(3));
    assert!(!results.exists());

    let err = stderr(&out);
    assert!(err.contains("1 of 2 cases are invalid; first is case 2"));
    assert_eq!(err.matches("invalid input:").count(), 1, "stderr: {err}");
}

#[test]
fn eval_prints_the_report() {
    let dir = tempfile::tempdir().unwrap();
    install_model(dir.path());
    let cases = dir.path().join("public_cases.json");
    fs::write(
        &cases,
        r#"[{"input": {"trip_duration_days": 3, "miles_traveled": 10, "total_receipts_amount": 10}, "expected_output": 4.0}]"#,
    )
    .unwrap();

    let out = reimburse(dir.path(), &["eval", cases.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("PERFECT SCORE"));
}
