//! Model directory, case files and predictions wired together on disk.

use std::fs;
use std::path::Path;

use reimburse::common::config::AppCfg;
use reimburse::common::error::ErrorCode;
use reimburse::data::repo_fs::FsCaseRepo;
use reimburse::data::service::load_unlabeled;
use reimburse::evaluation::service::evaluate_repo;
use reimburse::evaluation::{render_report, EvaluationOutcome};
use reimburse::features::profiles::{self, EVAL_V3, SINGLE_V1};
use reimburse::inference::service::{open_predictor, write_predictions_to};
use reimburse::model::domain::{
    ColumnManifest, ForestRegressor, LinearRegressor, ModelArtifact, ModelFile, RegressionTree,
    TreeNode,
};
use reimburse::model::repo_fs::FsModelRepo;
use reimburse::TripRecord;

fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> RegressionTree {
    RegressionTree {
        nodes: vec![
            TreeNode::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { value: low },
            TreeNode::Leaf { value: high },
        ],
    }
}

/// Two-tree forest over the `eval_v3` columns: duration <= 3 and miles <= 100.
fn install_forest(dir: &Path) {
    let columns = profiles::resolve(EVAL_V3, &[]).unwrap().column_names().to_vec();
    let repo = FsModelRepo::in_dir(dir);
    repo.put_model(&ModelFile {
        profile: Some(EVAL_V3.to_string()),
        model: ModelArtifact::Forest(ForestRegressor {
            n_features: columns.len(),
            trees: vec![stump(0, 3.0, 100.0, 200.0), stump(1, 100.0, 0.0, 50.0)],
        }),
    })
    .unwrap();
    repo.put_manifest(&ColumnManifest {
        profile: Some(EVAL_V3.to_string()),
        columns,
    })
    .unwrap();
}

fn cfg_for(dir: &Path) -> AppCfg {
    AppCfg {
        model_dir: dir.to_path_buf(),
        ..AppCfg::default()
    }
}

#[test]
fn batch_predictions_land_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    install_forest(dir.path());

    let cases = dir.path().join("cases.json");
    fs::write(
        &cases,
        r#"[
            {"trip_duration_days": 3, "miles_traveled": 93, "total_receipts_amount": 1.42},
            {"trip_duration_days": "5", "miles_traveled": "300", "total_receipts_amount": "100"}
        ]"#,
    )
    .unwrap();

    let predictor = open_predictor(&cfg_for(dir.path())).unwrap();
    let batch = load_unlabeled(&FsCaseRepo::new(&cases)).unwrap();
    assert!(batch.skipped.is_empty());

    let predictions = predictor.predict_all(&batch.cases).unwrap();
    let out = dir.path().join("results.txt");
    write_predictions_to(&out, &predictions).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), "50.00\n125.00\n");
}

#[test]
fn evaluation_counts_skipped_cases_in_the_score() {
    let dir = tempfile::tempdir().unwrap();
    install_forest(dir.path());

    let cases = dir.path().join("public_cases.json");
    fs::write(
        &cases,
        r#"[
            {"input": {"trip_duration_days": 3, "miles_traveled": 93, "total_receipts_amount": 1.42}, "expected_output": 50.0},
            {"input": {"trip_duration_days": 5, "miles_traveled": 300, "total_receipts_amount": 100}, "expected_output": 120.0},
            {"input": {"trip_duration_days": 0, "miles_traveled": 10, "total_receipts_amount": 5}, "expected_output": 10.0}
        ]"#,
    )
    .unwrap();

    let predictor = open_predictor(&cfg_for(dir.path())).unwrap();
    let result = evaluate_repo(&predictor, &FsCaseRepo::new(&cases)).unwrap();

    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].index, 3);
    let EvaluationOutcome::Completed(summary) = &result.outcome else {
        panic!("expected a completed evaluation");
    };
    assert_eq!(summary.total_cases, 3);
    assert_eq!(summary.successful_runs, 2);
    assert_eq!(summary.exact_matches, 1);
    assert!((summary.avg_error - 2.5).abs() < 1e-9);
    assert!((summary.score - 250.2).abs() < 1e-9);

    let report = render_report(&result);
    assert!(report.contains("Case 2: 5 days, 300 miles, $100 receipts"));
    assert!(report.contains("Skipped cases (1):"));
}

#[test]
fn missing_manifest_falls_back_to_natural_order() {
    let dir = tempfile::tempdir().unwrap();
    FsModelRepo::in_dir(dir.path())
        .put_model(&ModelFile {
            profile: None,
            model: ModelArtifact::Linear(LinearRegressor {
                intercept: 0.0,
                coefficients: vec![10.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            }),
        })
        .unwrap();

    let mut cfg = cfg_for(dir.path());
    // The default profile derives more columns than this model takes.
    let err = open_predictor(&cfg).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaMismatch);

    cfg.profile = Some(SINGLE_V1.to_string());
    let predictor = open_predictor(&cfg).unwrap();
    let value = predictor
        .predict_one(&TripRecord::new(3.0, 93.0, 1.42).unwrap())
        .unwrap();
    assert!((value - 123.0).abs() < 1e-9);
}

#[test]
fn reordered_manifest_is_followed() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FsModelRepo::in_dir(dir.path());
    repo.put_model(&ModelFile {
        profile: Some(SINGLE_V1.to_string()),
        model: ModelArtifact::Linear(LinearRegressor {
            intercept: 0.0,
            coefficients: vec![1.0, 100.0, 0.0],
        }),
    })
    .unwrap();
    // `legacy_flag` is not derived by any profile and is zero-filled.
    repo.put_manifest(&ColumnManifest {
        profile: None,
        columns: vec![
            "miles_traveled".to_string(),
            "trip_duration_days".to_string(),
            "legacy_flag".to_string(),
        ],
    })
    .unwrap();

    let predictor = open_predictor(&cfg_for(dir.path())).unwrap();
    let value = predictor
        .predict_one(&TripRecord::new(2.0, 40.0, 0.0).unwrap())
        .unwrap();
    assert!((value - 240.0).abs() < 1e-9);
}

#[test]
fn corrupt_model_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("model.json"), "{not json").unwrap();
    let err = open_predictor(&cfg_for(dir.path())).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ModelLoad);
}
