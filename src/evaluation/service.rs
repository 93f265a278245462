//! Scores a model against labelled cases.

use tracing::{info, warn};

use crate::common::error::ReimburseResult;
use crate::data::domain::{CaseRepo, LabeledCase, TripRecord};
use crate::data::service::{self as data_service, CaseBatch};
use crate::inference::domain::Predictor;

use super::domain::{CaseOutcome, EvaluationOutcome, EvaluationResult, Summary};

/// Predict every valid case in one batch and compare with the labels.
/// Skipped cases still count towards `total_cases` in the score.
pub fn evaluate(
    predictor: &Predictor,
    batch: &CaseBatch<LabeledCase>,
) -> ReimburseResult<EvaluationResult> {
    let records: Vec<TripRecord> = batch.cases.iter().map(|c| c.record).collect();
    let predictions = predictor.predict_all(&records)?;

    let outcomes: Vec<CaseOutcome> = batch
        .cases
        .iter()
        .zip(predictions)
        .map(|(case, predicted)| {
            CaseOutcome::new(case.index, case.record, case.expected_output, predicted)
        })
        .collect();

    let outcome = match Summary::from_outcomes(&outcomes, batch.total()) {
        Some(summary) => {
            info!(
                cases = summary.total_cases,
                exact = summary.exact_matches,
                close = summary.close_matches,
                avg_error = summary.avg_error,
                score = summary.score,
                "evaluation complete"
            );
            EvaluationOutcome::Completed(summary)
        }
        None => {
            warn!(cases = batch.total(), "evaluation produced no successful runs");
            EvaluationOutcome::NoSuccessfulRuns
        }
    };

    Ok(EvaluationResult {
        outcomes,
        skipped: batch.skipped.clone(),
        outcome,
    })
}

/// Load labelled cases from `repo` and evaluate them.
pub fn evaluate_repo(
    predictor: &Predictor,
    repo: &dyn CaseRepo,
) -> ReimburseResult<EvaluationResult> {
    let batch = data_service::load_labeled(repo)?;
    evaluate(predictor, &batch)
}
