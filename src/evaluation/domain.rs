//! Evaluation results and the scoring contract.
//!
//! The thresholds and the score formula are fixed: exact means within $0.01,
//! close means within $1.00, and
//! `score = avg_error * 100 + (total_cases - exact_matches) * 0.1`, lower is
//! better.

use crate::data::domain::{SkippedCase, TripRecord};

/// Absolute error below which a prediction counts as exact.
pub const EXACT_THRESHOLD: f64 = 0.01;
/// Absolute error below which a prediction counts as close.
pub const CLOSE_THRESHOLD: f64 = 1.00;
/// Number of worst cases listed in the report.
pub const WORST_CASES: usize = 5;

/// Composite score. Uses the *average* error scaled by 100, plus a tenth of a
/// point for every case that is not an exact match.
pub fn score(avg_error: f64, total_cases: usize, exact_matches: usize) -> f64 {
    avg_error * 100.0 + total_cases.saturating_sub(exact_matches) as f64 * 0.1
}

/// Prediction for one labelled case.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseOutcome {
    /// 1-based position in the source file.
    pub index: usize,
    pub record: TripRecord,
    pub expected: f64,
    pub predicted: f64,
    pub error: f64,
}

impl CaseOutcome {
    pub fn new(index: usize, record: TripRecord, expected: f64, predicted: f64) -> Self {
        Self {
            index,
            record,
            expected,
            predicted,
            error: (predicted - expected).abs(),
        }
    }

    pub fn is_exact(&self) -> bool {
        self.error < EXACT_THRESHOLD
    }

    pub fn is_close(&self) -> bool {
        self.error < CLOSE_THRESHOLD
    }
}

/// Qualitative reading of the exact-match count.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScoreBand {
    Perfect,
    Excellent,
    Great,
    Good,
    KeepGoing,
}

impl ScoreBand {
    pub fn classify(exact_matches: usize, total_cases: usize) -> Self {
        if exact_matches == total_cases {
            Self::Perfect
        } else if exact_matches > 950 {
            Self::Excellent
        } else if exact_matches > 800 {
            Self::Great
        } else if exact_matches > 500 {
            Self::Good
        } else {
            Self::KeepGoing
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Perfect => "PERFECT SCORE! The system has been reverse-engineered completely.",
            Self::Excellent => "Excellent! Very close to the perfect solution.",
            Self::Great => "Great work! Most of the system behavior is captured.",
            Self::Good => "Good progress! Some key patterns are understood.",
            Self::KeepGoing => "Keep analyzing the patterns in the interviews and test cases.",
        }
    }
}

/// Aggregate statistics over the successful predictions.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Every case in the source file, including skipped ones.
    pub total_cases: usize,
    pub successful_runs: usize,
    pub exact_matches: usize,
    pub close_matches: usize,
    pub total_error: f64,
    pub avg_error: f64,
    pub max_error: f64,
    /// Case index of the largest error.
    pub max_error_case: usize,
    pub score: f64,
}

impl Summary {
    /// Aggregate outcomes; `None` when there is nothing to aggregate.
    pub fn from_outcomes(outcomes: &[CaseOutcome], total_cases: usize) -> Option<Self> {
        if outcomes.is_empty() {
            return None;
        }
        let successful_runs = outcomes.len();
        let exact_matches = outcomes.iter().filter(|o| o.is_exact()).count();
        let close_matches = outcomes.iter().filter(|o| o.is_close()).count();
        let total_error: f64 = outcomes.iter().map(|o| o.error).sum();
        let worst = outcomes
            .iter()
            .fold(&outcomes[0], |worst, o| if o.error > worst.error { o } else { worst });
        let avg_error = total_error / successful_runs as f64;

        Some(Self {
            total_cases,
            successful_runs,
            exact_matches,
            close_matches,
            total_error,
            avg_error,
            max_error: worst.error,
            max_error_case: worst.index,
            score: score(avg_error, total_cases, exact_matches),
        })
    }

    pub fn exact_pct(&self) -> f64 {
        100.0 * self.exact_matches as f64 / self.successful_runs as f64
    }

    pub fn close_pct(&self) -> f64 {
        100.0 * self.close_matches as f64 / self.successful_runs as f64
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::classify(self.exact_matches, self.total_cases)
    }
}

/// Either a summary or the distinct "nothing ran" outcome.
#[derive(Clone, Debug, PartialEq)]
pub enum EvaluationOutcome {
    NoSuccessfulRuns,
    Completed(Summary),
}

/// Everything one evaluation run produced. Not persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationResult {
    pub outcomes: Vec<CaseOutcome>,
    pub skipped: Vec<SkippedCase>,
    pub outcome: EvaluationOutcome,
}

impl EvaluationResult {
    pub fn summary(&self) -> Option<&Summary> {
        match &self.outcome {
            EvaluationOutcome::Completed(summary) => Some(summary),
            EvaluationOutcome::NoSuccessfulRuns => None,
        }
    }

    /// The `n` largest errors, descending; ties keep file order.
    pub fn worst_cases(&self, n: usize) -> Vec<&CaseOutcome> {
        let mut ranked: Vec<&CaseOutcome> = self.outcomes.iter().collect();
        ranked.sort_by(|a, b| b.error.total_cmp(&a.error).then(a.index.cmp(&b.index)));
        ranked.truncate(n);
        ranked
    }
}
