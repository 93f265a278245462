//! Evaluation: scoring predictions against labelled cases and reporting.

pub mod domain;
pub mod report;
pub mod service;

pub use domain::{CaseOutcome, EvaluationOutcome, EvaluationResult, ScoreBand, Summary};
pub use report::render_report;
pub use service::evaluate;
