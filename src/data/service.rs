//! Turns raw case entries into validated records.
//!
//! A malformed entry is skipped with a diagnostic instead of failing the
//! batch; only an unreadable or malformed file aborts.

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::common::error::{ReimburseError, ReimburseResult};

use super::domain::{parse_number, CaseRepo, LabeledCase, SkippedCase, TripRecord};

/// Validated cases plus the ones that were left out.
#[derive(Clone, Debug)]
pub struct CaseBatch<T> {
    pub cases: Vec<T>,
    pub skipped: Vec<SkippedCase>,
}

impl<T> CaseBatch<T> {
    /// Number of entries in the source, valid or not.
    pub fn total(&self) -> usize {
        self.cases.len() + self.skipped.len()
    }
}

/// Load cases shaped `{"input": {...}, "expected_output": n}`.
pub fn load_labeled(repo: &dyn CaseRepo) -> ReimburseResult<CaseBatch<LabeledCase>> {
    let entries = repo.entries()?;
    let batch = collect(&entries, labeled_case);
    log_batch(repo, &batch);
    Ok(batch)
}

/// Load flat trip records without labels.
pub fn load_unlabeled(repo: &dyn CaseRepo) -> ReimburseResult<CaseBatch<TripRecord>> {
    let entries = repo.entries()?;
    let batch = collect(&entries, |_, entry| trip_record(trip_fields(entry)?));
    log_batch(repo, &batch);
    Ok(batch)
}

fn collect<T, F>(entries: &[Value], parse: F) -> CaseBatch<T>
where
    F: Fn(usize, &Value) -> ReimburseResult<T>,
{
    let mut cases = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();

    for (offset, entry) in entries.iter().enumerate() {
        let index = offset + 1;
        match parse(index, entry) {
            Ok(case) => cases.push(case),
            Err(err) => {
                warn!(case = index, error = %err, "skipping invalid case");
                skipped.push(SkippedCase {
                    index,
                    reason: err.to_string(),
                });
            }
        }
    }

    CaseBatch { cases, skipped }
}

fn log_batch<T>(repo: &dyn CaseRepo, batch: &CaseBatch<T>) {
    info!(
        source = %repo.describe(),
        total = batch.total(),
        valid = batch.cases.len(),
        skipped = batch.skipped.len(),
        "loaded cases"
    );
}

fn labeled_case(index: usize, entry: &Value) -> ReimburseResult<LabeledCase> {
    let object = as_object(entry)?;
    let input = object
        .get("input")
        .ok_or_else(|| ReimburseError::invalid("missing field `input`"))?;
    let record = trip_record(as_object(input)?)?;
    let expected_output = number(object, "expected_output")?;

    Ok(LabeledCase {
        index,
        record,
        expected_output,
    })
}

/// Flat records carry the fields directly; an `input` wrapper is tolerated.
fn trip_fields(entry: &Value) -> ReimburseResult<&Map<String, Value>> {
    let object = as_object(entry)?;
    match object.get("input") {
        Some(inner) => as_object(inner),
        None => Ok(object),
    }
}

fn trip_record(fields: &Map<String, Value>) -> ReimburseResult<TripRecord> {
    TripRecord::new(
        number(fields, "trip_duration_days")?,
        number(fields, "miles_traveled")?,
        number(fields, "total_receipts_amount")?,
    )
}

fn as_object(value: &Value) -> ReimburseResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ReimburseError::invalid("case entry is not a JSON object"))
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn number(object: &Map<String, Value>, field: &str) -> ReimburseResult<f64> {
    match object.get(field) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ReimburseError::invalid(format!("{field} is out of range"))),
        Some(Value::String(s)) => parse_number(field, s),
        Some(other) => Err(ReimburseError::invalid(format!(
            "{field} must be numeric, got {other}"
        ))),
        None => Err(ReimburseError::invalid(format!("missing field `{field}`"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Inline(Value);

    impl CaseRepo for Inline {
        fn entries(&self) -> ReimburseResult<Vec<Value>> {
            match &self.0 {
                Value::Array(items) => Ok(items.clone()),
                _ => Err(ReimburseError::invalid("not an array")),
            }
        }

        fn describe(&self) -> String {
            "inline".to_string()
        }
    }

    #[test]
    fn labeled_cases_accept_numbers_and_strings() {
        let repo = Inline(json!([
            {"input": {"trip_duration_days": 3, "miles_traveled": 93, "total_receipts_amount": 1.42}, "expected_output": 364.51},
            {"input": {"trip_duration_days": "5", "miles_traveled": "300", "total_receipts_amount": "100.49"}, "expected_output": "512.30"}
        ]));
        let batch = load_labeled(&repo).unwrap();
        assert_eq!(batch.cases.len(), 2);
        assert!(batch.skipped.is_empty());
        assert_eq!(batch.cases[0].index, 1);
        assert_eq!(batch.cases[1].record.total_receipts_amount(), 100.49);
        assert_eq!(batch.cases[1].expected_output, 512.30);
    }

    #[test]
    fn invalid_entries_are_skipped_with_their_index() {
        let repo = Inline(json!([
            {"input": {"trip_duration_days": 0, "miles_traveled": 1, "total_receipts_amount": 1}, "expected_output": 1},
            {"input": {"trip_duration_days": 1, "miles_traveled": 1, "total_receipts_amount": 1}, "expected_output": 10},
            {"input": {"trip_duration_days": 1, "miles_traveled": true, "total_receipts_amount": 1}, "expected_output": 1},
            {"input": {"trip_duration_days": 1, "miles_traveled": 1, "total_receipts_amount": 1}},
            42
        ]));
        let batch = load_labeled(&repo).unwrap();
        assert_eq!(batch.total(), 5);
        assert_eq!(batch.cases.len(), 1);
        assert_eq!(batch.cases[0].index, 2);
        let skipped: Vec<usize> = batch.skipped.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1, 3, 4, 5]);
        assert!(batch.skipped[2].reason.contains("expected_output"));
    }

    #[test]
    fn unlabeled_cases_are_flat_or_wrapped() {
        let repo = Inline(json!([
            {"trip_duration_days": 2, "miles_traveled": 10, "total_receipts_amount": 5},
            {"input": {"trip_duration_days": 4, "miles_traveled": 20, "total_receipts_amount": 6}},
            {"trip_duration_days": 4}
        ]));
        let batch = load_unlabeled(&repo).unwrap();
        assert_eq!(batch.cases.len(), 2);
        assert_eq!(batch.cases[1].trip_duration_days(), 4.0);
        assert_eq!(batch.skipped.len(), 1);
        assert!(batch.skipped[0].reason.contains("miles_traveled"));
    }

    #[test]
    fn repo_failure_aborts() {
        let repo = Inline(json!({"not": "an array"}));
        assert!(load_labeled(&repo).is_err());
    }
}
