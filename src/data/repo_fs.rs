//! Filesystem-backed source of case entries.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::common::error::{ReimburseError, ReimburseResult};

use super::domain::CaseRepo;

/// Case file on disk: a JSON array with one object per trip.
pub struct FsCaseRepo {
    path: PathBuf,
}

impl FsCaseRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CaseRepo for FsCaseRepo {
    fn entries(&self) -> ReimburseResult<Vec<Value>> {
        let raw =
            fs::read_to_string(&self.path).map_err(|err| ReimburseError::io(&self.path, err))?;
        parse_entries(&self.path, &raw)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Split a case document into its top-level entries. Anything other than a
/// JSON array is fatal for the whole batch.
pub fn parse_entries(origin: &Path, raw: &str) -> ReimburseResult<Vec<Value>> {
    let doc: Value = serde_json::from_str(raw).map_err(|err| ReimburseError::MalformedCases {
        path: origin.to_path_buf(),
        reason: err.to_string(),
    })?;

    match doc {
        Value::Array(entries) => Ok(entries),
        other => Err(ReimburseError::MalformedCases {
            path: origin.to_path_buf(),
            reason: format!("expected a JSON array of cases, found {}", kind(&other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn reads_array_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"trip_duration_days": 1, "miles_traveled": 2, "total_receipts_amount": 3}}]"#
        )
        .unwrap();
        let repo = FsCaseRepo::new(file.path());
        assert_eq!(repo.entries().unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsCaseRepo::new(dir.path().join("absent.json"));
        assert!(matches!(repo.entries(), Err(ReimburseError::Io { .. })));
    }

    #[test]
    fn non_array_document_is_fatal() {
        let err = parse_entries(Path::new("x.json"), r#"{"cases": []}"#).unwrap_err();
        assert!(err.to_string().contains("an object"));
        let err = parse_entries(Path::new("x.json"), "[{").unwrap_err();
        assert!(matches!(err, ReimburseError::MalformedCases { .. }));
    }
}
