//! Error handling primitives shared across the core.
//!
//! Every failure maps to a stable [`ErrorCode`] so the CLI exit status and the
//! C ABI agree on the same numbers.

use std::path::PathBuf;

use thiserror::Error;

/// Stable error codes that cross the FFI boundary and become process exit codes.
///
/// `1` and `2` are left to generic failures and argument parsing errors.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// A trip record or case field failed validation.
    InvalidInput = 3,
    /// The model artefact was missing or could not be decoded.
    ModelLoad = 4,
    /// Feature columns do not line up with what the model was fit against.
    SchemaMismatch = 5,
    /// Reading or writing a file failed.
    Io = 6,
    /// Configuration or any other internal failure.
    Internal = 7,
}

impl ErrorCode {
    /// Exit status used by the command line front-end.
    pub fn exit_code(self) -> i32 {
        self as i32
    }
}

/// Canonical error type for the core.
#[derive(Debug, Error)]
pub enum ReimburseError {
    /// Missing or non-numeric fields, zero trip duration, negative amounts.
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// Model artefact missing or corrupt.
    #[error("failed to load model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// Column manifest missing or corrupt. Callers usually fall back to the
    /// deriver's natural order.
    #[error("failed to load feature column manifest from {path}: {reason}")]
    ManifestLoad { path: PathBuf, reason: String },

    /// Column count or order inconsistent with the trained model.
    #[error("model schema mismatch: {0}")]
    ModelSchemaMismatch(String),

    /// Case file unreadable or output sink unwritable.
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Case file is not valid JSON of the expected shape.
    #[error("malformed case file {path}: {reason}")]
    MalformedCases { path: PathBuf, reason: String },

    /// Invalid configuration value or schema definition.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type ReimburseResult<T> = Result<T, ReimburseError>;

impl ReimburseError {
    /// Validation helper.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InputValidation(msg.into())
    }

    /// Manifest load helper.
    pub fn manifest_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ManifestLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Schema mismatch helper.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::ModelSchemaMismatch(msg.into())
    }

    /// Model load helper.
    pub fn model_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// IO helper that keeps the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Configuration helper.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Machine parsable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InputValidation(_) => ErrorCode::InvalidInput,
            Self::ModelLoad { .. } | Self::ManifestLoad { .. } => ErrorCode::ModelLoad,
            Self::ModelSchemaMismatch(_) => ErrorCode::SchemaMismatch,
            Self::Io { .. } | Self::MalformedCases { .. } => ErrorCode::Io,
            Self::Config(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::Ok as u32, 0);
        assert_eq!(ErrorCode::InvalidInput as u32, 3);
        assert_eq!(ErrorCode::ModelLoad as u32, 4);
        assert_eq!(ErrorCode::SchemaMismatch as u32, 5);
        assert_eq!(ErrorCode::Io as u32, 6);
        assert_eq!(ErrorCode::Internal as u32, 7);
    }

    #[test]
    fn errors_map_to_codes() {
        assert_eq!(
            ReimburseError::invalid("duration").code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(
            ReimburseError::model_load("m.json", "missing").code(),
            ErrorCode::ModelLoad
        );
        assert_eq!(
            ReimburseError::schema("width").code(),
            ErrorCode::SchemaMismatch
        );
        assert_eq!(
            ReimburseError::manifest_load("feature_columns.json", "missing").code(),
            ErrorCode::ModelLoad
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(ReimburseError::io("cases.json", io).code(), ErrorCode::Io);
        assert_eq!(ReimburseError::config("bad").code(), ErrorCode::Internal);
    }

    #[test]
    fn validation_failures_exit_distinctly() {
        assert_eq!(ErrorCode::InvalidInput.exit_code(), 3);
        assert_ne!(ErrorCode::InvalidInput.exit_code(), 1);
        assert_ne!(ErrorCode::InvalidInput.exit_code(), 2);
    }
}
