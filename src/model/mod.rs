//! Model domain: persisted regressors, the column manifest and the adapter
//! that binds them to a feature schema.

pub mod adapter;
pub mod domain;
pub mod repo_fs;

pub use adapter::{resolve_schema, ModelAdapter};
pub use domain::{ColumnManifest, ModelArtifact, ModelFile, Regressor};
pub use repo_fs::{FsModelRepo, ModelRepo};
