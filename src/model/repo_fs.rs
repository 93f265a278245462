//! Filesystem repository for model artefacts and column manifests.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::config::AppCfg;
use crate::common::error::{ReimburseError, ReimburseResult};

use super::domain::{ColumnManifest, ModelFile};

/// Repository contract for persisted models.
pub trait ModelRepo {
    /// Load and validate the regressor artefact. Any failure is a model load error.
    fn load_model(&self) -> ReimburseResult<ModelFile>;
    /// Load the optional column manifest.
    fn load_manifest(&self) -> ReimburseResult<ColumnManifest>;
    /// Human readable origin used in diagnostics.
    fn describe(&self) -> String;
}

/// Model directory on local disk.
pub struct FsModelRepo {
    model_path: PathBuf,
    manifest_path: PathBuf,
}

impl FsModelRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self {
            model_path: cfg.model_path(),
            manifest_path: cfg.manifest_path(),
        }
    }

    /// Repository with the default file names inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let cfg = AppCfg {
            model_dir: dir.into(),
            ..AppCfg::default()
        };
        Self::new(&cfg)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Persist a model artefact, replacing any previous one.
    pub fn put_model(&self, model: &ModelFile) -> ReimburseResult<()> {
        write_json(&self.model_path, model).map_err(|err| ReimburseError::io(&self.model_path, err))
    }

    /// Persist the column manifest next to the model.
    pub fn put_manifest(&self, manifest: &ColumnManifest) -> ReimburseResult<()> {
        write_json(&self.manifest_path, manifest)
            .map_err(|err| ReimburseError::io(&self.manifest_path, err))
    }
}

impl ModelRepo for FsModelRepo {
    fn load_model(&self) -> ReimburseResult<ModelFile> {
        let model: ModelFile = read_json(&self.model_path)
            .map_err(|reason| ReimburseError::model_load(&self.model_path, reason))?;
        model
            .validate()
            .map_err(|reason| ReimburseError::model_load(&self.model_path, reason))?;
        Ok(model)
    }

    fn load_manifest(&self) -> ReimburseResult<ColumnManifest> {
        let manifest: ColumnManifest = read_json(&self.manifest_path)
            .map_err(|reason| ReimburseError::manifest_load(&self.manifest_path, reason))?;
        manifest
            .validate()
            .map_err(|reason| ReimburseError::manifest_load(&self.manifest_path, reason))?;
        Ok(manifest)
    }

    fn describe(&self) -> String {
        self.model_path.display().to_string()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let raw = fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&raw).map_err(|err| err.to_string())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::domain::{LinearRegressor, ModelArtifact};

    fn linear() -> ModelFile {
        ModelFile {
            profile: Some("single_v1".to_string()),
            model: ModelArtifact::Linear(LinearRegressor {
                intercept: 10.0,
                coefficients: vec![1.0; 7],
            }),
        }
    }

    #[test]
    fn put_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsModelRepo::in_dir(dir.path().join("models"));
        repo.put_model(&linear()).unwrap();
        repo.put_manifest(&ColumnManifest {
            profile: None,
            columns: vec!["trip_duration_days".to_string()],
        })
        .unwrap();

        assert_eq!(repo.load_model().unwrap(), linear());
        assert_eq!(repo.load_manifest().unwrap().columns.len(), 1);
    }

    #[test]
    fn missing_artefact_is_a_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsModelRepo::in_dir(dir.path());
        assert!(matches!(repo.load_model(), Err(ReimburseError::ModelLoad { .. })));
    }

    #[test]
    fn corrupt_artefact_is_a_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsModelRepo::in_dir(dir.path());
        fs::write(repo.model_path(), "{\"kind\": \"svm\"}").unwrap();
        let err = repo.load_model().unwrap_err();
        assert!(matches!(err, ReimburseError::ModelLoad { .. }));

        fs::write(
            repo.model_path(),
            r#"{"kind": "linear", "intercept": 0.0, "coefficients": []}"#,
        )
        .unwrap();
        assert!(repo.load_model().unwrap_err().to_string().contains("no coefficients"));
    }

    #[test]
    fn manifest_failures_name_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsModelRepo::in_dir(dir.path());
        let err = repo.load_manifest().unwrap_err();
        assert!(matches!(err, ReimburseError::ManifestLoad { .. }));
        assert!(err.to_string().contains("feature column manifest"));

        fs::write(repo.manifest_path(), "[\"a\", \"a\"]").unwrap();
        let err = repo.load_manifest().unwrap_err();
        assert!(err.to_string().starts_with("failed to load feature column manifest"));
        assert!(err.to_string().contains("twice"));
    }
}
