//! Runtime configuration loaded from defaults, an optional TOML file and the
//! process environment, in that order of precedence (later wins).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::error::{ReimburseError, ReimburseResult};
use crate::features::domain::SchemaSpec;

/// Environment variable naming an optional TOML configuration file.
pub const ENV_CONFIG: &str = "REIMBURSE_CONFIG";
/// Environment override for the model directory.
pub const ENV_MODEL_DIR: &str = "REIMBURSE_MODEL_DIR";
/// Environment override for the feature profile.
pub const ENV_PROFILE: &str = "REIMBURSE_PROFILE";
/// Environment override for the log filter.
pub const ENV_LOG: &str = "REIMBURSE_LOG";

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppCfg {
    /// Directory holding the model artefact and its column manifest.
    pub model_dir: PathBuf,
    /// Regressor artefact file name inside `model_dir`.
    pub model_file: String,
    /// Optional training-time column manifest inside `model_dir`.
    pub manifest_file: String,
    /// Feature profile to derive with; `None` defers to the model's declaration.
    pub profile: Option<String>,
    /// `tracing` filter directive.
    pub log_level: String,
    /// Custom feature schemas usable by name alongside the built-in profiles.
    pub schemas: Vec<SchemaSpec>,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("."),
            model_file: "model.json".to_string(),
            manifest_file: "feature_columns.json".to_string(),
            profile: None,
            log_level: "warn".to_string(),
            schemas: Vec::new(),
        }
    }
}

impl AppCfg {
    /// Build a configuration snapshot: defaults, then the TOML file named by
    /// `path` (or `REIMBURSE_CONFIG`), then environment overrides.
    pub fn load(path: Option<&Path>) -> ReimburseResult<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(ENV_CONFIG).map(PathBuf::from));

        let mut cfg = match file {
            Some(file) => Self::from_file(&file)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok());
        Ok(cfg)
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> ReimburseResult<Self> {
        let raw = fs::read_to_string(path).map_err(|err| ReimburseError::io(path, err))?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(raw: &str) -> ReimburseResult<Self> {
        toml::from_str(raw).map_err(|err| ReimburseError::config(err.to_string()))
    }

    /// Overlay environment values obtained through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_MODEL_DIR).filter(|v| !v.is_empty()) {
            self.model_dir = PathBuf::from(dir);
        }
        if let Some(profile) = lookup(ENV_PROFILE).filter(|v| !v.is_empty()) {
            self.profile = Some(profile);
        }
        if let Some(level) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
    }

    /// Full path of the regressor artefact.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    /// Full path of the column manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.model_dir.join(&self.manifest_file)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_point_at_working_directory() {
        let cfg = AppCfg::default();
        assert_eq!(cfg.model_path(), PathBuf::from("./model.json"));
        assert_eq!(cfg.manifest_path(), PathBuf::from("./feature_columns.json"));
        assert!(cfg.profile.is_none());
    }

    #[test]
    fn toml_overrides_defaults() {
        let cfg = AppCfg::from_toml(
            r#"
            model_dir = "/srv/models"
            profile = "batch_v2"

            [[schemas]]
            name = "tiny"
            columns = ["trip_duration_days", "miles_capped"]
            miles_cap = 800.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(cfg.profile.as_deref(), Some("batch_v2"));
        assert_eq!(cfg.model_file, "model.json");
        assert_eq!(cfg.schemas.len(), 1);
        assert_eq!(cfg.schemas[0].miles_cap, Some(800.0));
        let tiny = crate::features::profiles::resolve("tiny", &cfg.schemas).unwrap();
        assert_eq!(tiny.column_names().len(), 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppCfg::from_toml("modle_dir = \"x\"").unwrap_err();
        assert!(matches!(err, ReimburseError::Config(_)));
    }

    #[test]
    fn environment_wins_over_file() {
        let mut cfg = AppCfg::from_toml("profile = \"batch_v2\"").unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_PROFILE, "eval_v3"),
            (ENV_MODEL_DIR, "/tmp/m"),
            (ENV_LOG, ""),
        ]
        .into_iter()
        .collect();
        cfg.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.profile.as_deref(), Some("eval_v3"));
        assert_eq!(cfg.model_dir, PathBuf::from("/tmp/m"));
        assert_eq!(cfg.log_level, "warn");
    }
}
