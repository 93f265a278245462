//! Model adapter: owns a loaded regressor and the column order it was fit on,
//! and lines derived vectors up with that order before predicting.
//!
//! Columns the model expects but a vector lacks are filled with zero. This is
//! a compatibility shim for schema drift between the exporting pipeline and
//! this one, and it always logs which columns it filled.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::common::error::{ReimburseError, ReimburseResult};
use crate::features::domain::{FeatureSchema, FeatureVector, SchemaSpec};
use crate::features::profiles::{self, DEFAULT_PROFILE};

use super::domain::Regressor;
use super::repo_fs::ModelRepo;

/// A loaded model ready to predict.
pub struct ModelAdapter {
    regressor: Box<dyn Regressor>,
    expected: Option<Vec<String>>,
    declared_profile: Option<String>,
}

impl std::fmt::Debug for ModelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("n_features", &self.regressor.n_features())
            .field("expected", &self.expected)
            .field("declared_profile", &self.declared_profile)
            .finish()
    }
}

/// How the columns of one vector layout map onto the expected columns.
struct ColumnPlan<'a> {
    source: &'a [String],
    /// For every expected column, its position in the source vector.
    positions: Vec<Option<usize>>,
}

impl ModelAdapter {
    /// Load the regressor (fatal on failure) and the optional manifest
    /// (falls back to the deriver's natural order with a warning).
    pub fn load(repo: &dyn ModelRepo) -> ReimburseResult<Self> {
        let model = repo.load_model()?;
        let model_profile = model.profile.clone();
        let regressor = model.into_regressor();

        let (expected, manifest_profile) = match repo.load_manifest() {
            Ok(manifest) => (Some(manifest.columns), manifest.profile),
            Err(err) => {
                warn!(
                    error = %err,
                    "no usable column manifest; using the deriver's column order unmodified"
                );
                (None, None)
            }
        };

        let declared_profile = match (model_profile, manifest_profile) {
            (Some(a), Some(b)) if a != b => {
                return Err(ReimburseError::schema(format!(
                    "model declares profile `{a}` but its manifest declares `{b}`"
                )));
            }
            (a, b) => a.or(b),
        };

        let adapter = Self::from_parts(regressor, expected, declared_profile)?;
        info!(
            source = %repo.describe(),
            n_features = adapter.n_features(),
            manifest = adapter.expected.is_some(),
            profile = adapter.declared_profile.as_deref().unwrap_or("-"),
            "model loaded"
        );
        Ok(adapter)
    }

    /// Assemble an adapter from an in-memory regressor.
    pub fn from_parts(
        regressor: Box<dyn Regressor>,
        expected: Option<Vec<String>>,
        declared_profile: Option<String>,
    ) -> ReimburseResult<Self> {
        if let Some(columns) = &expected {
            if columns.len() != regressor.n_features() {
                return Err(ReimburseError::schema(format!(
                    "manifest lists {} columns but the model takes {} features",
                    columns.len(),
                    regressor.n_features()
                )));
            }
        }
        Ok(Self {
            regressor,
            expected,
            declared_profile,
        })
    }

    /// Training-time column order, when a manifest was available.
    pub fn expected_columns(&self) -> Option<&[String]> {
        self.expected.as_deref()
    }

    /// Feature profile recorded alongside the model.
    pub fn declared_profile(&self) -> Option<&str> {
        self.declared_profile.as_deref()
    }

    pub fn n_features(&self) -> usize {
        self.regressor.n_features()
    }

    /// Reorder one vector to the expected columns, zero-filling gaps.
    pub fn align(&self, vector: &FeatureVector) -> Vec<f64> {
        self.align_all(std::slice::from_ref(vector))
            .pop()
            .unwrap_or_default()
    }

    /// Reorder a batch; the zero-fill warning is emitted once per distinct layout.
    pub fn align_all(&self, vectors: &[FeatureVector]) -> Vec<Vec<f64>> {
        let Some(expected) = &self.expected else {
            return vectors.iter().map(|v| v.values().to_vec()).collect();
        };

        let mut plan: Option<ColumnPlan<'_>> = None;
        vectors
            .iter()
            .map(|vector| {
                let stale = plan.as_ref().map_or(true, |p| p.source != vector.names());
                if stale {
                    plan = Some(ColumnPlan::build(expected, vector.names()));
                }
                match &plan {
                    Some(p) => p.apply(vector.values()),
                    None => Vec::new(),
                }
            })
            .collect()
    }

    /// Predict a batch in one call to the regressor.
    pub fn predict(&self, vectors: &[FeatureVector]) -> ReimburseResult<Vec<f64>> {
        if vectors.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.align_all(vectors);
        let predictions = self.regressor.predict(&rows)?;
        if let Some(idx) = predictions.iter().position(|p| !p.is_finite()) {
            return Err(ReimburseError::schema(format!(
                "model produced a non-finite prediction for row {}",
                idx + 1
            )));
        }
        Ok(predictions)
    }

    /// Predict a single vector.
    pub fn predict_one(&self, vector: &FeatureVector) -> ReimburseResult<f64> {
        self.predict(std::slice::from_ref(vector))?
            .pop()
            .ok_or_else(|| ReimburseError::schema("model returned no prediction"))
    }
}

impl<'a> ColumnPlan<'a> {
    fn build(expected: &[String], source: &'a [String]) -> Self {
        let index: HashMap<&str, usize> = source
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();

        let positions: Vec<Option<usize>> = expected
            .iter()
            .map(|name| index.get(name.as_str()).copied())
            .collect();

        let missing: Vec<&str> = expected
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.as_str())
            .collect();
        if !missing.is_empty() {
            warn!(
                columns = ?missing,
                "derived features lack columns the model expects; filling them with 0"
            );
        }

        let dropped: Vec<&str> = source
            .iter()
            .filter(|name| !expected.contains(*name))
            .map(String::as_str)
            .collect();
        if !dropped.is_empty() {
            debug!(columns = ?dropped, "dropping derived columns the model does not use");
        }

        Self { source, positions }
    }

    fn apply(&self, values: &[f64]) -> Vec<f64> {
        self.positions
            .iter()
            .map(|pos| pos.map_or(0.0, |idx| values[idx]))
            .collect()
    }
}

/// Bind a feature schema to a model.
///
/// The configured profile wins, then the one the model declares, then the
/// default. A configured profile that contradicts the model's declaration is
/// a schema mismatch.
pub fn resolve_schema(
    configured: Option<&str>,
    adapter: &ModelAdapter,
    custom: &[SchemaSpec],
) -> ReimburseResult<FeatureSchema> {
    let name = match (configured, adapter.declared_profile()) {
        (Some(cfg), Some(declared)) if cfg != declared => {
            return Err(ReimburseError::schema(format!(
                "configured profile `{cfg}` does not match the model's profile `{declared}`"
            )));
        }
        (Some(name), _) | (None, Some(name)) => name,
        (None, None) => {
            info!(profile = DEFAULT_PROFILE, "model declares no profile; using the default");
            DEFAULT_PROFILE
        }
    };

    let schema = profiles::resolve(name, custom)?;
    if adapter.expected_columns().is_none()
        && schema.column_names().len() != adapter.n_features()
    {
        return Err(ReimburseError::schema(format!(
            "profile `{}` derives {} columns but the model takes {} and no manifest is available",
            schema.name(),
            schema.column_names().len(),
            adapter.n_features()
        )));
    }
    Ok(schema)
}
