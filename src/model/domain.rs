//! Regressor artefacts and the column manifest persisted next to them.
//!
//! Training happens elsewhere; this module only knows how to evaluate the
//! exported models. Two families are supported: a forest of regression trees
//! (prediction is the mean over trees) and a plain linear model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::common::error::{ReimburseError, ReimburseResult};

/// Anything that maps a fixed-width numeric row to a prediction.
pub trait Regressor: Send + Sync {
    /// Width of the rows the model was fit on.
    fn n_features(&self) -> usize;

    /// Predict a single row. Callers guarantee `row.len() == n_features()`.
    fn predict_row(&self, row: &[f64]) -> f64;

    /// Predict a batch, rejecting rows of the wrong width.
    fn predict(&self, rows: &[Vec<f64>]) -> ReimburseResult<Vec<f64>> {
        let width = self.n_features();
        if let Some(bad) = rows.iter().find(|row| row.len() != width) {
            return Err(ReimburseError::schema(format!(
                "model expects {width} features per row, got {}",
                bad.len()
            )));
        }
        Ok(rows.iter().map(|row| self.predict_row(row)).collect())
    }
}

/// One node of a regression tree. Rows with `x[feature] <= threshold` go left.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Flat node array with the root at index 0. Children always sit at a larger
/// index than their parent, which keeps traversal finite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {idx} splits on feature {feature}, model has {n_features}"
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {idx} has a NaN threshold"));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= len {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } if !value.is_finite() => {
                    return Err(format!("leaf {idx} has non-finite value"));
                }
                TreeNode::Leaf { .. } => {}
            }
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Averaging ensemble of regression trees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl Regressor for ForestRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }
}

/// `intercept + coefficients · row`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Regressor for LinearRegressor {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// Model family stored in the artefact, discriminated by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Forest(ForestRegressor),
    Linear(LinearRegressor),
}

/// Contents of the model file: the regressor plus the feature profile it was
/// fit against, when the exporter recorded one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(flatten)]
    pub model: ModelArtifact,
}

impl ModelFile {
    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        match &self.model {
            ModelArtifact::Forest(forest) => {
                if forest.n_features == 0 {
                    return Err("forest declares zero features".to_string());
                }
                if forest.trees.is_empty() {
                    return Err("forest has no trees".to_string());
                }
                for (idx, tree) in forest.trees.iter().enumerate() {
                    tree.validate(forest.n_features)
                        .map_err(|reason| format!("tree {idx}: {reason}"))?;
                }
                Ok(())
            }
            ModelArtifact::Linear(linear) => {
                if linear.coefficients.is_empty() {
                    return Err("linear model has no coefficients".to_string());
                }
                if !linear.intercept.is_finite()
                    || linear.coefficients.iter().any(|c| !c.is_finite())
                {
                    return Err("linear model has non-finite parameters".to_string());
                }
                Ok(())
            }
        }
    }

    /// Hand the regressor over as a trait object.
    pub fn into_regressor(self) -> Box<dyn Regressor> {
        match self.model {
            ModelArtifact::Forest(forest) => Box::new(forest),
            ModelArtifact::Linear(linear) => Box::new(linear),
        }
    }
}

/// Training-time column order. Stored either as a bare JSON array or as an
/// object that also names the profile.
#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestRepr {
    Columns(Vec<String>),
    Described {
        #[serde(default)]
        profile: Option<String>,
        columns: Vec<String>,
    },
}

/// Ordered list of the columns the regressor was fit on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ManifestRepr")]
pub struct ColumnManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub columns: Vec<String>,
}

impl From<ManifestRepr> for ColumnManifest {
    fn from(repr: ManifestRepr) -> Self {
        match repr {
            ManifestRepr::Columns(columns) => Self {
                profile: None,
                columns,
            },
            ManifestRepr::Described { profile, columns } => Self { profile, columns },
        }
    }
}

impl ColumnManifest {
    pub fn validate(&self) -> Result<(), String> {
        if self.columns.is_empty() {
            return Err("manifest lists no columns".to_string());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(format!("manifest lists `{dup}` twice"));
        }
        Ok(())
    }
}
