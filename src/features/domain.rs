//! Feature schema contract shared by the deriver and the model adapter.
//!
//! A [`FeatureSchema`] fixes the ordered column list together with every
//! parameter that changes a column's value (tier boundaries, caps, the
//! high-receipt threshold). Two pipelines produce the same vectors exactly
//! when they use the same schema.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::error::{ReimburseError, ReimburseResult};

/// Column name prefix of the one-hot mileage tier indicators.
pub const TIER_PREFIX: &str = "mileage_tier_";

/// A single derived column.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Feature {
    TripDurationDays,
    MilesTraveled,
    TotalReceiptsAmount,
    MilesPerDay,
    DailyReceipts,
    ReceiptCents,
    Is5Days,
    Is49Cents,
    Is50Cents,
    Is49Or50Cents,
    IsHighReceipt,
    EfficiencyBonus,
    LowReceiptFlag,
    Mileage49Interaction,
    MilesCapped,
    ReceiptsCapped,
    LogTotalReceiptsAmount,
    LogMilesTraveled,
    /// Indicator for the tier at this position in [`MileageTiers`].
    MileageTier(usize),
}

const SCALAR_FEATURES: [(Feature, &str); 18] = [
    (Feature::TripDurationDays, "trip_duration_days"),
    (Feature::MilesTraveled, "miles_traveled"),
    (Feature::TotalReceiptsAmount, "total_receipts_amount"),
    (Feature::MilesPerDay, "miles_per_day"),
    (Feature::DailyReceipts, "daily_receipts"),
    (Feature::ReceiptCents, "receipt_cents"),
    (Feature::Is5Days, "is_5_days"),
    (Feature::Is49Cents, "is_49_cents"),
    (Feature::Is50Cents, "is_50_cents"),
    (Feature::Is49Or50Cents, "is_49_or_50_cents"),
    (Feature::IsHighReceipt, "is_high_receipt"),
    (Feature::EfficiencyBonus, "efficiency_bonus"),
    (Feature::LowReceiptFlag, "low_receipt_flag"),
    (Feature::Mileage49Interaction, "mileage_49_interaction"),
    (Feature::MilesCapped, "miles_capped"),
    (Feature::ReceiptsCapped, "receipts_capped"),
    (Feature::LogTotalReceiptsAmount, "log_total_receipts_amount"),
    (Feature::LogMilesTraveled, "log_miles_traveled"),
];

impl Feature {
    /// Column name as it appears in manifests.
    pub fn name(&self, tiers: Option<&MileageTiers>) -> String {
        match self {
            Feature::MileageTier(idx) => {
                let label = tiers
                    .and_then(|t| t.labels.get(*idx))
                    .map(String::as_str)
                    .unwrap_or("unknown");
                format!("{TIER_PREFIX}{label}")
            }
            scalar => SCALAR_FEATURES
                .iter()
                .find(|(feature, _)| feature == scalar)
                .map(|(_, name)| (*name).to_string())
                .unwrap_or_default(),
        }
    }

    /// Resolve a column name; tier columns need the tier definition.
    pub fn parse(name: &str, tiers: Option<&MileageTiers>) -> Option<Self> {
        if let Some(label) = name.strip_prefix(TIER_PREFIX) {
            return tiers
                .and_then(|t| t.labels.iter().position(|l| l == label))
                .map(Feature::MileageTier);
        }
        SCALAR_FEATURES
            .iter()
            .find(|(_, candidate)| *candidate == name)
            .map(|(feature, _)| *feature)
    }
}

/// Which cents flag multiplies the miles in `mileage_49_interaction`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionSource {
    Is49Cents,
    #[default]
    Is49Or50Cents,
}

/// Ordered mileage buckets.
///
/// Tier `i` covers `(bounds[i], bounds[i + 1]]`; the first tier also takes
/// everything up to and including `bounds[0]`, the last one is open-ended.
#[derive(Clone, Debug, PartialEq)]
pub struct MileageTiers {
    bounds: Vec<f64>,
    labels: Vec<String>,
}

impl MileageTiers {
    pub fn new(bounds: Vec<f64>, labels: Vec<String>) -> ReimburseResult<Self> {
        if bounds.is_empty() {
            return Err(ReimburseError::config("mileage tiers need at least one bound"));
        }
        if bounds.len() != labels.len() {
            return Err(ReimburseError::config(format!(
                "{} tier bounds but {} tier labels",
                bounds.len(),
                labels.len()
            )));
        }
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(ReimburseError::config(
                "tier bounds must be finite; the last tier is open-ended",
            ));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ReimburseError::config("tier bounds must be strictly ascending"));
        }
        let mut seen = HashSet::new();
        if labels.iter().any(|l| l.is_empty() || !seen.insert(l.as_str())) {
            return Err(ReimburseError::config("tier labels must be unique and non-empty"));
        }
        Ok(Self { bounds, labels })
    }

    /// Index of the tier `miles` falls into.
    pub fn tier_of(&self, miles: f64) -> usize {
        self.bounds
            .iter()
            .skip(1)
            .take_while(|&&bound| miles > bound)
            .count()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }
}

/// Serializable description of a schema, used for built-in profiles and
/// `[[schemas]]` entries in the configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSpec {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub columns: Vec<String>,
    #[serde(default)]
    pub tier_bounds: Vec<f64>,
    #[serde(default)]
    pub tier_labels: Vec<String>,
    #[serde(default)]
    pub miles_cap: Option<f64>,
    #[serde(default)]
    pub receipts_cap: Option<f64>,
    #[serde(default)]
    pub high_receipt_threshold: Option<f64>,
    #[serde(default)]
    pub interaction: InteractionSource,
}

fn default_version() -> u32 {
    1
}

/// Compiled, validated schema.
#[derive(Clone, Debug)]
pub struct FeatureSchema {
    name: String,
    version: u32,
    columns: Vec<Feature>,
    column_names: Arc<[String]>,
    tiers: Option<MileageTiers>,
    miles_cap: f64,
    receipts_cap: f64,
    high_receipt_threshold: f64,
    interaction: InteractionSource,
}

impl FeatureSchema {
    /// Validate a spec. Every column must be known and every parameter a
    /// column depends on must be present.
    pub fn from_spec(spec: &SchemaSpec) -> ReimburseResult<Self> {
        let err = |msg: String| ReimburseError::config(format!("schema `{}`: {msg}", spec.name));

        if spec.columns.is_empty() {
            return Err(err("no columns".to_string()));
        }

        let tiers = if spec.tier_bounds.is_empty() && spec.tier_labels.is_empty() {
            None
        } else {
            Some(
                MileageTiers::new(spec.tier_bounds.clone(), spec.tier_labels.clone())
                    .map_err(|e| err(e.to_string()))?,
            )
        };

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(spec.columns.len());
        for name in &spec.columns {
            if !seen.insert(name.as_str()) {
                return Err(err(format!("duplicate column `{name}`")));
            }
            let feature = Feature::parse(name, tiers.as_ref())
                .ok_or_else(|| err(format!("unknown column `{name}`")))?;
            columns.push(feature);
        }

        let needs = |feature: Feature| columns.contains(&feature);
        let miles_cap = required(spec.miles_cap, needs(Feature::MilesCapped), "miles_cap")
            .map_err(&err)?;
        let receipts_cap =
            required(spec.receipts_cap, needs(Feature::ReceiptsCapped), "receipts_cap")
                .map_err(&err)?;
        let high_receipt_threshold = required(
            spec.high_receipt_threshold,
            needs(Feature::IsHighReceipt),
            "high_receipt_threshold",
        )
        .map_err(&err)?;

        let column_names: Vec<String> = columns.iter().map(|c| c.name(tiers.as_ref())).collect();

        Ok(Self {
            name: spec.name.clone(),
            version: spec.version,
            columns,
            column_names: Arc::from(column_names),
            tiers,
            miles_cap,
            receipts_cap,
            high_receipt_threshold,
            interaction: spec.interaction,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn columns(&self) -> &[Feature] {
        &self.columns
    }

    /// Natural column order of vectors derived with this schema.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub(crate) fn shared_names(&self) -> Arc<[String]> {
        Arc::clone(&self.column_names)
    }

    pub fn tiers(&self) -> Option<&MileageTiers> {
        self.tiers.as_ref()
    }

    pub fn miles_cap(&self) -> f64 {
        self.miles_cap
    }

    pub fn receipts_cap(&self) -> f64 {
        self.receipts_cap
    }

    pub fn high_receipt_threshold(&self) -> f64 {
        self.high_receipt_threshold
    }

    pub fn interaction(&self) -> InteractionSource {
        self.interaction
    }
}

fn required(value: Option<f64>, needed: bool, field: &str) -> Result<f64, String> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(format!("{field} must be finite, got {v}")),
        None if needed => Err(format!("{field} is required by the selected columns")),
        None => Ok(f64::INFINITY),
    }
}

/// Ordered named values derived from one trip.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn new(names: Arc<[String]>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column, if present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}
