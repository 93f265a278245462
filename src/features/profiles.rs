//! Built-in schema profiles, one per historical feature layout.
//!
//! | profile      | used by                                   |
//! |--------------|-------------------------------------------|
//! | `single_v1`  | the first single-case predictor            |
//! | `batch_v2`   | the unlabelled batch predictor             |
//! | `eval_v3`    | the labelled batch evaluator (default)     |
//! | `train_v3`   | the last training run (extra `ultra_high` tier) |

use crate::common::error::{ReimburseError, ReimburseResult};

use super::domain::{FeatureSchema, InteractionSource, SchemaSpec};

pub const SINGLE_V1: &str = "single_v1";
pub const BATCH_V2: &str = "batch_v2";
pub const EVAL_V3: &str = "eval_v3";
pub const TRAIN_V3: &str = "train_v3";

/// Profile used when neither the configuration nor the model names one.
pub const DEFAULT_PROFILE: &str = EVAL_V3;

/// Names of every built-in profile.
pub const BUILTIN_PROFILES: [&str; 4] = [SINGLE_V1, BATCH_V2, EVAL_V3, TRAIN_V3];

const BASE_COLUMNS: [&str; 7] = [
    "trip_duration_days",
    "miles_traveled",
    "total_receipts_amount",
    "miles_per_day",
    "daily_receipts",
    "receipt_cents",
    "is_5_days",
];

const FOUR_TIERS: [&str; 4] = ["low", "medium", "high", "very_high"];
const FOUR_TIER_BOUNDS: [f64; 4] = [0.0, 100.0, 500.0, 1000.0];

/// Spec of a built-in profile.
pub fn builtin(name: &str) -> Option<SchemaSpec> {
    let spec = match name {
        SINGLE_V1 => spec(SINGLE_V1, &BASE_COLUMNS, &[]),
        BATCH_V2 => SchemaSpec {
            tier_bounds: FOUR_TIER_BOUNDS.to_vec(),
            tier_labels: strings(&FOUR_TIERS),
            ..spec(
                BATCH_V2,
                &BASE_COLUMNS,
                &[
                    "is_49_cents",
                    "efficiency_bonus",
                    "low_receipt_flag",
                    "mileage_tier_low",
                    "mileage_tier_medium",
                    "mileage_tier_very_high",
                ],
            )
        },
        EVAL_V3 => SchemaSpec {
            tier_bounds: FOUR_TIER_BOUNDS.to_vec(),
            tier_labels: strings(&FOUR_TIERS),
            miles_cap: Some(5000.0),
            receipts_cap: Some(1000.0),
            high_receipt_threshold: Some(500.0),
            interaction: InteractionSource::Is49Cents,
            ..spec(
                EVAL_V3,
                &BASE_COLUMNS,
                &[
                    "is_49_cents",
                    "is_49_or_50_cents",
                    "is_high_receipt",
                    "efficiency_bonus",
                    "low_receipt_flag",
                    "mileage_49_interaction",
                    "mileage_tier_medium",
                    "mileage_tier_high",
                    "mileage_tier_very_high",
                    "miles_capped",
                    "receipts_capped",
                    "log_total_receipts_amount",
                    "log_miles_traveled",
                ],
            )
        },
        TRAIN_V3 => SchemaSpec {
            tier_bounds: vec![0.0, 100.0, 500.0, 1000.0, 1500.0],
            tier_labels: strings(&["low", "medium", "high", "very_high", "ultra_high"]),
            miles_cap: Some(1000.0),
            receipts_cap: Some(1000.0),
            high_receipt_threshold: Some(1000.0),
            interaction: InteractionSource::Is49Or50Cents,
            ..spec(
                TRAIN_V3,
                &BASE_COLUMNS,
                &[
                    "is_49_cents",
                    "is_50_cents",
                    "is_49_or_50_cents",
                    "efficiency_bonus",
                    "low_receipt_flag",
                    "miles_capped",
                    "receipts_capped",
                    "is_high_receipt",
                    "mileage_49_interaction",
                    "mileage_tier_medium",
                    "mileage_tier_high",
                    "mileage_tier_very_high",
                    "mileage_tier_ultra_high",
                    "log_miles_traveled",
                    "log_total_receipts_amount",
                ],
            )
        },
        _ => return None,
    };
    Some(spec)
}

/// Compile a profile by name, looking at custom schemas after the built-ins.
/// A custom schema may not shadow a built-in name.
pub fn resolve(name: &str, custom: &[SchemaSpec]) -> ReimburseResult<FeatureSchema> {
    if let Some(shadow) = custom.iter().find(|s| BUILTIN_PROFILES.contains(&s.name.as_str())) {
        return Err(ReimburseError::config(format!(
            "custom schema `{}` shadows a built-in profile",
            shadow.name
        )));
    }

    if let Some(spec) = builtin(name) {
        return FeatureSchema::from_spec(&spec);
    }
    match custom.iter().find(|s| s.name == name) {
        Some(spec) => FeatureSchema::from_spec(spec),
        None => Err(ReimburseError::config(format!(
            "unknown feature profile `{name}` (built-in: {})",
            BUILTIN_PROFILES.join(", ")
        ))),
    }
}

fn spec(name: &str, base: &[&str], extra: &[&str]) -> SchemaSpec {
    SchemaSpec {
        name: name.to_string(),
        version: 1,
        columns: base.iter().chain(extra).map(|c| c.to_string()).collect(),
        tier_bounds: Vec::new(),
        tier_labels: Vec::new(),
        miles_cap: None,
        receipts_cap: None,
        high_receipt_threshold: None,
        interaction: InteractionSource::default(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
