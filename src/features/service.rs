//! Feature derivation: a pure mapping from a [`TripRecord`] to the ordered
//! vector a [`FeatureSchema`] describes.

use crate::data::domain::TripRecord;

use super::domain::{Feature, FeatureSchema, FeatureVector, InteractionSource};

/// Cents value that earned a rounding bonus in the legacy system.
const CENTS_49: i64 = 49;
const CENTS_50: i64 = 50;
const EFFICIENCY_BAND: (f64, f64) = (180.0, 220.0);
const LOW_RECEIPT_LIMIT: f64 = 50.0;

/// Derive the feature vector of one record.
pub fn derive(record: &TripRecord, schema: &FeatureSchema) -> FeatureVector {
    let scalars = Scalars::compute(record, schema);
    let tier = schema.tiers().map(|t| t.tier_of(record.miles_traveled()));

    let values = schema
        .columns()
        .iter()
        .map(|feature| match feature {
            Feature::MileageTier(idx) => indicator(tier == Some(*idx)),
            scalar => scalars.value(*scalar),
        })
        .collect();

    FeatureVector::new(schema.shared_names(), values)
}

/// Derive vectors for a batch, preserving input order.
#[cfg(not(feature = "parallel"))]
pub fn derive_all(records: &[TripRecord], schema: &FeatureSchema) -> Vec<FeatureVector> {
    records.iter().map(|r| derive(r, schema)).collect()
}

/// Derive vectors for a batch, preserving input order.
#[cfg(feature = "parallel")]
pub fn derive_all(records: &[TripRecord], schema: &FeatureSchema) -> Vec<FeatureVector> {
    use rayon::prelude::*;
    records.par_iter().map(|r| derive(r, schema)).collect()
}

/// Cents component of an amount, rounded on the decimal-scaled value so that
/// `100.49` (stored as `100.48999…`) still reads as 49 cents.
pub fn receipt_cents(amount: f64) -> i64 {
    ((amount * 100.0).round() as i64).rem_euclid(100)
}

struct Scalars {
    duration: f64,
    miles: f64,
    receipts: f64,
    miles_per_day: f64,
    daily_receipts: f64,
    cents: i64,
    high_receipt_threshold: f64,
    miles_cap: f64,
    receipts_cap: f64,
    interaction: InteractionSource,
}

impl Scalars {
    fn compute(record: &TripRecord, schema: &FeatureSchema) -> Self {
        let duration = record.trip_duration_days();
        let miles = record.miles_traveled();
        let receipts = record.total_receipts_amount();
        Self {
            duration,
            miles,
            receipts,
            miles_per_day: miles / duration,
            daily_receipts: receipts / duration,
            cents: receipt_cents(receipts),
            high_receipt_threshold: schema.high_receipt_threshold(),
            miles_cap: schema.miles_cap(),
            receipts_cap: schema.receipts_cap(),
            interaction: schema.interaction(),
        }
    }

    fn is_49_or_50(&self) -> bool {
        self.cents == CENTS_49 || self.cents == CENTS_50
    }

    fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::TripDurationDays => self.duration,
            Feature::MilesTraveled => self.miles,
            Feature::TotalReceiptsAmount => self.receipts,
            Feature::MilesPerDay => self.miles_per_day,
            Feature::DailyReceipts => self.daily_receipts,
            Feature::ReceiptCents => self.cents as f64,
            Feature::Is5Days => indicator(self.duration == 5.0),
            Feature::Is49Cents => indicator(self.cents == CENTS_49),
            Feature::Is50Cents => indicator(self.cents == CENTS_50),
            Feature::Is49Or50Cents => indicator(self.is_49_or_50()),
            Feature::IsHighReceipt => indicator(self.receipts > self.high_receipt_threshold),
            Feature::EfficiencyBonus => indicator(
                (EFFICIENCY_BAND.0..=EFFICIENCY_BAND.1).contains(&self.miles_per_day),
            ),
            Feature::LowReceiptFlag => indicator(self.receipts < LOW_RECEIPT_LIMIT),
            Feature::Mileage49Interaction => {
                let flag = match self.interaction {
                    InteractionSource::Is49Cents => self.cents == CENTS_49,
                    InteractionSource::Is49Or50Cents => self.is_49_or_50(),
                };
                self.miles * indicator(flag)
            }
            Feature::MilesCapped => self.miles.min(self.miles_cap),
            Feature::ReceiptsCapped => self.receipts.min(self.receipts_cap),
            Feature::LogTotalReceiptsAmount => self.receipts.ln_1p(),
            Feature::LogMilesTraveled => self.miles.ln_1p(),
            Feature::MileageTier(_) => 0.0,
        }
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}
