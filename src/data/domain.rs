//! Core case definitions and their validation rules.

use serde::Serialize;

use crate::common::error::{ReimburseError, ReimburseResult};

/// Raw description of one business trip.
///
/// Only constructible through [`TripRecord::new`], so every value in
/// circulation has a positive duration and non-negative amounts.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct TripRecord {
    trip_duration_days: f64,
    miles_traveled: f64,
    total_receipts_amount: f64,
}

impl TripRecord {
    /// Validate and build a record.
    pub fn new(
        trip_duration_days: f64,
        miles_traveled: f64,
        total_receipts_amount: f64,
    ) -> ReimburseResult<Self> {
        check_finite("trip_duration_days", trip_duration_days)?;
        check_finite("miles_traveled", miles_traveled)?;
        check_finite("total_receipts_amount", total_receipts_amount)?;

        if trip_duration_days <= 0.0 {
            return Err(ReimburseError::invalid(format!(
                "trip_duration_days must be positive, got {trip_duration_days}"
            )));
        }
        if miles_traveled < 0.0 {
            return Err(ReimburseError::invalid(format!(
                "miles_traveled must not be negative, got {miles_traveled}"
            )));
        }
        if total_receipts_amount < 0.0 {
            return Err(ReimburseError::invalid(format!(
                "total_receipts_amount must not be negative, got {total_receipts_amount}"
            )));
        }

        // A tiny positive duration can still overflow the per-day ratios.
        for (field, amount) in [
            ("miles_traveled", miles_traveled),
            ("total_receipts_amount", total_receipts_amount),
        ] {
            if !(amount / trip_duration_days).is_finite() {
                return Err(ReimburseError::invalid(format!(
                    "{field} per day is not finite for trip_duration_days {trip_duration_days}"
                )));
            }
        }

        Ok(Self {
            trip_duration_days,
            miles_traveled,
            total_receipts_amount,
        })
    }

    /// Parse the three fields from text, e.g. command line arguments.
    pub fn parse(duration: &str, miles: &str, receipts: &str) -> ReimburseResult<Self> {
        Self::new(
            parse_number("trip_duration_days", duration)?,
            parse_number("miles_traveled", miles)?,
            parse_number("total_receipts_amount", receipts)?,
        )
    }

    pub fn trip_duration_days(&self) -> f64 {
        self.trip_duration_days
    }

    pub fn miles_traveled(&self) -> f64 {
        self.miles_traveled
    }

    pub fn total_receipts_amount(&self) -> f64 {
        self.total_receipts_amount
    }
}

/// A trip with the reimbursement the legacy system actually paid.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledCase {
    /// 1-based position in the source file.
    pub index: usize,
    pub record: TripRecord,
    pub expected_output: f64,
}

/// A case that failed validation and was left out of the batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedCase {
    /// 1-based position in the source file.
    pub index: usize,
    pub reason: String,
}

/// Repository contract for raw case entries.
pub trait CaseRepo {
    /// Every top-level case entry, in source order.
    fn entries(&self) -> ReimburseResult<Vec<serde_json::Value>>;
    /// Human readable origin used in diagnostics.
    fn describe(&self) -> String;
}

/// Parse a numeric field given as text.
pub fn parse_number(field: &str, raw: &str) -> ReimburseResult<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        ReimburseError::invalid(format!("{field} is not a number: `{raw}`"))
    })?;
    check_finite(field, value)?;
    Ok(value)
}

fn check_finite(field: &str, value: f64) -> ReimburseResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ReimburseError::invalid(format!(
            "{field} must be finite, got {value}"
        )))
    }
}
