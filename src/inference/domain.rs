//! A model adapter bound to the feature schema it was fit against.

use crate::common::error::ReimburseResult;
use crate::data::domain::TripRecord;
use crate::features::domain::FeatureSchema;
use crate::features::service as deriver;
use crate::model::adapter::ModelAdapter;

/// Everything needed to turn trip records into reimbursement predictions.
#[derive(Debug)]
pub struct Predictor {
    adapter: ModelAdapter,
    schema: FeatureSchema,
}

impl Predictor {
    pub fn new(adapter: ModelAdapter, schema: FeatureSchema) -> Self {
        Self { adapter, schema }
    }

    pub fn adapter(&self) -> &ModelAdapter {
        &self.adapter
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Derive and predict a batch with a single regressor call.
    pub fn predict_all(&self, records: &[TripRecord]) -> ReimburseResult<Vec<f64>> {
        let vectors = deriver::derive_all(records, &self.schema);
        self.adapter.predict(&vectors)
    }

    /// Derive and predict one record.
    pub fn predict_one(&self, record: &TripRecord) -> ReimburseResult<f64> {
        let vector = deriver::derive(record, &self.schema);
        self.adapter.predict_one(&vector)
    }
}
