//! Batch prediction and its plain-text output format.

use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::common::config::AppCfg;
use crate::common::error::{ReimburseError, ReimburseResult};
use crate::data::domain::TripRecord;
use crate::model::adapter::{resolve_schema, ModelAdapter};
use crate::model::repo_fs::FsModelRepo;

use super::domain::Predictor;

/// Load the model named by the configuration and bind its schema.
pub fn open_predictor(cfg: &AppCfg) -> ReimburseResult<Predictor> {
    let adapter = ModelAdapter::load(&FsModelRepo::new(cfg))?;
    let schema = resolve_schema(cfg.profile.as_deref(), &adapter, &cfg.schemas)?;
    info!(profile = schema.name(), version = schema.version(), "feature schema bound");
    Ok(Predictor::new(adapter, schema))
}

/// Predict every record, in input order.
pub fn predict_all(predictor: &Predictor, records: &[TripRecord]) -> ReimburseResult<Vec<f64>> {
    predictor.predict_all(records)
}

/// A prediction as it appears in output: exactly two decimals.
pub fn format_prediction(value: f64) -> String {
    format!("{value:.2}")
}

/// Write one line per prediction, no header, input order.
pub fn write_predictions<W: Write>(sink: &mut W, predictions: &[f64]) -> std::io::Result<()> {
    for value in predictions {
        writeln!(sink, "{}", format_prediction(*value))?;
    }
    sink.flush()
}

/// Write predictions to a file, replacing its contents.
pub fn write_predictions_to(path: &Path, predictions: &[f64]) -> ReimburseResult<()> {
    let file = std::fs::File::create(path).map_err(|err| ReimburseError::io(path, err))?;
    let mut sink = std::io::BufWriter::new(file);
    write_predictions(&mut sink, predictions).map_err(|err| ReimburseError::io(path, err))?;
    info!(path = %path.display(), lines = predictions.len(), "predictions written");
    Ok(())
}
