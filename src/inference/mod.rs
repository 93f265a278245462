//! Inference domain: single-case and batch prediction.

pub mod domain;
pub mod service;

pub use domain::Predictor;
pub use service::{format_prediction, open_predictor, write_predictions};
