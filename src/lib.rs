// lib.rs - central orchestrator
pub mod api;
pub mod common;
pub mod data;
pub mod evaluation;
pub mod features;
pub mod inference;
pub mod model;

pub use common::{AppCfg, ErrorCode, ReimburseError, ReimburseResult};
pub use data::TripRecord;
pub use features::{derive, FeatureSchema, FeatureVector};
pub use inference::Predictor;
pub use model::ModelAdapter;
