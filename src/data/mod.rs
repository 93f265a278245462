//! Data domain: trip records, case files and their validation.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{CaseRepo, LabeledCase, SkippedCase, TripRecord};
pub use repo_fs::FsCaseRepo;
pub use service::CaseBatch;
