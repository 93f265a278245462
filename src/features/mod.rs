//! Feature derivation: schema contract, named profiles and the deriver.

pub mod domain;
pub mod profiles;
pub mod service;

pub use domain::{
    Feature, FeatureSchema, FeatureVector, InteractionSource, MileageTiers, SchemaSpec,
};
pub use service::{derive, derive_all};
