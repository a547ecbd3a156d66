//! Custom Resource Definitions (CRDs) handled by the webhook.
//!
//! - `TrainedModel`: a model artifact served by a parent InferenceService

mod trained_model;

pub use trained_model::*;
