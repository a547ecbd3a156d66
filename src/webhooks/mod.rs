//! Webhook module for validating TrainedModel admission requests.
//!
//! Rules run in declared order and the first failure rejects the request:
//! - Format: name pattern, storage URI protocol
//! - Reference: parent InferenceService predictor exists
//! - Update: memory is immutable

pub mod error;
pub mod policies;
mod server;

pub use error::{LookupError, ValidationError};
pub use policies::{TrainedModelValidator, ValidationResult};
pub use server::{VALIDATE_PATH, WebhookError, WebhookState, create_webhook_router, run_webhook_server};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
