//! trainedmodel-webhook library crate
//!
//! Admission validation for KServe `TrainedModel` resources: the CRD type,
//! the validation policies, and the webhook and health servers.

pub mod client;
pub mod config;
pub mod crd;
pub mod health;
pub mod quantity;
pub mod storage;
pub mod webhooks;

pub use client::{KubeServiceLister, ServiceLister};
pub use config::{ConfigError, WebhookConfig};
pub use health::HealthState;
pub use webhooks::{
    TrainedModelValidator, VALIDATE_PATH, ValidationError, WebhookError, WebhookState,
    run_webhook_server,
};
