//! Validation policies for TrainedModel admission webhooks.
//!
//! Policies run in a fixed order and the first failure wins:
//! 1. Name format
//! 2. Storage URI protocol
//! 3. Parent InferenceService reference (live Service listing)
//! 4. Memory immutability (UPDATE only)

pub mod immutability;
pub mod name;
pub mod reference;
pub mod storage_uri;

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::client::ServiceLister;
use crate::config::WebhookConfig;
use crate::crd::TrainedModel;
use crate::health::HealthState;
use crate::webhooks::error::ValidationError;

/// Outcome of an admission check: accepted, or the first violated rule
pub type ValidationResult = Result<(), ValidationError>;

/// Runs the TrainedModel policies for each admission operation.
///
/// Holds no per-request state; one instance is shared by all requests.
#[derive(Clone)]
pub struct TrainedModelValidator {
    config: Arc<WebhookConfig>,
    services: Arc<dyn ServiceLister>,
    health_state: Option<Arc<HealthState>>,
}

impl TrainedModelValidator {
    /// Create a validator over an immutable config and a Service lister
    pub fn new(config: Arc<WebhookConfig>, services: Arc<dyn ServiceLister>) -> Self {
        Self {
            config,
            services,
            health_state: None,
        }
    }

    /// Record lookup latency into the given health state's metrics
    pub fn with_health_state(mut self, health_state: Arc<HealthState>) -> Self {
        self.health_state = Some(health_state);
        self
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Validate a new TrainedModel
    pub async fn validate_create(&self, tm: &TrainedModel) -> ValidationResult {
        info!(
            name = %tm.name_or_empty(),
            namespace = ?tm.metadata.namespace,
            "validate create"
        );
        self.validate_trained_model(tm).await
    }

    /// Validate an update of `old` into `new`
    pub async fn validate_update(&self, new: &TrainedModel, old: &TrainedModel) -> ValidationResult {
        info!(
            name = %new.name_or_empty(),
            namespace = ?new.metadata.namespace,
            "validate update"
        );
        self.validate_trained_model(new).await?;
        immutability::validate(new, old)
    }

    /// Deletion is always allowed
    pub fn validate_delete(&self, old: &TrainedModel) -> ValidationResult {
        info!(
            name = %old.name_or_empty(),
            namespace = ?old.metadata.namespace,
            "validate delete"
        );
        Ok(())
    }

    /// Checks shared by CREATE and UPDATE, in order
    async fn validate_trained_model(&self, tm: &TrainedModel) -> ValidationResult {
        name::validate(tm)?;
        storage_uri::validate(tm, &self.config)?;

        // Without a namespace the rule fails before any listing is issued
        let lists_services = tm.metadata.namespace.is_some();
        let start = Instant::now();
        let result =
            reference::validate(tm, self.services.as_ref(), self.config.lookup_timeout).await;
        if let Some(state) = self.health_state.as_ref().filter(|_| lists_services) {
            state
                .metrics
                .record_lookup(start.elapsed().as_secs_f64());
        }
        result
    }
}
