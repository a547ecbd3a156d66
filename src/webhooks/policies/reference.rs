//! InferenceService reference policy.
//!
//! Validates:
//! - the parent InferenceService named in `spec.inferenceService` has a
//!   predictor Service (`<name>-predictor*`) in the TrainedModel's namespace
//!
//! The check lists Services live on every call. A predictor created
//! concurrently with the TrainedModel may not be visible yet and will cause
//! a rejection; callers are expected to retry.

use std::time::Duration;

use tracing::debug;

use crate::client::ServiceLister;
use crate::crd::TrainedModel;
use crate::webhooks::error::{LookupError, ValidationError};

/// Suffix appended to the InferenceService name to form its predictor Service
pub const PREDICTOR_SUFFIX: &str = "-predictor";

/// Service name prefix expected for an InferenceService's predictor
pub fn predictor_prefix(inference_service: &str) -> String {
    format!("{}{}", inference_service, PREDICTOR_SUFFIX)
}

/// Whether a predictor Service for `inference_service` exists in `namespace`.
///
/// Returns `Ok(false)` for an empty namespace or when nothing matches. A
/// failed or timed-out listing is an error, never "not found".
pub async fn parent_predictor_exists(
    services: &dyn ServiceLister,
    namespace: &str,
    inference_service: &str,
    deadline: Duration,
) -> Result<bool, LookupError> {
    let prefix = predictor_prefix(inference_service);

    let names = tokio::time::timeout(deadline, services.list_service_names(namespace))
        .await
        .map_err(|_| LookupError::Timeout(deadline))??;

    let found = names.iter().any(|name| name.starts_with(&prefix));
    debug!(
        namespace = %namespace,
        prefix = %prefix,
        services = names.len(),
        found,
        "Resolved predictor reference"
    );

    Ok(found)
}

/// Validate that the TrainedModel's parent InferenceService exists
pub async fn validate(
    tm: &TrainedModel,
    services: &dyn ServiceLister,
    deadline: Duration,
) -> Result<(), ValidationError> {
    let inference_service = &tm.spec.inference_service;

    let Some(namespace) = tm.metadata.namespace.as_deref() else {
        return Err(ValidationError::ReferenceLookup {
            inference_service: inference_service.clone(),
            source: LookupError::MissingNamespace,
        });
    };

    match parent_predictor_exists(services, namespace, inference_service, deadline).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ValidationError::ReferenceNotFound {
            inference_service: inference_service.clone(),
            name: tm.name_or_empty().to_string(),
        }),
        Err(source) => Err(ValidationError::ReferenceLookup {
            inference_service: inference_service.clone(),
            source,
        }),
    }
}
