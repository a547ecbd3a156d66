//! Storage URI protocol policy.
//!
//! Validates:
//! - `spec.model.storageUri` starts with one of the configured protocol prefixes

use crate::config::WebhookConfig;
use crate::crd::TrainedModel;
use crate::webhooks::error::ValidationError;

/// Whether `uri` starts with any of `allowed`.
///
/// Case-sensitive prefix match with no URI parsing. An empty allow-list
/// accepts nothing.
pub fn is_prefix_supported(uri: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|prefix| uri.starts_with(prefix.as_str()))
}

/// Validate the TrainedModel's storage URI against the configured protocols
pub fn validate(tm: &TrainedModel, config: &WebhookConfig) -> Result<(), ValidationError> {
    let uri = &tm.spec.model.storage_uri;
    if !is_prefix_supported(uri, &config.storage_uri_protocols) {
        return Err(ValidationError::StorageUriFormat {
            name: tm.name_or_empty().to_string(),
            protocols: config.protocols_display(),
            uri: uri.clone(),
        });
    }
    Ok(())
}
