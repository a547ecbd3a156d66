//! Error types for TrainedModel admission.
//!
//! Every rule yields at most one `ValidationError`; the first one raised
//! rejects the request and its message is returned to the requester.

use std::time::Duration;

use thiserror::Error;

/// Failure of the InferenceService reference lookup itself.
///
/// Distinct from "not found": a lookup error means the webhook could not
/// determine whether the parent exists.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Kubernetes API error (credentials, connectivity, RBAC, server error)
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The lookup did not complete within the configured deadline
    #[error("service lookup timed out after {0:?}")]
    Timeout(Duration),

    /// Neither the object nor the admission request carried a namespace
    #[error("no namespace available for service lookup")]
    MissingNamespace,
}

/// A rejected TrainedModel.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The name contains characters outside `[A-Za-z0-9_-]`
    #[error(
        "the Trained Model \"{name}\" is invalid: a Trained Model name must consist of alphanumeric characters, '_', or '-'. (e.g. \"my-Name\" or \"abc_123\", regex used for validation is '{pattern}')"
    )]
    NameFormat { name: String, pattern: String },

    /// The storage URI does not start with an allowed protocol
    #[error(
        "the Trained Model \"{name}\" storageUri field is invalid. The storage uri must start with one of the prefixes: {protocols}. (the storage uri given is \"{uri}\")"
    )]
    StorageUriFormat {
        name: String,
        protocols: String,
        uri: String,
    },

    /// No `<inferenceService>-predictor*` Service exists in the namespace
    #[error(
        "the inferenceservice \"{inference_service}\" specified in the Trained Model \"{name}\" does not exist."
    )]
    ReferenceNotFound {
        inference_service: String,
        name: String,
    },

    /// The Service listing failed
    #[error("failed to look up inferenceservice \"{inference_service}\": {source}")]
    ReferenceLookup {
        inference_service: String,
        #[source]
        source: LookupError,
    },

    /// `spec.model.memory` changed on update
    #[error(
        "the Trained Model \"{name}\" memory field is immutable. The memory was \"{old}\" but it is updated to \"{new}\""
    )]
    ImmutableFieldViolation {
        name: String,
        old: String,
        new: String,
    },
}

impl ValidationError {
    /// Short machine-readable reason, used as the denial prefix and metric label
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::NameFormat { .. } => "InvalidName",
            ValidationError::StorageUriFormat { .. } => "InvalidStorageUri",
            ValidationError::ReferenceNotFound { .. } => "InferenceServiceNotFound",
            ValidationError::ReferenceLookup { .. } => "ReferenceLookupFailed",
            ValidationError::ImmutableFieldViolation { .. } => "ImmutableMemoryModified",
        }
    }
}
