//! Immutability validation policy.
//!
//! Update only: never run on CREATE (no prior state) or DELETE.
//!
//! Validates:
//! - `spec.model.memory` cannot be changed after creation

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::crd::TrainedModel;
use crate::quantity::semantically_equal;
use crate::webhooks::error::ValidationError;

/// Whether the memory reservation is unchanged between two versions.
///
/// Compares the amounts, not the text: `2Gi` and `2048Mi` are unchanged.
pub fn memory_unchanged(old: &Quantity, new: &Quantity) -> bool {
    semantically_equal(old, new)
}

/// Validate that an update leaves the memory reservation untouched
pub fn validate(new: &TrainedModel, old: &TrainedModel) -> Result<(), ValidationError> {
    let old_memory = &old.spec.model.memory;
    let new_memory = &new.spec.model.memory;

    if !memory_unchanged(old_memory, new_memory) {
        return Err(ValidationError::ImmutableFieldViolation {
            name: new.name_or_empty().to_string(),
            old: old_memory.0.clone(),
            new: new_memory.0.clone(),
        });
    }

    Ok(())
}
