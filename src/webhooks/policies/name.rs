//! TrainedModel name format policy.
//!
//! Validates:
//! - `metadata.name` consists only of alphanumerics, '_' or '-'

use std::sync::LazyLock;

use regex::Regex;

use crate::crd::TrainedModel;
use crate::webhooks::error::ValidationError;

/// Character class allowed in a TrainedModel name
pub const TM_NAME_FMT: &str = "[a-zA-Z0-9_-]+";

/// Anchored form of [`TM_NAME_FMT`], as reported in error messages
pub const TM_NAME_PATTERN: &str = "^[a-zA-Z0-9_-]+$";

static TM_NAME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(TM_NAME_PATTERN).ok());

/// Check a name against [`TM_NAME_PATTERN`] (full match)
pub fn is_valid_name(name: &str) -> bool {
    TM_NAME_RE.as_ref().is_some_and(|re| re.is_match(name))
}

/// Validate the TrainedModel's name
pub fn validate(tm: &TrainedModel) -> Result<(), ValidationError> {
    let name = tm.name_or_empty();
    if !is_valid_name(name) {
        return Err(ValidationError::NameFormat {
            name: name.to_string(),
            pattern: TM_NAME_PATTERN.to_string(),
        });
    }
    Ok(())
}
