//! ID generation utilities.

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Generates a new variable identifier.
///
/// UUID v7 strings are time-sortable and never contain braces, so they are
/// always valid inside a marker.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Checks that `id` can be written inside a `{{type:id}}` marker.
///
/// # Errors
///
/// Returns [`DomainError::InvalidIdentifier`] if the id is empty or contains
/// `{` or `}`.
pub fn validate_id(id: &str) -> DomainResult<()> {
    if id.is_empty() || id.contains(['{', '}']) {
        return Err(DomainError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}
