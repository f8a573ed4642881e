use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Trim a required short text field and check it is 1..=`max` characters.
pub fn validate_name(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Check an optional free-text field is at most `max` characters.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// An absolute http(s) URL of at most 500 characters.
pub fn validate_link(field: &str, link: &str) -> Result<(), AppError> {
    let link = link.trim();
    if link.len() > 500 || !(link.starts_with("http://") || link.starts_with("https://")) {
        return Err(AppError::Validation(format!(
            "{field} must be an http(s) URL of at most 500 characters"
        )));
    }
    Ok(())
}

/// Reject duplicate IDs in a set-valued field.
pub fn validate_unique_ids(ids: &[i32], name: &str) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for &id in ids {
        if !seen.insert(id) {
            return Err(AppError::Validation(format!("Duplicate {name} ID: {id}")));
        }
    }
    Ok(())
}
