//! Input validation for natural keys and CLI arguments.
//!
//! Arguments are handed to the tool as an argv array, never through a shell,
//! so the checks here guard against values the tool itself would misread
//! (flag-looking values, embedded NULs, control characters).

use crate::{Result, VaultorgError};

/// Maximum allowed length for names, emails, titles and ids.
const MAX_NAME_LENGTH: usize = 255;

/// Validates a natural key or id before it reaches a backend.
///
/// `kind` names the value in the error message (e.g. "vault name").
///
/// # Errors
///
/// Returns [`VaultorgError::InvalidName`] if validation fails.
///
/// # Example
///
/// ```
/// use vaultorg::validation::validate_name;
///
/// assert!(validate_name("vault name", "team-secrets").is_ok());
/// assert!(validate_name("user email", "alice@example.com").is_ok());
/// assert!(validate_name("item title", "Prod DB (primary)").is_ok());
///
/// assert!(validate_name("vault name", "").is_err());
/// assert!(validate_name("vault name", "--format").is_err());
/// ```
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(VaultorgError::InvalidName(format!("{} cannot be empty", kind)));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(VaultorgError::InvalidName(format!(
            "{} exceeds maximum length of {} characters",
            kind, MAX_NAME_LENGTH
        )));
    }

    if name.contains('\0') {
        return Err(VaultorgError::InvalidName(format!(
            "{} contains null byte",
            kind
        )));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(VaultorgError::InvalidName(format!(
            "{} contains control characters",
            kind
        )));
    }

    if name.starts_with('-') {
        return Err(VaultorgError::InvalidName(format!(
            "{} cannot start with '-'",
            kind
        )));
    }

    Ok(())
}

/// Validates a free-form value passed as a flag argument (descriptions,
/// field values). Empty values are allowed.
pub fn validate_value(kind: &str, value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(VaultorgError::InvalidName(format!(
            "{} contains null byte",
            kind
        )));
    }
    Ok(())
}
