//! Common validation utilities for participant emails.

use validator::{ValidateEmail, ValidationError};

/// Normalizes an email for storage and comparison: trims whitespace and lowercases.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns true when the (already normalized) email matches the address grammar.
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email.validate_email()
}

/// Validator hook for request fields: checks the address as it will be stored.
pub fn validate_participant_email(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(&normalize_email(email)) {
        Ok(())
    } else {
        let mut err = ValidationError::new("email");
        err.message = Some("Invalid email format".into());
        Err(err)
    }
}

/// Returns the local part of an email address (the text before `@`).
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Trims an optional text field, mapping blank values to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
