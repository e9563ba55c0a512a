//! Request validation - format-only checks on incoming payloads.
//!
//! Request types derive [`validator::Validate`]; this module turns the
//! validator output into a flat, serialisable list of field errors.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::constants::{PHONE_PATTERN, USERNAME_PATTERN};

pub(crate) static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(USERNAME_PATTERN).expect("username pattern is a valid regex"));

pub(crate) static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(PHONE_PATTERN).expect("phone pattern is a valid regex"));

/// Passwords must mix at least one ASCII letter with at least one digit.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength")
            .with_message(Cow::Borrowed("must contain at least one letter and one digit")))
    }
}

/// Phone numbers are optional; an empty string clears the stored number.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() {
        return Ok(());
    }
    if !(10..=20).contains(&phone.chars().count()) {
        return Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("must be between 10 and 20 characters")));
    }
    if !PHONE_REGEX.is_match(phone) {
        return Err(ValidationError::new("phone_format").with_message(Cow::Borrowed(
            "may only contain digits, spaces, '-' and a leading '+'",
        )));
    }
    Ok(())
}

/// A single rejected field with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a request, returning every failing field.
///
/// Errors are sorted by field name so callers get a stable order.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), Vec<FieldError>> {
    request
        .validate()
        .map_err(|errors| collect_field_errors(&errors))
}

/// Flatten validator errors into [`FieldError`]s
pub fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut collected: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                FieldError::new(field.to_string(), message)
            })
        })
        .collect();

    collected.sort_by(|a, b| a.field.cmp(&b.field));
    collected
}

/// Render field errors as a single line
pub fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}
