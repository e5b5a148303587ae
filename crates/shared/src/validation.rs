//! Common validation utilities.

use validator::ValidationError;

use crate::password::MIN_PASSWORD_LENGTH;

/// Validates that a value contains something other than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field is required".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates the minimum password length.
pub fn validate_password_length(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() >= MIN_PASSWORD_LENGTH {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_length");
        err.message = Some(
            format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )
            .into(),
        );
        Err(err)
    }
}

/// Normalizes an optional list filter.
///
/// Empty values and the literal `all` mean "no filter" and map to `None`, so
/// callers omit the predicate instead of matching everything with a wildcard.
pub fn normalize_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

/// Wraps a search term for a substring `ILIKE` match, escaping wildcards.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
