//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_USER_ID_LEN: usize = 128;

/// Validates that a player identifier is usable as a storage key.
///
/// Identifiers are 1 to 128 characters among ASCII letters, digits and `-_.@`.
///
/// # Examples
///
/// ```ignore
/// validate_user_id("user-42")      // Ok
/// validate_user_id("user 42")      // Err - whitespace
/// validate_user_id("a::b")         // Err - separator
/// ```
pub fn validate_user_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_USER_ID_LEN {
        let mut err = ValidationError::new("user_id_length");
        err.message = Some(
            format!(
                "User ID must be between 1 and {MAX_USER_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
    {
        let mut err = ValidationError::new("user_id_format");
        err.message =
            Some("User ID may only contain ASCII letters, digits and `-`, `_`, `.`, `@`".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a text field holds something other than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}
