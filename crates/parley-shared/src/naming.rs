//! Naming and normalization rules for user-facing names and emails.
//!
//! Lengths are counted in Unicode scalar values, so a name made of emoji or
//! CJK characters gets the same budget as an ASCII one.

use crate::constants::MAX_NAME_CHARS;
use crate::error::ValidationError;

/// Check a project or chat name. Over-long names are rejected, never truncated.
pub fn validate_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }

    let actual = name.chars().count();
    if actual > MAX_NAME_CHARS {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_CHARS,
            actual,
        });
    }

    Ok(())
}

/// Build a chat name from the text of its first message.
///
/// Runs of whitespace (including newlines) collapse to one space and the
/// result is cut at [`MAX_NAME_CHARS`]. Returns `None` for blank text.
pub fn derive_chat_name(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    let name: String = collapsed.chars().take(MAX_NAME_CHARS).collect();
    Some(name.trim_end().to_string())
}

/// Canonical form used for email uniqueness checks.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(trimmed.to_lowercase())
}
