use crate::{ContentError, ContentResult};

pub const MAX_NAME_LEN: usize = 64;

/// Validate a namespace, definition name, network name or version.
///
/// 1-64 characters of `[A-Za-z0-9._-]`, starting and ending alphanumeric.
pub fn validate_name(field: &str, value: &str) -> ContentResult<()> {
    let invalid = |reason: &str| ContentError::InvalidName {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(invalid("must be at most 64 characters"));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(invalid(&format!("character '{}' is not allowed", bad)));
    }

    let starts_ok = value.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = value.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok {
        return Err(invalid("must start and end with a letter or digit"));
    }
    Ok(())
}
