//! Input checks shared by the services. They run before any transaction opens.

use super::error::{ServiceError, ServiceResult};

pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const PASSWORD_MIN: usize = 8;
/// bcrypt ignores input past 72 bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;
pub const EMAIL_MAX: usize = 254;

/// Trimmed name of 1 to [`NAME_MAX`] characters.
pub fn name(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::field(field, "must not be empty"));
    }
    if trimmed.chars().count() > NAME_MAX {
        return Err(ServiceError::field(field, format!("must be at most {} characters", NAME_MAX)));
    }
    Ok(trimmed.to_string())
}

/// Blank descriptions are stored as `None`.
pub fn description(value: Option<String>) -> ServiceResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > DESCRIPTION_MAX {
        return Err(ServiceError::field(
            "description",
            format!("must be at most {} characters", DESCRIPTION_MAX),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Structural check only: one `@`, non-empty local part, dotted domain.
pub fn email(value: &str) -> ServiceResult<String> {
    let normalized = crate::database::models::user::normalize_email(value);
    let invalid = || ServiceError::field("email", "must be a valid email address");

    if normalized.len() > EMAIL_MAX || normalized.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = normalized.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(normalized)
}

pub fn password(value: &str) -> ServiceResult<()> {
    let len = value.chars().count();
    if len < PASSWORD_MIN {
        return Err(ServiceError::field(
            "password",
            format!("must be at least {} characters", PASSWORD_MIN),
        ));
    }
    if value.len() > PASSWORD_MAX_BYTES {
        return Err(ServiceError::field(
            "password",
            format!("must be at most {} bytes", PASSWORD_MAX_BYTES),
        ));
    }
    Ok(())
}
