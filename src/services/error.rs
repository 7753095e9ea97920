use std::collections::HashMap;
use thiserror::Error;

use crate::database::models::MembershipError;
use crate::database::DatabaseError;

/// Business-rule failures raised by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    /// The resource existed but is no longer usable (expired invitation).
    #[error("{0}")]
    Gone(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Database(DatabaseError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }

    pub fn field(field: &str, problem: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), problem.into());
        ServiceError::Validation {
            message: "Validation failed".to_string(),
            field_errors,
        }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            DatabaseError::UniqueViolation(constraint) => {
                ServiceError::Conflict(conflict_message(&constraint).to_string())
            }
            other => ServiceError::Database(other),
        }
    }
}

impl From<MembershipError> for ServiceError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::InvalidTransition { .. } => ServiceError::Conflict(err.to_string()),
            MembershipError::InvitationExpired => ServiceError::Gone("Invitation has expired".to_string()),
        }
    }
}

/// Client-facing message for a unique constraint name from the schema.
fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        "users_email_key" => "Email is already registered",
        "organizations_slug_key" => "An organization with this name already exists",
        "roles_organization_name_key" => "A role with this name already exists",
        "organization_users_organization_user_key" => "User is already a member of this organization",
        c if c.ends_with("_users_pkey") => "User is already a member",
        _ => "Resource already exists",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_become_conflicts() {
        let err = ServiceError::from(DatabaseError::UniqueViolation("users_email_key".into()));
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Email is already registered"));

        let err = ServiceError::from(DatabaseError::UniqueViolation("team_users_pkey".into()));
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "User is already a member"));
    }

    #[test]
    fn expired_invitation_is_gone() {
        assert!(matches!(
            ServiceError::from(MembershipError::InvitationExpired),
            ServiceError::Gone(_)
        ));
    }
}
