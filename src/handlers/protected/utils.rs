use uuid::Uuid;

use crate::database::models::{OrganizationUser, Permission};
use crate::error::ApiError;
use crate::state::AppState;

/// Caller must be an active member of `organization_id` whose role grants
/// `permission`.
pub async fn authorize(
    state: &AppState,
    organization_id: Uuid,
    user_id: Uuid,
    permission: Permission,
) -> Result<OrganizationUser, ApiError> {
    Ok(state
        .services
        .access
        .user_must_have_permission(organization_id, user_id, permission)
        .await?)
}
