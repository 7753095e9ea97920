use axum::{
    extract::{Path, State},
    Extension,
};
use uuid::Uuid;

use crate::database::models::OrganizationUser;
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::services::member_service::PendingInvitation;
use crate::state::AppState;

/// GET /api/invitations - the caller's open invitations
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
) -> ApiResult<Vec<PendingInvitation>> {
    let pending = state.services.members.pending_for_user(user.id).await?;
    Ok(ApiResponse::success(pending))
}

/// POST /api/invitations/:org/accept
pub async fn accept(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<OrganizationUser> {
    let membership = state.services.members.accept(organization_id, user.id).await?;
    Ok(ApiResponse::success(membership))
}

/// POST /api/invitations/:org/refuse
pub async fn refuse(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<OrganizationUser> {
    let membership = state.services.members.refuse(organization_id, user.id).await?;
    Ok(ApiResponse::success(membership))
}
