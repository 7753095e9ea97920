use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::super::utils::authorize;
use crate::database::models::{MembershipStatus, OrganizationUser, Permission};
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::services::member_service::{InviteMember, MemberView};
use crate::state::AppState;
use crate::types::{ListParams, Paged};

/// Query for the member list. `ListParams` is spelled out because
/// query strings do not survive `#[serde(flatten)]` with numeric fields.
#[derive(Debug, Default, Deserialize)]
pub struct MemberQuery {
    pub status: Option<MembershipStatus>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRole {
    pub role_id: Uuid,
}

/// GET /api/organizations/:org/members?status=invited|active|refused
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<Paged<MemberView>> {
    authorize(&state, organization_id, user.id, Permission::MembersRead).await?;
    let params = ListParams {
        limit: query.limit,
        offset: query.offset,
        search: None,
    };
    let page = state
        .services
        .members
        .list(organization_id, query.status, &params)
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/organizations/:org/members - invite a registered user by email
pub async fn invite(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
    payload: Result<Json<InviteMember>, JsonRejection>,
) -> ApiResult<OrganizationUser> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, Permission::MembersInvite).await?;
    let membership = state.services.members.invite(organization_id, user.id, input).await?;
    Ok(ApiResponse::created(membership))
}

/// PATCH /api/organizations/:org/members/:user - change the member's role
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, member_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<ChangeRole>, JsonRejection>,
) -> ApiResult<OrganizationUser> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, Permission::MembersUpdate).await?;
    let membership = state
        .services
        .members
        .change_role(organization_id, user.id, member_id, input.role_id)
        .await?;
    Ok(ApiResponse::success(membership))
}

/// DELETE /api/organizations/:org/members/:user
///
/// Members may always remove themselves; removing anyone else needs
/// `members:remove`.
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    if member_id != user.id {
        authorize(&state, organization_id, user.id, Permission::MembersRemove).await?;
    }
    state.services.members.remove(organization_id, member_id).await?;
    Ok(ApiResponse::no_content())
}
