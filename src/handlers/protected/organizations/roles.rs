use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use uuid::Uuid;

use super::super::utils::authorize;
use crate::database::models::{Permission, Role};
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::services::role_service::{CreateRole, UpdateRole};
use crate::state::AppState;

/// GET /api/organizations/:org/roles - system roles first, then the organization's own
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Vec<Role>> {
    authorize(&state, organization_id, user.id, Permission::RolesRead).await?;
    let roles = state.services.roles.list(organization_id).await?;
    Ok(ApiResponse::success(roles))
}

/// POST /api/organizations/:org/roles
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
    payload: Result<Json<CreateRole>, JsonRejection>,
) -> ApiResult<Role> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, Permission::RolesCreate).await?;
    let role = state.services.roles.create(organization_id, input).await?;
    Ok(ApiResponse::created(role))
}

/// GET /api/organizations/:org/roles/:role
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, role_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Role> {
    authorize(&state, organization_id, user.id, Permission::RolesRead).await?;
    let role = state.services.roles.get(organization_id, role_id).await?;
    Ok(ApiResponse::success(role))
}

/// PATCH /api/organizations/:org/roles/:role - system roles answer 403
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, role_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<UpdateRole>, JsonRejection>,
) -> ApiResult<Role> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, Permission::RolesUpdate).await?;
    let role = state.services.roles.update(organization_id, role_id, input).await?;
    Ok(ApiResponse::success(role))
}

/// DELETE /api/organizations/:org/roles/:role - members fall back to `default`
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, role_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    authorize(&state, organization_id, user.id, Permission::RolesDelete).await?;
    state.services.roles.delete(organization_id, role_id).await?;
    Ok(ApiResponse::no_content())
}
