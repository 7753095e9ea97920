use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use super::super::utils::authorize;
use crate::database::models::{Organization, Permission};
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::services::organization_service::{CreateOrganization, UpdateOrganization};
use crate::state::AppState;
use crate::types::{ListParams, Paged};

/// GET /api/organizations - organizations the caller is an active member of
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Query(params): Query<ListParams>,
) -> ApiResult<Paged<Organization>> {
    let page = state.services.organizations.list_for_user(user.id, &params).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/organizations - the caller becomes its first admin
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    payload: Result<Json<CreateOrganization>, JsonRejection>,
) -> ApiResult<Organization> {
    let Json(input) = payload?;
    let organization = state.services.organizations.create(user.id, input).await?;
    Ok(ApiResponse::created(organization))
}

/// GET /api/organizations/:org
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Organization> {
    authorize(&state, organization_id, user.id, Permission::OrganizationsRead).await?;
    let organization = state.services.organizations.get(organization_id).await?;
    Ok(ApiResponse::success(organization))
}

/// PATCH /api/organizations/:org - renaming also changes the slug
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
    payload: Result<Json<UpdateOrganization>, JsonRejection>,
) -> ApiResult<Organization> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, Permission::OrganizationsUpdate).await?;
    let organization = state.services.organizations.update(organization_id, input).await?;
    Ok(ApiResponse::success(organization))
}

/// DELETE /api/organizations/:org - removes roles, memberships and groups with it
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<()> {
    authorize(&state, organization_id, user.id, Permission::OrganizationsDelete).await?;
    state.services.organizations.delete(organization_id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/organizations/:org/permissions - the caller's effective permissions
pub async fn permissions(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Vec<String>> {
    let granted = state
        .services
        .access
        .effective_permissions(organization_id, user.id)
        .await?;
    Ok(ApiResponse::success(granted.slugs()))
}
