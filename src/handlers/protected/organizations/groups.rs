//! Workspace, team and project routes. The handlers are generic over the
//! group kind; the router instantiates them per kind, e.g.
//! `get(groups::list::<Team>)`. Only creation differs per kind.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::super::utils::authorize;
use crate::database::models::{Group, GroupAction, GroupMember, Project, Team, Workspace};
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::services::group_service::{CreateGroup, CreateProject, UpdateGroup};
use crate::services::GroupServices;
use crate::state::AppState;
use crate::types::{ListParams, Paged};

#[derive(Debug, Deserialize)]
pub struct AddMember {
    pub user_id: Uuid,
}

/// GET /api/organizations/:org/<kind>
pub async fn list<G: GroupServices>(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> ApiResult<Paged<G>> {
    authorize(&state, organization_id, user.id, G::permission(GroupAction::Read)).await?;
    let page = G::service(&state.services).list(organization_id, &params).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/organizations/:org/<kind>/:id
pub async fn get<G: GroupServices>(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<G> {
    authorize(&state, organization_id, user.id, G::permission(GroupAction::Read)).await?;
    let group = G::service(&state.services).get(organization_id, id).await?;
    Ok(ApiResponse::success(group))
}

/// PATCH /api/organizations/:org/<kind>/:id
pub async fn patch<G: GroupServices>(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<UpdateGroup>, JsonRejection>,
) -> ApiResult<G> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, G::permission(GroupAction::Update)).await?;
    let group = G::service(&state.services).update(organization_id, id, input).await?;
    Ok(ApiResponse::success(group))
}

/// DELETE /api/organizations/:org/<kind>/:id
pub async fn delete<G: GroupServices>(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    authorize(&state, organization_id, user.id, G::permission(GroupAction::Delete)).await?;
    G::service(&state.services).delete(organization_id, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/organizations/:org/<kind>/:id/members
pub async fn members_list<G: GroupServices>(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Vec<GroupMember>> {
    authorize(&state, organization_id, user.id, G::permission(GroupAction::Read)).await?;
    let members = G::service(&state.services).list_members(organization_id, id).await?;
    Ok(ApiResponse::success(members))
}

/// POST /api/organizations/:org/<kind>/:id/members
pub async fn members_post<G: GroupServices>(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<AddMember>, JsonRejection>,
) -> ApiResult<GroupMember> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, G::permission(GroupAction::Members)).await?;
    let member = G::service(&state.services)
        .add_member(organization_id, id, input.user_id)
        .await?;
    Ok(ApiResponse::created(member))
}

/// DELETE /api/organizations/:org/<kind>/:id/members/:user
pub async fn members_delete<G: GroupServices>(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path((organization_id, id, member_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<()> {
    authorize(&state, organization_id, user.id, G::permission(GroupAction::Members)).await?;
    G::service(&state.services)
        .remove_member(organization_id, id, member_id)
        .await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/organizations/:org/workspaces
pub async fn workspace_post(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
    payload: Result<Json<CreateGroup>, JsonRejection>,
) -> ApiResult<Workspace> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, Workspace::permission(GroupAction::Create)).await?;
    let workspace = state.services.workspaces.create(organization_id, input).await?;
    Ok(ApiResponse::created(workspace))
}

/// POST /api/organizations/:org/teams
pub async fn team_post(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
    payload: Result<Json<CreateGroup>, JsonRejection>,
) -> ApiResult<Team> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, Team::permission(GroupAction::Create)).await?;
    let team = state.services.teams.create(organization_id, input).await?;
    Ok(ApiResponse::created(team))
}

/// POST /api/organizations/:org/projects - `workspace_id` is optional
pub async fn project_post(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(organization_id): Path<Uuid>,
    payload: Result<Json<CreateProject>, JsonRejection>,
) -> ApiResult<Project> {
    let Json(input) = payload?;
    authorize(&state, organization_id, user.id, Project::permission(GroupAction::Create)).await?;
    let project = state.services.projects.create(organization_id, input).await?;
    Ok(ApiResponse::created(project))
}
