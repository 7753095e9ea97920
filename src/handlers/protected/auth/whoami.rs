use axum::{extract::State, Extension};
use serde::Serialize;

use crate::database::models::{Organization, User};
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::state::AppState;
use crate::types::{ListParams, Paged};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    #[serde(flatten)]
    pub user: User,
    pub organizations: Paged<Organization>,
}

/// GET /api/auth/whoami - the caller's profile and the organizations they
/// are an active member of
pub async fn whoami_get(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
) -> ApiResult<WhoAmI> {
    let profile = state.services.users.get(user.id).await?;
    let organizations = state
        .services
        .organizations
        .list_for_user(user.id, &ListParams::default())
        .await?;

    Ok(ApiResponse::success(WhoAmI {
        user: profile,
        organizations,
    }))
}
