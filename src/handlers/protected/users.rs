use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::services::user_service::UpdateProfile;
use crate::state::AppState;

/// PATCH /api/users/me - change name and/or password
pub async fn me_patch(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    payload: Result<Json<UpdateProfile>, JsonRejection>,
) -> ApiResult<User> {
    let Json(input) = payload?;
    let updated = state.services.users.update_profile(user.id, input).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/users/me - delete the account and every membership
///
/// Refused with 409 while the caller is the last admin of an organization.
pub async fn me_delete(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
) -> ApiResult<()> {
    state.services.users.delete(user.id).await?;
    Ok(ApiResponse::no_content())
}
