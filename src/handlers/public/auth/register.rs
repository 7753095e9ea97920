// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::RegisterUser;
use crate::state::AppState;

/// POST /auth/register - create an account
///
/// Input: `{ "email", "name", "password" }`. Returns the new user (201);
/// 409 when the email is already registered.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> ApiResult<User> {
    let Json(input) = payload?;
    let user = state.services.users.register(input).await?;
    Ok(ApiResponse::created(user))
}
