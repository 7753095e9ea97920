// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, Claims};
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: User,
}

/// POST /auth/login - exchange credentials for a JWT
///
/// Unknown email and wrong password both answer 401 with the same message.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(input) = payload?;
    let user = state.services.users.authenticate(&input.email, &input.password).await?;

    let claims = Claims::new(user.id, &user.email);
    let token = generate_jwt(&claims)?;
    tracing::info!(user_id = %user.id, "issued token");

    Ok(ApiResponse::success(LoginResponse {
        token,
        expires_at: claims.exp,
        user,
    }))
}
