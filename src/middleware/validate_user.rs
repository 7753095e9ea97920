use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::services::ServiceError;
use crate::state::AppState;

/// User loaded from the database for the token's subject.
#[derive(Clone, Debug)]
pub struct ValidatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Rejects tokens whose user has since been deleted.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_user = match request.extensions().get::<AuthUser>() {
        Some(auth_user) => auth_user.clone(),
        None => {
            return ApiError::unauthorized("JWT authentication required before user validation")
                .into_response()
        }
    };

    let user = match state.services.users.get(auth_user.user_id).await {
        Ok(user) => user,
        Err(ServiceError::NotFound(_)) => {
            tracing::warn!("User validation failed: user {} no longer exists", auth_user.user_id);
            return ApiError::unauthorized("User no longer exists").into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    tracing::debug!("User validation successful: {} ({})", user.email, user.id);

    request.extensions_mut().insert(ValidatedUser {
        id: user.id,
        email: user.email,
        name: user.name,
    });
    next.run(request).await
}
