use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service banner and route overview
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "orgkit-api",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Organization, role and membership management API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami, /api/users/me (protected)",
                "invitations": "/api/invitations[/:org/accept|refuse] (protected)",
                "permissions": "/api/permissions (protected)",
                "organizations": "/api/organizations[/:org] (protected)",
                "members": "/api/organizations/:org/members[/:user] (protected)",
                "roles": "/api/organizations/:org/roles[/:role] (protected)",
                "groups": "/api/organizations/:org/{workspaces,teams,projects}[/:id[/members[/:user]]] (protected)",
            }
        }
    }))
}

/// GET /health - liveness plus database reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
