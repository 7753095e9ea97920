use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orgkit_api::config::{self, AppConfig};
use orgkit_api::database::models::{Project, Team, Workspace};
use orgkit_api::database::{Database, DatabaseManager, PgDatabase};
use orgkit_api::handlers::{protected, public};
use orgkit_api::middleware::{jwt_auth_middleware, validate_user_middleware};
use orgkit_api::services::GroupServices;
use orgkit_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    info!("Starting orgkit-api in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set outside development");
    }
    if orgkit_api::is_development!() && std::env::var("SECURITY_JWT_SECRET").is_err() {
        warn!("Using the built-in development JWT secret");
    }

    let pool = DatabaseManager::connect().await?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }

    let db: Arc<dyn Database> = Arc::new(PgDatabase::new(pool));
    let app = app(AppState::new(db), config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("orgkit-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState, config: &AppConfig) -> Router {
    let protected = Router::new()
        .merge(account_routes())
        .merge(organization_routes())
        .merge(group_routes::<Workspace>("workspaces", post(protected::organizations::groups::workspace_post)))
        .merge(group_routes::<Team>("teams", post(protected::organizations::groups::team_post)))
        .merge(group_routes::<Project>("projects", post(protected::organizations::groups::project_post)))
        // Layers run bottom-up: the token is checked before the user is loaded
        .route_layer(middleware::from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(middleware::from_fn(jwt_auth_middleware));

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/register", post(public::auth::register_post))
        .route("/auth/login", post(public::auth::login_post))
        // Protected API
        .merge(protected)
        // Global middleware
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(cors_layer(config));

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn account_routes() -> Router<AppState> {
    use axum::routing::patch;
    use protected::{auth, invitations, permissions, users};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/users/me", patch(users::me_patch).delete(users::me_delete))
        .route("/api/invitations", get(invitations::list))
        .route("/api/invitations/:org/accept", post(invitations::accept))
        .route("/api/invitations/:org/refuse", post(invitations::refuse))
        .route("/api/permissions", get(permissions::catalog))
}

fn organization_routes() -> Router<AppState> {
    use axum::routing::patch;
    use protected::organizations::{self as orgs, members, roles};

    Router::new()
        .route("/api/organizations", get(orgs::organization_list).post(orgs::organization_post))
        .route(
            "/api/organizations/:org",
            get(orgs::organization_get)
                .patch(orgs::organization_patch)
                .delete(orgs::organization_delete),
        )
        .route("/api/organizations/:org/permissions", get(orgs::organization_permissions))
        // Membership
        .route("/api/organizations/:org/members", get(members::list).post(members::invite))
        .route(
            "/api/organizations/:org/members/:user",
            patch(members::patch).delete(members::delete),
        )
        // Roles
        .route("/api/organizations/:org/roles", get(roles::list).post(roles::post))
        .route(
            "/api/organizations/:org/roles/:role",
            get(roles::get).patch(roles::patch).delete(roles::delete),
        )
}

/// Collection, item and member routes for one group kind.
fn group_routes<G: GroupServices>(
    kind: &str,
    create: axum::routing::MethodRouter<AppState>,
) -> Router<AppState> {
    use protected::organizations::groups;

    Router::new()
        .route(&format!("/api/organizations/:org/{}", kind), create.get(groups::list::<G>))
        .route(
            &format!("/api/organizations/:org/{}/:id", kind),
            get(groups::get::<G>).patch(groups::patch::<G>).delete(groups::delete::<G>),
        )
        .route(
            &format!("/api/organizations/:org/{}/:id/members", kind),
            get(groups::members_list::<G>).post(groups::members_post::<G>),
        )
        .route(
            &format!("/api/organizations/:org/{}/:id/members/:user", kind),
            axum::routing::delete(groups::members_delete::<G>),
        )
}

/// Development accepts any origin; other environments use the configured list.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if orgkit_api::is_development!() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
