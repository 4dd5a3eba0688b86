//! iam-service: multi-tenant identity and access management.
//!
//! - Polymorphic principals (users, service accounts, groups) resolved
//!   through direct and group-mediated role assignments (§4.4).
//! - Deny-precedence, short-circuiting policy evaluation over a
//!   JSON statement grammar (§4.2).
//! - Store-authoritative, Cache-accelerated session lifecycle (§4.5).
//! - Every store access scoped to an organization by a tenant guard that
//!   cannot be bypassed by a handler forgetting to filter (§4.1).

pub mod authz;
pub mod cache;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod services;
pub mod store;
pub mod tenant;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use iam_core::error::AppError;
use iam_core::middleware::{
    create_ip_rate_limiter, create_unkeyed_rate_limiter, ip_rate_limit_middleware,
    metrics_middleware, rate_limit_middleware, request_id_middleware, security_headers_middleware,
};

use crate::cache::Cache;
use crate::config::AppConfig;
use crate::services::{AuditService, AuthService, AuthorizationService, PermissionsService, SessionManager};

/// Application state shared across every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub cache: Arc<dyn Cache>,
    pub config: AppConfig,
    pub sessions: SessionManager,
    pub auth: AuthService,
    pub authorization: AuthorizationService,
    pub permissions: PermissionsService,
    pub audit: AuditService,
}

/// Builds the full application router: public auth routes, session-gated
/// routes behind `middleware::session_auth_middleware`, and the ambient
/// layers (request id, security headers, metrics, rate limiting, CORS)
/// in the order the teacher applies them — outermost first so they see
/// every request regardless of what's downstream.
pub fn build_router(state: AppState) -> Router {
    let login_limiter = create_unkeyed_rate_limiter(
        state.config.rate_limit.login_attempts,
        state.config.rate_limit.login_window_seconds,
    );
    let global_ip_limiter = create_ip_rate_limiter(
        state.config.rate_limit.global_ip_limit,
        state.config.rate_limit.global_ip_window_seconds,
    );

    let public_routes: Router<AppState> = Router::new().route(
        "/auth/login",
        post(handlers::auth::login)
            .layer(axum::middleware::from_fn_with_state(login_limiter, rate_limit_middleware)),
    );

    let protected_routes: Router<AppState> = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/authz/check", post(handlers::authz::check))
        .route("/permissions/effective", get(handlers::permissions::effective))
        .route("/sessions", get(handlers::sessions::list))
        .route("/sessions/:session_id", delete(handlers::sessions::revoke))
        .route("/sessions/revoke-all/:principal_type/:principal_id", post(handlers::sessions::revoke_all))
        .route("/roles", post(handlers::roles::create))
        .route("/roles/:role_id/assign", post(handlers::roles::assign))
        .route("/roles/:role_id/policies", post(handlers::roles::attach_policy))
        .route("/groups", post(handlers::groups::create))
        .route("/groups/:group_id/members", post(handlers::groups::add_member))
        .route("/policies", post(handlers::policies::create))
        .route("/policies/:policy_id", put(handlers::policies::update))
        .route("/policies/:policy_id/rollback", post(handlers::policies::rollback))
        .route("/policies/simulate", post(handlers::policies::simulate))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), middleware::session_auth_middleware));

    let cors = build_cors(&state.config.security.allowed_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(axum::middleware::from_fn_with_state(global_ip_limiter, ip_rate_limit_middleware))
        .layer(cors)
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = allowed_origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Liveness/readiness probe: reachability of Store and Cache.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    db::health_check(&state.pool).await?;
    state.cache.health_check().await?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "checks": {
            "postgresql": "up",
            "cache": "up"
        }
    })))
}

/// Prometheus scrape endpoint, backed by the recorder `main` installs via
/// `iam_core::middleware::init_metrics`.
pub async fn metrics_endpoint() -> String {
    iam_core::middleware::render_metrics()
}

/// Periodic expired-session sweep (§4.5): runs until the process exits,
/// logging and continuing past a single failed pass rather than aborting
/// the background task.
pub async fn run_session_sweeper(sessions: SessionManager, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match sessions.sweep_expired().await {
            Ok(count) if count > 0 => tracing::info!(count, "swept expired sessions"),
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "session sweep failed"),
        }
    }
}
