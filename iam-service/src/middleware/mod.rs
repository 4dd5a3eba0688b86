//! Session-auth middleware (§4.1, §4.5): resolves the bearer token on
//! every request into a [`TenantContext`] before a handler ever sees it.
//! Ambient concerns (metrics, rate limiting, security headers, request
//! id) live in `iam_core::middleware` and are layered on top of this one
//! in `build_router`.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use iam_core::error::AppError;

use crate::models::organization::SYSTEM_ORGANIZATION_ID;
use crate::store;
use crate::tenant::TenantContext;
use crate::AppState;

/// Extracts `Authorization: Bearer <token>`, resolves it through the
/// session manager, and inserts a [`TenantContext`] into the request
/// extensions for downstream extraction. A principal only gets the
/// cross-tenant guard when it holds a live role assignment in the system
/// organization (§4.1) — never from a header or client-supplied claim.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("missing bearer token"))?
        .to_string();

    let identity = state.sessions.lookup(&token).await?;
    state.sessions.touch_last_used(&identity).await;

    let is_system_admin = if identity.organization_id == SYSTEM_ORGANIZATION_ID {
        let assignments = store::assignment::list_for_principal(
            &state.pool,
            SYSTEM_ORGANIZATION_ID,
            identity.principal.id,
            identity.principal.principal_type,
        )
        .await?;
        let now = Utc::now();
        assignments.iter().any(|a| !a.is_expired(now))
    } else {
        false
    };

    let context = TenantContext::new(
        identity.organization_id,
        identity.principal,
        identity.session_id,
        is_system_admin,
    );
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
