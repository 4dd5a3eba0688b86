//! Authentication endpoints (§6): password login, session refresh, and
//! logout. Organization-scoped CRUD for the `User` record itself lives
//! outside this crate's HTTP surface (§1 Non-goals); this module only
//! exposes the session lifecycle operations `AuthService`/`SessionManager`
//! already implement.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::SessionResponse;
use crate::response::{ok, Envelope};
use crate::store;
use crate::tenant::TenantContext;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub organization_id: Uuid,
    pub email: String,
    pub password: String,
    pub mfa_code: Option<String>,
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()).map(String::from)
}

/// `POST /auth/login` (§6, §4.6, §7): opaque "invalid credentials" for
/// both a missing user and a wrong password; account lockout and MFA are
/// surfaced as distinct error variants, never folded into the same
/// message as a bad password.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Envelope<SessionResponse>>, AppError> {
    let (session, _user) = state
        .auth
        .login(
            body.organization_id,
            &body.email,
            &body.password,
            body.mfa_code.as_deref(),
            client_ip(&headers),
            user_agent(&headers),
        )
        .await?;
    Ok(Json(ok(SessionResponse::from(session))))
}

/// `POST /auth/logout`: revokes the session named by the bearer token
/// presented on this request.
pub async fn logout(context: TenantContext, State(state): State<AppState>) -> Result<Json<Envelope<serde_json::Value>>, AppError> {
    state.sessions.revoke_by_id(context.organization_id, context.session_id).await?;
    Ok(Json(ok(serde_json::json!({ "revoked": true }))))
}

/// `POST /auth/refresh`: rotates the caller's session, preserving the
/// assumed role and MFA-verified state of the session it replaces, and
/// revokes the old token so it cannot be replayed.
pub async fn refresh(
    context: TenantContext,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Envelope<SessionResponse>>, AppError> {
    let current = store::session::find_by_id(&state.pool, context.session_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let new_session = state
        .sessions
        .issue(
            context.organization_id,
            context.principal,
            current.assumed_role_id,
            None,
            current.mfa_verified,
            client_ip(&headers),
            user_agent(&headers),
            current.device_fingerprint.clone(),
        )
        .await?;

    state.sessions.revoke_by_id(context.organization_id, context.session_id).await.ok();

    Ok(Json(ok(SessionResponse::from(new_session))))
}
