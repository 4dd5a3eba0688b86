//! Session introspection and revocation (§6, §4.5). Issuance itself only
//! ever happens as a side effect of `auth::login`; there is no
//! `POST /sessions` here.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::{SessionResponse, PrincipalId, PrincipalType};
use crate::response::{ok, Envelope};
use crate::store;
use crate::tenant::TenantContext;
use crate::AppState;

/// `GET /sessions`: every session in the caller's organization (or, for
/// a cross-tenant caller, every session it is allowed to see — the guard
/// still requires a named organization per §4.1, so this lists the
/// caller's own).
pub async fn list(context: TenantContext, State(state): State<AppState>) -> Result<Json<Envelope<Vec<SessionResponse>>>, AppError> {
    let sessions = store::session::list_for_organization(&state.pool, context.organization_id).await?;
    Ok(Json(ok(sessions.into_iter().map(SessionResponse::from).collect::<Vec<_>>())))
}

/// `DELETE /sessions/:session_id`.
pub async fn revoke(
    context: TenantContext,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Envelope<serde_json::Value>>, AppError> {
    state.sessions.revoke_by_id(context.organization_id, session_id).await?;
    Ok(Json(ok(serde_json::json!({ "revoked": true }))))
}

/// `POST /sessions/revoke-all/:principal_type/:principal_id`: the
/// `RevokeAllUserSessions` operation (§4.5).
pub async fn revoke_all(
    context: TenantContext,
    State(state): State<AppState>,
    Path((principal_type, principal_id)): Path<(PrincipalType, Uuid)>,
) -> Result<Json<Envelope<serde_json::Value>>, AppError> {
    let principal = PrincipalId { id: principal_id, principal_type };
    let revoked = state.sessions.revoke_all_for_principal(context.organization_id, principal).await?;
    Ok(Json(ok(serde_json::json!({ "revoked": revoked }))))
}
