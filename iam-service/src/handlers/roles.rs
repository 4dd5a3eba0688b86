//! Role management (§3, §4.4): creating roles, assigning them to
//! principals, and attaching policies to them. Full role CRUD (rename,
//! delete) is left outside this crate's HTTP surface along with the
//! other thin-wrapper entities (§1 Non-goals); what's exposed here is
//! the part of the model the permission resolver actually depends on.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::{
    AttachPolicyRequest, CreateRoleAssignmentRequest, CreateRoleRequest, Role, RoleAssignment,
    RoleAssignmentResponse, RolePolicy, RoleResponse,
};
use crate::response::{ok, Envelope};
use crate::store;
use crate::tenant::TenantContext;
use crate::AppState;

pub async fn create(
    context: TenantContext,
    State(state): State<AppState>,
    Json(body): Json<CreateRoleRequest>,
) -> Result<Json<Envelope<RoleResponse>>, AppError> {
    let organization_id = context.guard.require_organization(context.organization_id)?;
    let mut role = Role::new(organization_id, body.name);
    role.max_session_duration_seconds = body.max_session_duration_seconds;
    store::role::insert(&state.pool, &role).await?;
    Ok(Json(ok(RoleResponse::from(role))))
}

/// `POST /roles/:role_id/assign`.
pub async fn assign(
    context: TenantContext,
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
    Json(body): Json<CreateRoleAssignmentRequest>,
) -> Result<Json<Envelope<RoleAssignmentResponse>>, AppError> {
    let organization_id = context.guard.require_organization(context.organization_id)?;
    store::role::find_by_id(&state.pool, organization_id, role_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let principal = crate::models::PrincipalId { id: body.principal_id, principal_type: body.principal_type };
    let assignment = RoleAssignment::new(organization_id, role_id, principal, context.principal.id, body.expires_at);
    store::assignment::insert(&state.pool, &assignment).await?;
    Ok(Json(ok(RoleAssignmentResponse::from(assignment))))
}

/// `POST /roles/:role_id/policies`.
pub async fn attach_policy(
    context: TenantContext,
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
    Json(body): Json<AttachPolicyRequest>,
) -> Result<Json<Envelope<serde_json::Value>>, AppError> {
    let organization_id = context.guard.require_organization(context.organization_id)?;
    store::role::find_by_id(&state.pool, organization_id, role_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    store::policy::find_by_id(&state.pool, organization_id, body.policy_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let attachment = RolePolicy {
        role_id,
        policy_id: body.policy_id,
        attached_by: context.principal.id,
        attached_at: chrono::Utc::now(),
    };
    store::role::attach_policy(&state.pool, &attachment).await?;
    Ok(Json(ok(serde_json::json!({ "attached": true }))))
}
