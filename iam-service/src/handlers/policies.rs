//! Policy management (§3, §4.2): document create/update, version
//! rollback, and a no-side-effect simulate endpoint for testing a draft
//! document against ad hoc requests before attaching it to a role.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::authz::condition::ConditionContext;
use crate::authz::document::PolicyDocument;
use crate::authz::evaluator::{evaluate_document, Decision, Request};
use crate::models::policy::PolicyStatus;
use crate::models::{CreatePolicyRequest, Policy, PolicyResponse, RollbackPolicyRequest, UpdatePolicyRequest};
use crate::response::{ok, Envelope};
use crate::store;
use crate::tenant::TenantContext;
use crate::AppState;

fn parse_document(value: serde_json::Value) -> Result<PolicyDocument, AppError> {
    let document: PolicyDocument =
        serde_json::from_value(value).map_err(|e| AppError::validation(format!("malformed policy document: {e}")))?;
    document.validate().map_err(|e| AppError::validation(e.to_string()))?;
    Ok(document)
}

pub async fn create(
    context: TenantContext,
    State(state): State<AppState>,
    Json(body): Json<CreatePolicyRequest>,
) -> Result<Json<Envelope<PolicyResponse>>, AppError> {
    let organization_id = context.guard.require_organization(context.organization_id)?;
    let document = parse_document(body.document)?;
    let policy = Policy::new(organization_id, body.name, document, body.effect_default, body.policy_type);
    store::policy::insert(&state.pool, &policy).await?;
    Ok(Json(ok(PolicyResponse::from(policy))))
}

/// `PUT /policies/:policy_id`: snapshots the current document to
/// `policy_versions` before overwriting it and bumping the version
/// column (§4.2 versioning rule) — never a bare in-place update.
pub async fn update(
    context: TenantContext,
    State(state): State<AppState>,
    Path(policy_id): Path<Uuid>,
    Json(body): Json<UpdatePolicyRequest>,
) -> Result<Json<Envelope<PolicyResponse>>, AppError> {
    let organization_id = context.guard.require_organization(context.organization_id)?;
    let policy = store::policy::find_by_id(&state.pool, organization_id, policy_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let document = parse_document(body.document)?;
    let new_document = sqlx::types::Json(document);

    let mut tx = state.pool.begin().await.map_err(AppError::from)?;
    let new_version =
        store::policy::write_version_and_update(&mut tx, &policy, &new_document, context.principal.id, None).await?;
    tx.commit().await.map_err(AppError::from)?;

    let mut updated = policy;
    updated.document = new_document;
    updated.version = new_version;
    Ok(Json(ok(PolicyResponse::from(updated))))
}

/// `POST /policies/:policy_id/rollback`: restores a named historical
/// version as the live document. Implemented as an update to that
/// version's document, so the current (about-to-be-superseded) document
/// is itself snapshotted first — a rollback never discards history.
pub async fn rollback(
    context: TenantContext,
    State(state): State<AppState>,
    Path(policy_id): Path<Uuid>,
    Json(body): Json<RollbackPolicyRequest>,
) -> Result<Json<Envelope<PolicyResponse>>, AppError> {
    let organization_id = context.guard.require_organization(context.organization_id)?;
    let policy = store::policy::find_by_id(&state.pool, organization_id, policy_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    let target = store::policy::find_version(&state.pool, policy_id, &body.version)
        .await?
        .ok_or_else(AppError::not_found)?;

    let mut tx = state.pool.begin().await.map_err(AppError::from)?;
    let new_version = store::policy::write_version_and_update(
        &mut tx,
        &policy,
        &target.document,
        context.principal.id,
        Some(PolicyStatus::Active),
    )
    .await?;
    tx.commit().await.map_err(AppError::from)?;

    let mut updated = policy;
    updated.document = target.document;
    updated.version = new_version;
    updated.status = PolicyStatus::Active;
    Ok(Json(ok(PolicyResponse::from(updated))))
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub document: serde_json::Value,
    pub action: String,
    pub resource: String,
    #[serde(default)]
    pub context: ConditionContext,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub decision: &'static str,
    pub matched_statement_indices: Vec<usize>,
}

/// `POST /policies/simulate`: evaluates a draft document (not
/// necessarily a persisted one) against a single request, without
/// touching any stored policy or recording an audit event — a pure
/// what-if check for policy authoring.
pub async fn simulate(
    _context: TenantContext,
    Json(body): Json<SimulateRequest>,
) -> Result<Json<Envelope<SimulateResponse>>, AppError> {
    let document = parse_document(body.document)?;
    let req = Request { action: &body.action, resource: &body.resource, context: &body.context };
    let outcome = evaluate_document(&document, &req);
    let name = match outcome.decision {
        Decision::Allow => "Allow",
        Decision::Deny => "Deny",
        Decision::NotApplicable => "NotApplicable",
    };
    Ok(Json(ok(SimulateResponse { decision: name, matched_statement_indices: outcome.matched_statement_indices })))
}
