//! `POST /authz/check` (§6, §4.4): the single entry point a collaborating
//! service calls to decide whether a principal may take an action on a
//! resource. Defaults to the caller's own principal, but an org-scoped
//! caller may name a different principal to check on its behalf (e.g. an
//! admin auditing what another user can do).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::authz::condition::ConditionContext;
use crate::authz::evaluator::Decision;
use crate::models::principal::{PrincipalId, PrincipalType};
use crate::response::{ok, Envelope};
use crate::services::AuthorizationService;
use crate::tenant::TenantContext;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub principal_id: Option<Uuid>,
    pub principal_type: Option<PrincipalType>,
    pub action: String,
    pub resource: String,
    #[serde(default)]
    pub context: ConditionContext,
}

/// §6: `{ decision: "allow"|"deny", matched_policies: [id], reasons:
/// [...] }`. `NotApplicable` is folded into `"deny"` here — §8's
/// deny-by-default rule means a caller of this endpoint only ever needs
/// to distinguish the two outcomes; the three-way distinction stays
/// available to internal callers via [`crate::services::CheckOutcome`]
/// and the audit record it produces.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub decision: &'static str,
    pub matched_policies: Vec<Uuid>,
    pub reasons: Vec<String>,
}

pub async fn check(
    context: TenantContext,
    State(state): State<AppState>,
    Json(body): Json<CheckRequest>,
) -> Result<Json<Envelope<CheckResponse>>, AppError> {
    let principal = match (body.principal_id, body.principal_type) {
        (Some(id), Some(principal_type)) => PrincipalId { id, principal_type },
        _ => context.principal,
    };

    let outcome = state
        .authorization
        .check(
            context.organization_id,
            principal,
            Some(context.session_id),
            &body.action,
            &body.resource,
            body.context,
            None,
        )
        .await?;

    let decision = if AuthorizationService::permits(outcome.decision) { "allow" } else { "deny" };

    let reasons: Vec<String> = outcome
        .matched_policy_names
        .iter()
        .zip(outcome.matched_statement_indices.iter())
        .map(|(name, statements)| format!("policy '{name}' matched statement(s) {statements:?}"))
        .collect();
    // A match list is only empty when nothing applied at all — Allow and
    // Deny both require at least one matched statement to be reached.
    let reasons = if reasons.is_empty() {
        debug_assert_eq!(outcome.decision, Decision::NotApplicable);
        vec!["no policy statement matched the request".to_string()]
    } else {
        reasons
    };

    Ok(Json(ok(CheckResponse { decision, matched_policies: outcome.matched_policy_ids, reasons })))
}
