//! Authorization service (§4.4, §4.7): ties the permission resolver, the
//! evaluator, and the audit interface together into the one entry point
//! handlers call to decide a request and have it recorded.

use sqlx::PgPool;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::authz::condition::ConditionContext;
use crate::authz::evaluator::{evaluate, Decision, Request};
use crate::authz::resolver;
use crate::models::audit::{AuditEventBuilder, AuditResult, AuditSeverity};
use crate::models::principal::PrincipalId;
use crate::services::audit::AuditService;
use crate::store;

/// The result of a [`AuthorizationService::check`] call: the decision
/// plus the policies that actually had a matching statement, and which
/// statement(s) in each matched — the §4.4 "matched policy IDs and
/// matched statement indices" an audit consumer or an `authz/check`
/// caller needs to explain "why".
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub decision: Decision,
    pub matched_policy_ids: Vec<Uuid>,
    pub matched_policy_names: Vec<String>,
    pub matched_statement_indices: Vec<Vec<usize>>,
}

#[derive(Clone)]
pub struct AuthorizationService {
    pool: PgPool,
    audit: AuditService,
}

impl AuthorizationService {
    pub fn new(pool: PgPool, audit: AuditService) -> Self {
        Self { pool, audit }
    }

    /// Resolves every policy document that applies to `principal` in
    /// `organization_id`, evaluates `action`/`resource` against them, and
    /// records the decision as an audit event carrying the matched policy
    /// ids and matched statement indices. `NotApplicable` and `Deny` are
    /// both denials to a caller (§8 deny-by-default); this returns the
    /// raw [`Decision`] inside [`CheckOutcome`] so a caller can still
    /// distinguish an explicit deny from "no policy said anything" if it
    /// needs to.
    pub async fn check(
        &self,
        organization_id: Uuid,
        principal: PrincipalId,
        session_id: Option<Uuid>,
        action: &str,
        resource: &str,
        context: ConditionContext,
        request_id: Option<String>,
    ) -> Result<CheckOutcome, AppError> {
        let now = chrono::Utc::now();

        let memberships = store::membership::list_for_organization(&self.pool, organization_id).await?;
        let assignments = store::assignment::list_for_organization(&self.pool, organization_id).await?;
        let group_ids = resolver::transitive_group_ids(principal, &memberships, now);
        let role_ids = resolver::applicable_role_ids(principal, &group_ids, &assignments, now);
        let role_policies = store::role::list_policies_for_roles(&self.pool, &role_ids).await?;
        let policies = store::policy::list_active_for_organization(&self.pool, organization_id).await?;
        let applicable = resolver::applicable_policies(&role_ids, &role_policies, &policies, organization_id);
        let documents = applicable.iter().map(|p| &p.document.0);

        let req = Request { action, resource, context: &context };
        let outcome = evaluate(documents, &req);
        let decision = outcome.decision;

        // Only policies with at least one matching statement are
        // "matched" per §4.4 — not every policy the resolver merely
        // gathered as applicable.
        let matched_policy_ids: Vec<Uuid> =
            outcome.matches.iter().map(|m| applicable[m.document_index].policy_id).collect();
        let matched_policy_names: Vec<String> =
            outcome.matches.iter().map(|m| applicable[m.document_index].name.clone()).collect();
        let matched_statement_indices: Vec<Vec<usize>> =
            outcome.matches.iter().map(|m| m.statement_indices.clone()).collect();

        let (result, severity) = match decision {
            Decision::Allow => (AuditResult::Success, AuditSeverity::Info),
            Decision::Deny => (AuditResult::Failure, AuditSeverity::Warn),
            Decision::NotApplicable => (AuditResult::Failure, AuditSeverity::Info),
        };

        let mut builder = AuditEventBuilder::new("authz.check", result)
            .organization(organization_id)
            .principal(principal)
            .severity(severity)
            .context(serde_json::json!({
                "action": action,
                "resource": resource,
                "decision": format!("{decision:?}"),
                "matched_policy_ids": matched_policy_ids,
                "matched_policy_names": matched_policy_names,
                "matched_statement_indices": matched_statement_indices,
            }));
        if let Some(session_id) = session_id {
            builder = builder.session(session_id);
        }
        if let Some(request_id) = request_id {
            builder = builder.request_id(request_id);
        }
        self.audit.record(builder.build()).await;

        Ok(CheckOutcome { decision, matched_policy_ids, matched_policy_names, matched_statement_indices })
    }

    /// `decision == Allow` is the only decision that grants access;
    /// `Deny` and `NotApplicable` are both denials (§8 invariant).
    pub fn permits(decision: Decision) -> bool {
        decision == Decision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::AuthorizationService;
    use crate::authz::evaluator::Decision;

    #[test]
    fn only_allow_permits_access() {
        assert!(AuthorizationService::permits(Decision::Allow));
        assert!(!AuthorizationService::permits(Decision::Deny));
        assert!(!AuthorizationService::permits(Decision::NotApplicable));
    }
}
