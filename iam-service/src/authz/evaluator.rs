//! The policy decision algorithm (§4.2).
//!
//! Statements are evaluated in source order within a document, and
//! documents in the order the caller supplies them (permission resolver
//! §4.4 controls that order — deny-priority policies first is a caller
//! concern, not this module's). An explicit `Deny` short-circuits the
//! whole evaluation; otherwise the first matching `Allow` wins; if
//! nothing matches at all the result is [`Decision::NotApplicable`],
//! which callers must treat as deny-by-default (§8 invariant).

use crate::authz::condition::{evaluate_condition_block, ConditionContext};
use crate::authz::document::{PolicyDocument, Statement};
use crate::authz::pattern::any_matches;
use crate::models::policy::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    NotApplicable,
}

/// A single authorization question: does `action` on `resource` pass,
/// given `context` for condition evaluation.
pub struct Request<'a> {
    pub action: &'a str,
    pub resource: &'a str,
    pub context: &'a ConditionContext,
}

fn statement_matches(stmt: &Statement, req: &Request<'_>) -> bool {
    any_matches(stmt.action.as_slice().iter().map(String::as_str), req.action)
        && any_matches(stmt.resource.as_slice().iter().map(String::as_str), req.resource)
        && stmt
            .condition
            .as_ref()
            .is_none_or(|c| evaluate_condition_block(c, req.context))
}

/// A single document's decision plus the ordered list of statement
/// indices (within that document) that matched, as §4.2's Output
/// requires — the audit trail for "why" a decision came out the way it
/// did, not just "what".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub decision: Decision,
    pub matched_statement_indices: Vec<usize>,
}

/// One document's contribution to a multi-document [`evaluate`] call:
/// which document (by position in the input) and which of its
/// statements matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMatch {
    pub document_index: usize,
    pub statement_indices: Vec<usize>,
}

/// The result of evaluating an ordered set of documents: the combined
/// decision plus every document that had at least one matching
/// statement, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOutcome {
    pub decision: Decision,
    pub matches: Vec<DocumentMatch>,
}

/// Evaluates a single document against `req`. Deny short-circuits even
/// if an earlier statement in the same document already matched Allow;
/// the returned indices stop at the deciding Deny statement, since
/// later statements were never tested.
pub fn evaluate_document(document: &PolicyDocument, req: &Request<'_>) -> DocumentOutcome {
    let mut matched = Vec::new();
    for (index, stmt) in document.statement.iter().enumerate() {
        if !statement_matches(stmt, req) {
            continue;
        }
        matched.push(index);
        if stmt.effect == Effect::Deny {
            return DocumentOutcome { decision: Decision::Deny, matched_statement_indices: matched };
        }
    }
    let decision = if matched.is_empty() { Decision::NotApplicable } else { Decision::Allow };
    DocumentOutcome { decision, matched_statement_indices: matched }
}

/// Evaluates an ordered set of documents against `req`. Any Deny across
/// any document wins outright, short-circuiting the remaining documents;
/// otherwise Allow if any document allowed; otherwise NotApplicable.
pub fn evaluate<'a>(documents: impl IntoIterator<Item = &'a PolicyDocument>, req: &Request<'_>) -> EvaluationOutcome {
    let mut allowed = false;
    let mut matches = Vec::new();
    for (document_index, document) in documents.into_iter().enumerate() {
        let outcome = evaluate_document(document, req);
        if !outcome.matched_statement_indices.is_empty() {
            matches.push(DocumentMatch { document_index, statement_indices: outcome.matched_statement_indices });
        }
        match outcome.decision {
            Decision::Deny => return EvaluationOutcome { decision: Decision::Deny, matches },
            Decision::Allow => allowed = true,
            Decision::NotApplicable => {}
        }
    }
    let decision = if allowed { Decision::Allow } else { Decision::NotApplicable };
    EvaluationOutcome { decision, matches }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: serde_json::Value) -> PolicyDocument {
        serde_json::from_value(json).unwrap()
    }

    fn ctx() -> ConditionContext {
        ConditionContext::new()
    }

    /// Scenario S1: a wildcard Allow statement grants a matching action.
    #[test]
    fn s1_wildcard_allow_grants_matching_action() {
        let d = doc(serde_json::json!({
            "Version": "1",
            "Statement": [{"Effect": "Allow", "Action": "*", "Resource": "*"}]
        }));
        let c = ctx();
        let req = Request { action: "user:read", resource: "arn:iam:user:*:org1:user/1", context: &c };
        let outcome = evaluate_document(&d, &req);
        assert_eq!(outcome.decision, Decision::Allow);
        assert_eq!(outcome.matched_statement_indices, vec![0]);
    }

    /// Scenario S2: an explicit Deny in one document overrides an Allow
    /// granted by another, regardless of document order.
    #[test]
    fn s2_deny_overrides_allow_across_documents() {
        let allow = doc(serde_json::json!({
            "Version": "1",
            "Statement": [{"Effect": "Allow", "Action": "*", "Resource": "*"}]
        }));
        let deny = doc(serde_json::json!({
            "Version": "1",
            "Statement": [{"Effect": "Deny", "Action": "user:delete", "Resource": "*"}]
        }));
        let c = ctx();
        let req = Request { action: "user:delete", resource: "arn:a", context: &c };
        let outcome = evaluate(&[allow, deny], &req);
        assert_eq!(outcome.decision, Decision::Deny);
        // the allowing document still matched and is recorded, even
        // though the deny from the second document is what decided it.
        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.matches[1].document_index, 1);
        assert_eq!(outcome.matches[1].statement_indices, vec![0]);
    }

    #[test]
    fn deny_short_circuits_within_a_single_document() {
        let d = doc(serde_json::json!({
            "Version": "1",
            "Statement": [
                {"Effect": "Allow", "Action": "*", "Resource": "*"},
                {"Effect": "Deny", "Action": "user:delete", "Resource": "*"}
            ]
        }));
        let c = ctx();
        let req = Request { action: "user:delete", resource: "arn:a", context: &c };
        let outcome = evaluate_document(&d, &req);
        assert_eq!(outcome.decision, Decision::Deny);
        assert_eq!(outcome.matched_statement_indices, vec![0, 1]);
    }

    #[test]
    fn no_matching_statement_is_not_applicable() {
        let d = doc(serde_json::json!({
            "Version": "1",
            "Statement": [{"Effect": "Allow", "Action": "user:read", "Resource": "*"}]
        }));
        let c = ctx();
        let req = Request { action: "user:delete", resource: "arn:a", context: &c };
        let outcome = evaluate_document(&d, &req);
        assert_eq!(outcome.decision, Decision::NotApplicable);
        assert!(outcome.matched_statement_indices.is_empty());
    }

    /// Scenario S6: a Condition block scopes an Allow to a time window;
    /// outside the window the statement simply doesn't match.
    #[test]
    fn s6_conditional_time_bounded_access() {
        let d = doc(serde_json::json!({
            "Version": "1",
            "Statement": [{
                "Effect": "Allow",
                "Action": "*",
                "Resource": "*",
                "Condition": {"DateLessThan": {"request_time": "2030-01-01T00:00:00Z"}}
            }]
        }));
        let mut c = ctx();
        c.insert("request_time".into(), "2025-01-01T00:00:00Z".into());
        let req = Request { action: "user:read", resource: "arn:a", context: &c };
        assert_eq!(evaluate_document(&d, &req).decision, Decision::Allow);

        c.insert("request_time".into(), "2031-01-01T00:00:00Z".into());
        let req = Request { action: "user:read", resource: "arn:a", context: &c };
        assert_eq!(evaluate_document(&d, &req).decision, Decision::NotApplicable);
    }

    #[test]
    fn empty_document_set_is_not_applicable() {
        let c = ctx();
        let req = Request { action: "user:read", resource: "arn:a", context: &c };
        let outcome = evaluate(&[], &req);
        assert_eq!(outcome.decision, Decision::NotApplicable);
        assert!(outcome.matches.is_empty());
    }
}
