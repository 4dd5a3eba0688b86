//! Permission resolver (§4.4): collects every policy document that
//! applies to a principal, through direct role assignments and through
//! role assignments mediated by group membership, then hands the result
//! to [`crate::authz::evaluator`].
//!
//! Group membership is transitive (a group can itself belong to another
//! group) and must be cycle-safe: a membership loop must not hang the
//! resolver or double-count a role's policies.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::authz::document::PolicyDocument;
use crate::authz::evaluator::{evaluate, Decision, Request};
use crate::models::assignment::RoleAssignment;
use crate::models::membership::GroupMembership;
use crate::models::policy::{Policy, PolicyStatus};
use crate::models::principal::PrincipalId;
use crate::models::role::RolePolicy;

/// Walks `memberships` breadth-first from `principal`, following
/// group-in-group links, and returns every group id the principal is a
/// transitive member of (including through nested groups). Cycle-safe:
/// a `visited` set means each group is only ever enqueued once.
pub fn transitive_group_ids(principal: PrincipalId, memberships: &[GroupMembership], now: DateTime<Utc>) -> Vec<Uuid> {
    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut queue: VecDeque<Uuid> = memberships
        .iter()
        .filter(|m| m.principal() == principal && !m.is_expired(now))
        .map(|m| m.group_id)
        .collect();

    while let Some(group_id) = queue.pop_front() {
        if !visited.insert(group_id) {
            continue;
        }
        let group_principal = PrincipalId::group(group_id);
        for m in memberships {
            if m.principal() == group_principal && !m.is_expired(now) && !visited.contains(&m.group_id) {
                queue.push_back(m.group_id);
            }
        }
    }

    visited.into_iter().collect()
}

/// Returns the role ids assigned to `principal` directly or via any of
/// `group_ids`, excluding expired assignments.
pub fn applicable_role_ids(
    principal: PrincipalId,
    group_ids: &[Uuid],
    assignments: &[RoleAssignment],
    now: DateTime<Utc>,
) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    let mut roles = Vec::new();
    for a in assignments {
        if a.is_expired(now) {
            continue;
        }
        let matches_principal = a.principal() == principal
            || (a.principal_type == crate::models::principal::PrincipalType::Group
                && group_ids.contains(&a.principal_id));
        if matches_principal && seen.insert(a.role_id) {
            roles.push(a.role_id);
        }
    }
    roles
}

/// Joins `role_ids` through `role_policies` to the set of policies,
/// filtering to active policies belonging to `organization_id`, and
/// deduplicating by policy id while preserving first-seen order — a
/// policy attached to two roles the principal holds is only evaluated
/// once.
pub fn applicable_policies<'a>(
    role_ids: &[Uuid],
    role_policies: &[RolePolicy],
    policies: &'a [Policy],
    organization_id: Uuid,
) -> Vec<&'a Policy> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for rp in role_policies {
        if !role_ids.contains(&rp.role_id) {
            continue;
        }
        if !seen.insert(rp.policy_id) {
            continue;
        }
        if let Some(policy) = policies.iter().find(|p| {
            p.policy_id == rp.policy_id
                && p.organization_id == organization_id
                && p.status == PolicyStatus::Active
                && p.deleted_at.is_none()
        }) {
            result.push(policy);
        }
    }
    result
}

/// Full resolution: principal + group memberships + role assignments +
/// role/policy joins -> the ordered document list a request can be
/// evaluated against.
pub fn resolve_documents<'a>(
    principal: PrincipalId,
    organization_id: Uuid,
    memberships: &[GroupMembership],
    assignments: &[RoleAssignment],
    role_policies: &[RolePolicy],
    policies: &'a [Policy],
    now: DateTime<Utc>,
) -> Vec<&'a PolicyDocument> {
    let group_ids = transitive_group_ids(principal, memberships, now);
    let role_ids = applicable_role_ids(principal, &group_ids, assignments, now);
    applicable_policies(&role_ids, role_policies, policies, organization_id)
        .into_iter()
        .map(|p| &p.document.0)
        .collect()
}

/// Convenience wrapper: resolve then evaluate in one call.
pub fn authorize(
    principal: PrincipalId,
    organization_id: Uuid,
    memberships: &[GroupMembership],
    assignments: &[RoleAssignment],
    role_policies: &[RolePolicy],
    policies: &[Policy],
    now: DateTime<Utc>,
    req: &Request<'_>,
) -> Decision {
    let documents = resolve_documents(
        principal,
        organization_id,
        memberships,
        assignments,
        role_policies,
        policies,
        now,
    );
    evaluate(documents, req).decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::condition::ConditionContext;
    use crate::models::group::GroupMemberRole;
    use crate::models::policy::Effect;
    use crate::models::principal::PrincipalType;

    fn policy_with_statement(org: Uuid, action: &str, effect: Effect) -> Policy {
        let doc: PolicyDocument = serde_json::from_value(serde_json::json!({
            "Version": "1",
            "Statement": [{"Effect": effect, "Action": action, "Resource": "*"}]
        }))
        .unwrap();
        Policy::new(org, "test".into(), doc, Effect::Deny, "identity".into())
    }

    #[test]
    fn direct_assignment_grants_policy() {
        let org = Uuid::new_v4();
        let user = PrincipalId::user(Uuid::new_v4());
        let role_id = Uuid::new_v4();
        let policy = policy_with_statement(org, "user:read", Effect::Allow);

        let assignment = RoleAssignment::new(org, role_id, user, Uuid::new_v4(), None);
        let role_policy = RolePolicy { role_id, policy_id: policy.policy_id, attached_by: Uuid::new_v4(), attached_at: Utc::now() };

        let ctx = ConditionContext::new();
        let req = Request { action: "user:read", resource: "arn:a", context: &ctx };
        let decision = authorize(user, org, &[], &[assignment], &[role_policy], &[policy], Utc::now(), &req);
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn group_mediated_assignment_grants_policy() {
        let org = Uuid::new_v4();
        let user = PrincipalId::user(Uuid::new_v4());
        let group_id = Uuid::new_v4();
        let role_id = Uuid::new_v4();
        let policy = policy_with_statement(org, "user:read", Effect::Allow);

        let membership = GroupMembership::new(org, group_id, user, GroupMemberRole::Member, Uuid::new_v4(), None);
        let assignment = RoleAssignment::new(org, role_id, PrincipalId::group(group_id), Uuid::new_v4(), None);
        let role_policy = RolePolicy { role_id, policy_id: policy.policy_id, attached_by: Uuid::new_v4(), attached_at: Utc::now() };

        let ctx = ConditionContext::new();
        let req = Request { action: "user:read", resource: "arn:a", context: &ctx };
        let decision = authorize(user, org, &[membership], &[assignment], &[role_policy], &[policy], Utc::now(), &req);
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn nested_group_membership_is_cycle_safe() {
        let org = Uuid::new_v4();
        let user = PrincipalId::user(Uuid::new_v4());
        let group_a = Uuid::new_v4();
        let group_b = Uuid::new_v4();

        let memberships = vec![
            GroupMembership::new(org, group_a, user, GroupMemberRole::Member, Uuid::new_v4(), None),
            GroupMembership::new(org, group_b, PrincipalId::group(group_a), GroupMemberRole::Member, Uuid::new_v4(), None),
            // cycle: group_a is also a member of group_b
            GroupMembership::new(org, group_a, PrincipalId::group(group_b), GroupMemberRole::Member, Uuid::new_v4(), None),
        ];

        let groups = transitive_group_ids(user, &memberships, Utc::now());
        assert_eq!(groups.len(), 2);
        assert!(groups.contains(&group_a));
        assert!(groups.contains(&group_b));
    }

    #[test]
    fn expired_assignment_is_excluded() {
        let org = Uuid::new_v4();
        let user = PrincipalId::user(Uuid::new_v4());
        let role_id = Uuid::new_v4();
        let policy = policy_with_statement(org, "user:read", Effect::Allow);

        let mut assignment = RoleAssignment::new(org, role_id, user, Uuid::new_v4(), None);
        assignment.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        let role_policy = RolePolicy { role_id, policy_id: policy.policy_id, attached_by: Uuid::new_v4(), attached_at: Utc::now() };

        let ctx = ConditionContext::new();
        let req = Request { action: "user:read", resource: "arn:a", context: &ctx };
        let decision = authorize(user, org, &[], &[assignment], &[role_policy], &[policy], Utc::now(), &req);
        assert_eq!(decision, Decision::NotApplicable);
    }

    #[test]
    fn policy_attached_to_two_held_roles_evaluates_once() {
        let org = Uuid::new_v4();
        let user = PrincipalId::user(Uuid::new_v4());
        let role_one = Uuid::new_v4();
        let role_two = Uuid::new_v4();
        let policy = policy_with_statement(org, "user:delete", Effect::Deny);

        let assignments = vec![
            RoleAssignment::new(org, role_one, user, Uuid::new_v4(), None),
            RoleAssignment::new(org, role_two, user, Uuid::new_v4(), None),
        ];
        let role_policies = vec![
            RolePolicy { role_id: role_one, policy_id: policy.policy_id, attached_by: Uuid::new_v4(), attached_at: Utc::now() },
            RolePolicy { role_id: role_two, policy_id: policy.policy_id, attached_by: Uuid::new_v4(), attached_at: Utc::now() },
        ];

        let role_ids = applicable_role_ids(user, &[], &assignments, Utc::now());
        let docs = applicable_policies(&role_ids, &role_policies, &[policy], org);
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn policy_from_other_organization_is_excluded() {
        let org = Uuid::new_v4();
        let other_org = Uuid::new_v4();
        let user = PrincipalId::user(Uuid::new_v4());
        let role_id = Uuid::new_v4();
        let policy = policy_with_statement(other_org, "user:read", Effect::Allow);

        let assignment = RoleAssignment::new(org, role_id, user, Uuid::new_v4(), None);
        let role_policy = RolePolicy { role_id, policy_id: policy.policy_id, attached_by: Uuid::new_v4(), attached_at: Utc::now() };

        let role_ids = applicable_role_ids(user, &[], &[assignment], Utc::now());
        let docs = applicable_policies(&role_ids, &[role_policy], &[policy], org);
        assert!(docs.is_empty());

        let _ = PrincipalType::ServiceAccount;
    }
}
