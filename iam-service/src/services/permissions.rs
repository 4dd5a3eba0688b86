//! Effective-permissions aggregation (§4.4 last paragraph, carried as a
//! first-class endpoint per SPEC_FULL.md §15): a read-only report of
//! every `(resource pattern, action)` pair a principal's resolved
//! policies speak to, with the winning effect and the policies that
//! contributed to it. This never drives an authorization decision itself
//! — `AuthorizationService::check` always re-evaluates a live request
//! against the same resolved documents — it exists purely for
//! introspection/debugging of "what can this principal do".

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::authz::resolver;
use crate::models::policy::Effect;
use crate::models::principal::PrincipalId;
use crate::store;

#[derive(Debug, Clone, Serialize)]
pub struct EffectivePermissionEntry {
    pub resource: String,
    pub action: String,
    pub effect: Effect,
    pub source_policies: Vec<String>,
}

#[derive(Clone)]
pub struct PermissionsService {
    pool: PgPool,
}

impl PermissionsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn effective_permissions(
        &self,
        organization_id: Uuid,
        principal: PrincipalId,
    ) -> Result<Vec<EffectivePermissionEntry>, AppError> {
        let now = chrono::Utc::now();

        let memberships = store::membership::list_for_organization(&self.pool, organization_id).await?;
        let assignments = store::assignment::list_for_organization(&self.pool, organization_id).await?;
        let group_ids = resolver::transitive_group_ids(principal, &memberships, now);
        let role_ids = resolver::applicable_role_ids(principal, &group_ids, &assignments, now);
        let role_policies = store::role::list_policies_for_roles(&self.pool, &role_ids).await?;
        let policies = store::policy::list_active_for_organization(&self.pool, organization_id).await?;
        let applicable = resolver::applicable_policies(&role_ids, &role_policies, &policies, organization_id);

        // Deny always overrides Allow for the same (resource, action) pair,
        // regardless of which policy produced either entry first.
        let mut aggregate: BTreeMap<(String, String), (Effect, Vec<String>)> = BTreeMap::new();

        for policy in &applicable {
            for stmt in &policy.document.0.statement {
                for action in stmt.action.as_slice() {
                    for resource in stmt.resource.as_slice() {
                        let key = (resource.clone(), action.clone());
                        match aggregate.get_mut(&key) {
                            Some((existing_effect, sources)) => {
                                if *existing_effect == Effect::Deny {
                                    if stmt.effect == Effect::Deny {
                                        sources.push(policy.name.clone());
                                    }
                                    // an existing Deny is never displaced by an Allow
                                } else if stmt.effect == Effect::Deny {
                                    *existing_effect = Effect::Deny;
                                    *sources = vec![policy.name.clone()];
                                } else {
                                    sources.push(policy.name.clone());
                                }
                            }
                            None => {
                                aggregate.insert(key, (stmt.effect, vec![policy.name.clone()]));
                            }
                        }
                    }
                }
            }
        }

        let mut entries: Vec<EffectivePermissionEntry> = aggregate
            .into_iter()
            .map(|((resource, action), (effect, mut source_policies))| {
                source_policies.sort();
                source_policies.dedup();
                EffectivePermissionEntry { resource, action, effect, source_policies }
            })
            .collect();
        entries.sort_by(|a, b| (a.resource.as_str(), a.action.as_str()).cmp(&(b.resource.as_str(), b.action.as_str())));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::document::PolicyDocument;
    use crate::models::policy::Policy;

    fn policy(org: Uuid, name: &str, json: serde_json::Value) -> Policy {
        let doc: PolicyDocument = serde_json::from_value(json).unwrap();
        Policy::new(org, name.into(), doc, Effect::Deny, "identity".into())
    }

    #[test]
    fn deny_overrides_allow_for_the_same_pair_regardless_of_order() {
        let org = Uuid::new_v4();
        let allow = policy(
            org,
            "allow-all",
            serde_json::json!({"Version": "1", "Statement": [{"Effect": "Allow", "Action": "user:delete", "Resource": "arn:a"}]}),
        );
        let deny = policy(
            org,
            "deny-delete",
            serde_json::json!({"Version": "1", "Statement": [{"Effect": "Deny", "Action": "user:delete", "Resource": "arn:a"}]}),
        );

        let mut aggregate: BTreeMap<(String, String), (Effect, Vec<String>)> = BTreeMap::new();
        for policy in [&allow, &deny] {
            for stmt in &policy.document.0.statement {
                for action in stmt.action.as_slice() {
                    for resource in stmt.resource.as_slice() {
                        let key = (resource.clone(), action.clone());
                        match aggregate.get_mut(&key) {
                            Some((existing_effect, sources)) => {
                                if *existing_effect != Effect::Deny && stmt.effect == Effect::Deny {
                                    *existing_effect = Effect::Deny;
                                    *sources = vec![policy.name.clone()];
                                }
                            }
                            None => {
                                aggregate.insert(key, (stmt.effect, vec![policy.name.clone()]));
                            }
                        }
                    }
                }
            }
        }

        let (effect, sources) = aggregate.get(&("arn:a".to_string(), "user:delete".to_string())).unwrap();
        assert_eq!(*effect, Effect::Deny);
        assert_eq!(sources, &vec!["deny-delete".to_string()]);
    }
}
