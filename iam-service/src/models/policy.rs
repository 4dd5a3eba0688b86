//! Policy record — the versioned, stored wrapper around a policy document.
//!
//! The document grammar itself (`Statement`, `Effect`, the Action/Resource
//! pattern language) lives in [`crate::authz::document`]; this module owns
//! persistence concerns: the semver `version` column, status lifecycle, and
//! the `PolicyVersion` snapshot history (§4.2).

use crate::authz::document::PolicyDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "policy_effect", rename_all = "PascalCase")]
#[serde(rename_all = "PascalCase")]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "policy_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Draft,
    Active,
    Deprecated,
    Deleted,
}

#[derive(Debug, Clone, FromRow)]
pub struct Policy {
    pub policy_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    /// Semver-style `M.m.p`, bumped on every document change (§4.2). This
    /// is distinct from the document's own free-form `Version` label —
    /// see the Open Question in §9 resolved in DESIGN.md.
    pub version: String,
    pub document: sqlx::types::Json<PolicyDocument>,
    pub effect_default: Effect,
    pub policy_type: String,
    pub is_system: bool,
    pub status: PolicyStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Policy {
    pub fn new(
        organization_id: Uuid,
        name: String,
        document: PolicyDocument,
        effect_default: Effect,
        policy_type: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            policy_id: Uuid::new_v4(),
            organization_id,
            name,
            version: "1.0.0".to_string(),
            document: sqlx::types::Json(document),
            effect_default,
            policy_type,
            is_system: false,
            status: PolicyStatus::Active,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// An immutable snapshot of a policy's document at a point in time,
/// written before every overwrite (§4.2 versioning rule).
#[derive(Debug, Clone, FromRow)]
pub struct PolicyVersion {
    pub policy_version_id: Uuid,
    pub policy_id: Uuid,
    pub version: String,
    pub document: sqlx::types::Json<PolicyDocument>,
    pub created_by: Uuid,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
}

/// Bumps the patch component of a semver-style `M.m.p` version string.
/// Falls back to `1.0.1` when the current value doesn't parse — the
/// grammar is "best-effort semver", not validated on write (§4.2).
pub fn bump_patch(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() != 3 {
        return "1.0.1".to_string();
    }
    let (major, minor, patch) = (
        parts[0].parse::<u64>(),
        parts[1].parse::<u64>(),
        parts[2].parse::<u64>(),
    );
    match (major, minor, patch) {
        (Ok(maj), Ok(min), Ok(p)) => format!("{maj}.{min}.{}", p + 1),
        _ => "1.0.1".to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePolicyRequest {
    pub name: String,
    pub document: serde_json::Value,
    pub effect_default: Effect,
    pub policy_type: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePolicyRequest {
    pub document: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct RollbackPolicyRequest {
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub policy_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub version: String,
    pub status: PolicyStatus,
}

impl From<Policy> for PolicyResponse {
    fn from(p: Policy) -> Self {
        Self {
            policy_id: p.policy_id,
            organization_id: p.organization_id,
            name: p.name,
            version: p.version,
            status: p.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bumps_well_formed_semver() {
        assert_eq!(bump_patch("1.0.0"), "1.0.1");
        assert_eq!(bump_patch("2.3.9"), "2.3.10");
    }

    #[test]
    fn falls_back_on_unparseable_version() {
        assert_eq!(bump_patch("2024-01-01"), "1.0.1");
        assert_eq!(bump_patch("not-a-version"), "1.0.1");
    }
}
