//! Role model — a named, assignable bundle of attached policies (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::policy::PolicyStatus;

#[derive(Debug, Clone, FromRow)]
pub struct Role {
    pub role_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub max_session_duration_seconds: Option<i64>,
    pub trust_policy: serde_json::Value,
    pub assume_conditions: serde_json::Value,
    pub is_system: bool,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Role {
    pub fn new(organization_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            role_id: Uuid::new_v4(),
            organization_id,
            name,
            max_session_duration_seconds: None,
            trust_policy: serde_json::json!({}),
            assume_conditions: serde_json::json!({}),
            is_system: false,
            status: PolicyStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Many-to-many join between [`Role`] and `Policy`. The pair
/// `(role_id, policy_id)` is unique (§3).
#[derive(Debug, Clone, FromRow)]
pub struct RolePolicy {
    pub role_id: Uuid,
    pub policy_id: Uuid,
    pub attached_by: Uuid,
    pub attached_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub max_session_duration_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AttachPolicyRequest {
    pub policy_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub max_session_duration_seconds: Option<i64>,
}

impl From<Role> for RoleResponse {
    fn from(r: Role) -> Self {
        Self {
            role_id: r.role_id,
            organization_id: r.organization_id,
            name: r.name,
            max_session_duration_seconds: r.max_session_duration_seconds,
        }
    }
}
