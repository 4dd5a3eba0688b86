//! RoleAssignment — a direct binding of a role to a principal (§3, §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::principal::{PrincipalId, PrincipalType};

#[derive(Debug, Clone, FromRow)]
pub struct RoleAssignment {
    pub role_assignment_id: Uuid,
    pub organization_id: Uuid,
    pub role_id: Uuid,
    pub principal_id: Uuid,
    pub principal_type: PrincipalType,
    pub assigned_by: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub conditions: serde_json::Value,
}

impl RoleAssignment {
    pub fn new(
        organization_id: Uuid,
        role_id: Uuid,
        principal: PrincipalId,
        assigned_by: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            role_assignment_id: Uuid::new_v4(),
            organization_id,
            role_id,
            principal_id: principal.id,
            principal_type: principal.principal_type,
            assigned_by,
            assigned_at: Utc::now(),
            expires_at,
            conditions: serde_json::json!({}),
        }
    }

    pub fn principal(&self) -> PrincipalId {
        PrincipalId {
            id: self.principal_id,
            principal_type: self.principal_type,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleAssignmentRequest {
    pub principal_id: Uuid,
    pub principal_type: PrincipalType,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RoleAssignmentResponse {
    pub role_assignment_id: Uuid,
    pub role_id: Uuid,
    pub principal_id: Uuid,
    pub principal_type: PrincipalType,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(a: RoleAssignment) -> Self {
        Self {
            role_assignment_id: a.role_assignment_id,
            role_id: a.role_id,
            principal_id: a.principal_id,
            principal_type: a.principal_type,
            expires_at: a.expires_at,
        }
    }
}
