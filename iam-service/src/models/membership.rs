//! GroupMembership — binds a principal into a group (§3, §4.4). A group
//! assigned a role passes that role to its unexpired members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::group::GroupMemberRole;
use crate::models::principal::{PrincipalId, PrincipalType};

#[derive(Debug, Clone, FromRow)]
pub struct GroupMembership {
    pub group_membership_id: Uuid,
    pub organization_id: Uuid,
    pub group_id: Uuid,
    pub principal_id: Uuid,
    pub principal_type: PrincipalType,
    pub role_in_group: GroupMemberRole,
    pub joined_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub added_by: Uuid,
}

impl GroupMembership {
    pub fn new(
        organization_id: Uuid,
        group_id: Uuid,
        principal: PrincipalId,
        role_in_group: GroupMemberRole,
        added_by: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            group_membership_id: Uuid::new_v4(),
            organization_id,
            group_id,
            principal_id: principal.id,
            principal_type: principal.principal_type,
            role_in_group,
            joined_at: Utc::now(),
            expires_at,
            added_by,
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
pub struct AddGroupMemberRequest {
    pub principal_id: Uuid,
    pub principal_type: PrincipalType,
    pub role_in_group: GroupMemberRole,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct GroupMembershipResponse {
    pub group_membership_id: Uuid,
    pub group_id: Uuid,
    pub principal_id: Uuid,
    pub principal_type: PrincipalType,
    pub role_in_group: GroupMemberRole,
}

impl From<GroupMembership> for GroupMembershipResponse {
    fn from(m: GroupMembership) -> Self {
        Self {
            group_membership_id: m.group_membership_id,
            group_id: m.group_id,
            principal_id: m.principal_id,
            principal_type: m.principal_type,
            role_in_group: m.role_in_group,
        }
    }
}
