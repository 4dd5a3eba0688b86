//! Group principal — a collection of principals that can itself hold role
//! assignments (§3, §4.4). Groups nest (no cycles) and can be assigned a
//! role directly; membership lets that role flow to members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Group {
    pub group_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub parent_group_id: Option<Uuid>,
    pub group_type: String,
    pub max_members: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Group {
    pub fn new(organization_id: Uuid, name: String, group_type: String) -> Self {
        let now = Utc::now();
        Self {
            group_id: Uuid::new_v4(),
            organization_id,
            name,
            parent_group_id: None,
            group_type,
            max_members: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// A principal's role within a group membership — distinct from org-wide
/// roles. `Owner`/`Admin` exist for group self-administration (adding or
/// removing members); they carry no implicit authorization-engine weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "group_member_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GroupMemberRole {
    Member,
    Admin,
    Owner,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub parent_group_id: Option<Uuid>,
    pub group_type: String,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub group_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub parent_group_id: Option<Uuid>,
    pub group_type: String,
}

impl From<Group> for GroupResponse {
    fn from(g: Group) -> Self {
        Self {
            group_id: g.group_id,
            organization_id: g.organization_id,
            name: g.name,
            parent_group_id: g.parent_group_id,
            group_type: g.group_type,
        }
    }
}
