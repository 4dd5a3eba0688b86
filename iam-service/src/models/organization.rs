//! Organization model — the tenant root (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The reserved organization that holds cross-tenant (`SuperAdmin`) actors.
/// Fixed, well-known id so the tenant guard never has to look it up by slug.
pub const SYSTEM_ORGANIZATION_ID: Uuid = Uuid::nil();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "organization_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    Active,
    Suspended,
    Deleted,
}

/// Per-tenant resource caps. Enforced at write time by the services that
/// create users/resources, not by the store layer itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrganizationLimits {
    pub max_users: i32,
    pub max_resources: i32,
}

impl Default for OrganizationLimits {
    fn default() -> Self {
        Self {
            max_users: 1_000,
            max_resources: 10_000,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Organization {
    pub organization_id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub settings: serde_json::Value,
    pub status: OrganizationStatus,
    pub max_users: i32,
    pub max_resources: i32,
    pub allowed_cors_origins: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Organization {
    pub fn new(name: String, slug: String, parent_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        let limits = OrganizationLimits::default();
        Self {
            organization_id: Uuid::new_v4(),
            name,
            slug,
            parent_id,
            settings: serde_json::json!({}),
            status: OrganizationStatus::Active,
            max_users: limits.max_users,
            max_resources: limits.max_resources,
            allowed_cors_origins: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_system(&self) -> bool {
        self.organization_id == SYSTEM_ORGANIZATION_ID
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// `[a-z0-9-]+`, matching the ARN and tenant-slug grammar fixed in §3/§6.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub organization_id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub status: OrganizationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Organization> for OrganizationResponse {
    fn from(o: Organization) -> Self {
        Self {
            organization_id: o.organization_id,
            name: o.name,
            slug: o.slug,
            parent_id: o.parent_id,
            status: o.status,
            created_at: o.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_grammar_rejects_uppercase_and_punctuation() {
        assert!(is_valid_slug("acme-corp-1"));
        assert!(!is_valid_slug("Acme"));
        assert!(!is_valid_slug("acme_corp"));
        assert!(!is_valid_slug(""));
    }
}
