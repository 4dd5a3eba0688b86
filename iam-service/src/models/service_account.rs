//! Service-account principal — a machine identity scoped to one organization.

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ServiceAccount {
    pub service_account_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub key_rotation_days: i32,
    pub allowed_ip_cidrs: Vec<String>,
    pub max_token_lifetime_seconds: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ServiceAccount {
    pub fn new(organization_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            service_account_id: Uuid::new_v4(),
            organization_id,
            name,
            key_rotation_days: 90,
            allowed_ip_cidrs: Vec::new(),
            max_token_lifetime_seconds: 3600,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether `ip` is permitted for this service account. An empty list
    /// means "no IP restriction" — consistent with the `IpAddress`
    /// condition operator, which is also opt-in per statement.
    pub fn permits_ip(&self, ip: std::net::IpAddr) -> bool {
        if self.allowed_ip_cidrs.is_empty() {
            return true;
        }
        self.allowed_ip_cidrs.iter().any(|cidr| {
            cidr.parse::<IpNet>()
                .map(|net| net.contains(&ip))
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceAccountRequest {
    pub name: String,
    pub allowed_ip_cidrs: Vec<String>,
    pub max_token_lifetime_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ServiceAccountResponse {
    pub service_account_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<ServiceAccount> for ServiceAccountResponse {
    fn from(s: ServiceAccount) -> Self {
        Self {
            service_account_id: s.service_account_id,
            organization_id: s.organization_id,
            name: s.name,
            created_at: s.created_at,
        }
    }
}
