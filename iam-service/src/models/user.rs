//! User principal — a human identity scoped to one organization (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub mfa_methods: Vec<String>,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(organization_id: Uuid, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            organization_id,
            email,
            password_hash,
            email_verified: false,
            mfa_methods: Vec::new(),
            failed_login_attempts: 0,
            locked_until: None,
            last_login: None,
            display_name: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    pub fn requires_mfa(&self) -> bool {
        !self.mfa_methods.is_empty()
    }

    pub fn mfa_method_set(&self) -> HashSet<&str> {
        self.mfa_methods.iter().map(String::as_str).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub mfa_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            organization_id: u.organization_id,
            email: u.email,
            email_verified: u.email_verified,
            display_name: u.display_name,
            created_at: u.created_at,
        }
    }
}
