//! Polymorphic principal identity used throughout the data plane.
//!
//! Every API that accepts "some identity" (a role assignment, a group
//! membership, an audit actor) takes a [`PrincipalId`] rather than a raw
//! UUID plus a string tag. This is deliberate: the teacher codebase this
//! grew out of passed `(user_id, tenant_id)` pairs in some call sites and
//! `(principal_id, principal_type)` pairs in others, and the two forms
//! drifted. There is exactly one shape here.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Discriminant for the three kinds of principal the system recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "principal_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PrincipalType {
    User,
    ServiceAccount,
    Group,
}

impl PrincipalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::User => "user",
            PrincipalType::ServiceAccount => "service_account",
            PrincipalType::Group => "group",
        }
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged identity: an id plus which table it lives in.
///
/// Equality and hashing are derived so this can key a `HashSet`/`HashMap`
/// directly (the permission resolver's cycle-detection set keys on this).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId {
    pub id: Uuid,
    pub principal_type: PrincipalType,
}

impl PrincipalId {
    pub fn user(id: Uuid) -> Self {
        Self {
            id,
            principal_type: PrincipalType::User,
        }
    }

    pub fn service_account(id: Uuid) -> Self {
        Self {
            id,
            principal_type: PrincipalType::ServiceAccount,
        }
    }

    pub fn group(id: Uuid) -> Self {
        Self {
            id,
            principal_type: PrincipalType::Group,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.principal_type, PrincipalType::Group)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.principal_type, self.id)
    }
}
