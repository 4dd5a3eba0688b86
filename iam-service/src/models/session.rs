//! Session model (§3, §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::principal::{PrincipalId, PrincipalType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Expired,
    Revoked,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub session_id: Uuid,
    pub token: String,
    pub organization_id: Uuid,
    pub principal_id: Uuid,
    pub principal_type: PrincipalType,
    pub assumed_role_id: Option<Uuid>,
    pub mfa_verified: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_fingerprint: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub status: SessionStatus,
}

impl Session {
    pub fn principal(&self) -> PrincipalId {
        PrincipalId {
            id: self.principal_id,
            principal_type: self.principal_type,
        }
    }

    /// Expiry takes precedence over the stored status column (§3 invariant,
    /// testable property 3): a row whose `expires_at` has passed is treated
    /// as expired no matter what `status` currently says.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Active && self.expires_at > now
    }

    pub fn effective_status(&self, now: DateTime<Utc>) -> SessionStatus {
        if self.status == SessionStatus::Revoked {
            SessionStatus::Revoked
        } else if self.expires_at <= now {
            SessionStatus::Expired
        } else {
            self.status
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub organization_id: Uuid,
    pub principal_id: Uuid,
    pub principal_type: PrincipalType,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: SessionStatus,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            session_id: s.session_id,
            organization_id: s.organization_id,
            principal_id: s.principal_id,
            principal_type: s.principal_type,
            issued_at: s.issued_at,
            expires_at: s.expires_at,
            status: s.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(status: SessionStatus, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            session_id: Uuid::new_v4(),
            token: "tok".into(),
            organization_id: Uuid::new_v4(),
            principal_id: Uuid::new_v4(),
            principal_type: PrincipalType::User,
            assumed_role_id: None,
            mfa_verified: true,
            ip_address: None,
            user_agent: None,
            device_fingerprint: None,
            issued_at: now - Duration::hours(1),
            expires_at: now + expires_in,
            last_used_at: now,
            status,
        }
    }

    #[test]
    fn expired_expiry_wins_over_active_status_column() {
        let s = sample(SessionStatus::Active, Duration::seconds(-1));
        let now = Utc::now();
        assert!(!s.is_active(now));
        assert_eq!(s.effective_status(now), SessionStatus::Expired);
    }

    #[test]
    fn revoked_wins_even_if_not_yet_expired() {
        let s = sample(SessionStatus::Revoked, Duration::hours(1));
        let now = Utc::now();
        assert!(!s.is_active(now));
        assert_eq!(s.effective_status(now), SessionStatus::Revoked);
    }
}
