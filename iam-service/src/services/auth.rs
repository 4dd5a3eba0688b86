//! Authentication path (§4.6, expanded in SPEC_FULL.md §13): password
//! login, lockout/backoff bookkeeping, and session issuance on success.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::config::LoginSecurityConfig;
use crate::models::audit::{AuditEventBuilder, AuditResult, AuditSeverity};
use crate::models::principal::PrincipalId;
use crate::models::session::Session;
use crate::models::user::User;
use crate::services::audit::AuditService;
use crate::services::mfa::MfaVerifier;
use crate::services::session_manager::SessionManager;
use crate::store;
use crate::utils::password::{verify_password, Password, PasswordHashString};

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    sessions: SessionManager,
    audit: AuditService,
    mfa: Arc<dyn MfaVerifier>,
    login_security: LoginSecurityConfig,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        sessions: SessionManager,
        audit: AuditService,
        mfa: Arc<dyn MfaVerifier>,
        login_security: LoginSecurityConfig,
    ) -> Self {
        Self { pool, sessions, audit, mfa, login_security }
    }

    /// §7 rule: login failures only ever distinguish
    /// `{invalid credentials, account locked, MFA required}` and never
    /// reveal whether an email is registered in the organization — a
    /// missing user and a wrong password return the identical error.
    pub async fn login(
        &self,
        organization_id: Uuid,
        email: &str,
        password: &str,
        mfa_code: Option<&str>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<(Session, User), AppError> {
        let now = Utc::now();

        let Some(user) = store::user::find_by_email_in_organization(&self.pool, organization_id, email).await?
        else {
            self.audit_failure(organization_id, None, "invalid credentials", ip_address.as_deref()).await;
            return Err(AppError::unauthorized("invalid credentials"));
        };

        if user.is_locked(now) {
            let locked_until = user.locked_until.expect("is_locked implies locked_until is set");
            self.audit_failure(
                organization_id,
                Some(PrincipalId::user(user.user_id)),
                "account locked",
                ip_address.as_deref(),
            )
            .await;
            return Err(AppError::AccountLocked { locked_until });
        }

        let password_hash = PasswordHashString::new(user.password_hash.clone());
        let password_ok = verify_password(&Password::new(password.to_string()), &password_hash).is_ok();
        if !password_ok {
            self.record_failed_attempt(&user, now).await?;
            self.audit_failure(
                organization_id,
                Some(PrincipalId::user(user.user_id)),
                "invalid credentials",
                ip_address.as_deref(),
            )
            .await;
            return Err(AppError::unauthorized("invalid credentials"));
        }

        if !self.mfa.verify(&user, mfa_code).await? {
            self.audit_failure(
                organization_id,
                Some(PrincipalId::user(user.user_id)),
                "mfa required",
                ip_address.as_deref(),
            )
            .await;
            return Err(AppError::MfaRequired);
        }

        store::user::record_successful_login(&self.pool, user.user_id, now).await?;

        let session = self
            .sessions
            .issue(
                organization_id,
                PrincipalId::user(user.user_id),
                None,
                None,
                mfa_code.is_some(),
                ip_address,
                user_agent,
                None,
            )
            .await?;

        let event = AuditEventBuilder::new("auth.login", AuditResult::Success)
            .organization(organization_id)
            .principal(PrincipalId::user(user.user_id))
            .session(session.session_id)
            .severity(AuditSeverity::Info)
            .build();
        self.audit.record(event).await;

        Ok((session, user))
    }

    /// Exponential backoff once the failed-attempt count passes the
    /// configured threshold: `base * 2^(attempts - threshold)`, capped at
    /// `max_backoff_seconds` (§13).
    async fn record_failed_attempt(&self, user: &User, now: chrono::DateTime<Utc>) -> Result<(), AppError> {
        let attempts = user.failed_login_attempts + 1;
        let threshold = self.login_security.failed_login_threshold as i32;
        let locked_until = if attempts >= threshold {
            let exponent = (attempts - threshold).min(32) as u32;
            let backoff = self
                .login_security
                .base_backoff_seconds
                .saturating_mul(1i64 << exponent)
                .min(self.login_security.max_backoff_seconds);
            Some(now + Duration::seconds(backoff))
        } else {
            None
        };
        store::user::record_failed_login(&self.pool, user.user_id, attempts, locked_until).await
    }

    async fn audit_failure(
        &self,
        organization_id: Uuid,
        principal: Option<PrincipalId>,
        message: &str,
        ip_address: Option<&str>,
    ) {
        let mut builder = AuditEventBuilder::new("auth.login", AuditResult::Failure)
            .organization(organization_id)
            .error_message(message)
            .severity(AuditSeverity::Warn);
        if let Some(principal) = principal {
            builder = builder.principal(principal);
        }
        if let Some(ip) = ip_address {
            builder = builder.ip_address(ip);
        }
        self.audit.record(builder.build()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        let base = 30i64;
        let max = 3600i64;
        let threshold = 5i32;
        let backoff_at = |attempts: i32| -> i64 {
            let exponent = (attempts - threshold).max(0).min(32) as u32;
            base.saturating_mul(1i64 << exponent).min(max)
        };
        assert_eq!(backoff_at(5), 30);
        assert_eq!(backoff_at(6), 60);
        assert_eq!(backoff_at(7), 120);
        assert_eq!(backoff_at(20), 3600);
    }
}
