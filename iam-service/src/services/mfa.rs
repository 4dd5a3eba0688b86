//! MFA verification collaborator.
//!
//! §1's Non-goals put email/SMS MFA code delivery and TOTP secret
//! provisioning out of scope — `User.mfa_methods` only stores method-name
//! tags (§3), no secret material. Modeled the way the teacher injects
//! `EmailProvider`/`JwtService` as trait objects into its service layer:
//! `AuthService` takes an `Arc<dyn MfaVerifier>` rather than hard-coding a
//! TOTP/OTP implementation this crate has no schema to back.

use async_trait::async_trait;

use iam_core::error::AppError;

use crate::models::user::User;

#[async_trait]
pub trait MfaVerifier: Send + Sync {
    /// Returns whether `code` satisfies the MFA requirement for `user`.
    /// Users with no enrolled methods always pass without a code.
    async fn verify(&self, user: &User, code: Option<&str>) -> Result<bool, AppError>;
}

/// Default verifier for deployments with no external MFA provider wired
/// in: a user with enrolled methods must supply *some* code, but this
/// verifier cannot itself validate a TOTP/OTP value against a secret it
/// was never given one to check.
pub struct PresenceOnlyMfaVerifier;

#[async_trait]
impl MfaVerifier for PresenceOnlyMfaVerifier {
    async fn verify(&self, user: &User, code: Option<&str>) -> Result<bool, AppError> {
        if !user.requires_mfa() {
            return Ok(true);
        }
        Ok(code.is_some_and(|c| !c.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::principal::PrincipalType;
    use uuid::Uuid;

    fn user_with_mfa(methods: Vec<String>) -> User {
        let mut u = User::new(Uuid::new_v4(), "a@b.com".into(), "hash".into());
        u.mfa_methods = methods;
        let _ = PrincipalType::User;
        u
    }

    #[tokio::test]
    async fn users_without_mfa_methods_pass_with_no_code() {
        let user = user_with_mfa(vec![]);
        let ok = PresenceOnlyMfaVerifier.verify(&user, None).await.unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn users_with_mfa_methods_require_a_nonempty_code() {
        let user = user_with_mfa(vec!["totp".into()]);
        assert!(!PresenceOnlyMfaVerifier.verify(&user, None).await.unwrap());
        assert!(!PresenceOnlyMfaVerifier.verify(&user, Some("")).await.unwrap());
        assert!(PresenceOnlyMfaVerifier.verify(&user, Some("123456")).await.unwrap());
    }
}
