//! APIKey model — long-lived credential for a service account (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use subtle::ConstantTimeEq;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ApiKey {
    pub api_key_id: Uuid,
    pub organization_id: Uuid,
    pub key_id: String,
    pub secret_hash: String,
    pub service_account_id: Uuid,
    pub allowed_ip_cidrs: Vec<String>,
    pub scopes: Vec<String>,
    pub rate_limit_per_hour: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == "*" || s == scope)
    }

    /// Compares `raw_secret`'s lookup hash against `self.secret_hash` in
    /// constant time, so a timing side channel can't leak how many
    /// leading hex characters of a guessed secret matched (mirrors the
    /// teacher's `verify_signature` HMAC compare).
    pub fn verify_secret(&self, raw_secret: &str) -> bool {
        let computed = lookup_hash(raw_secret);
        let expected = self.secret_hash.as_bytes();
        let actual = computed.as_bytes();
        expected.len() == actual.len() && bool::from(expected.ct_eq(actual))
    }
}

/// Hashes a raw API key secret for storage and comparison. Unlike a user
/// password, the secret is already high-entropy (generated, never
/// user-chosen), so a deterministic SHA-256 digest — compared in
/// constant time by [`ApiKey::verify_secret`] — is enough; there's no
/// dictionary-attack surface an Argon2 salt would defend against.
/// Mirrors the teacher's `calculate_lookup_hash` pattern.
pub fn lookup_hash(raw_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub service_account_id: Uuid,
    pub allowed_ip_cidrs: Vec<String>,
    pub scopes: Vec<String>,
    pub rate_limit_per_hour: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub api_key_id: Uuid,
    pub key_id: String,
    pub service_account_id: Uuid,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(k: ApiKey) -> Self {
        Self {
            api_key_id: k.api_key_id,
            key_id: k.key_id,
            service_account_id: k.service_account_id,
            scopes: k.scopes,
            expires_at: k.expires_at,
        }
    }
}

/// The one-time response to a key-creation call: the raw secret is never
/// persisted or retrievable again after this.
#[derive(Debug, Serialize)]
pub struct ApiKeyCreatedResponse {
    pub key_id: String,
    pub secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(secret_hash: String) -> ApiKey {
        ApiKey {
            api_key_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            key_id: "key_abc".into(),
            secret_hash,
            service_account_id: Uuid::new_v4(),
            allowed_ip_cidrs: vec![],
            scopes: vec![],
            rate_limit_per_hour: 1000,
            expires_at: None,
            usage_count: 0,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn verify_secret_accepts_the_matching_raw_secret() {
        let key = sample(lookup_hash("correct-horse-battery-staple"));
        assert!(key.verify_secret("correct-horse-battery-staple"));
    }

    #[test]
    fn verify_secret_rejects_a_wrong_secret() {
        let key = sample(lookup_hash("correct-horse-battery-staple"));
        assert!(!key.verify_secret("wrong-secret"));
    }
}
