//! Cache layer (§2, §4.5, §4.6): a fast, TTL'd string->string store for
//! sessions and single-use tokens. Store is authoritative; this is a
//! read-through accelerator, never the system of record (§4.5 coherence
//! contract).
//!
//! Mirrors the teacher's `services::redis::RedisService` — a thin wrapper
//! around a `redis::aio::ConnectionManager` for automatic reconnection —
//! generalized from a single blacklist-flag use case to a generic keyed
//! TTL store, since the session manager, password-reset flow, and email
//! verification flow all need the same "set with TTL / get / delete"
//! shape against different key prefixes.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use iam_core::error::AppError;

/// Key prefixes fixed bit-exact by §6 ("Persisted state"): the Cache keys
/// live under one of these namespaces.
pub const SESSION_KEY_PREFIX: &str = "session:";
pub const PASSWORD_RESET_KEY_PREFIX: &str = "password_reset:";
pub const EMAIL_VERIFICATION_KEY_PREFIX: &str = "email_verification:";

pub fn session_key(token: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{token}")
}

pub fn password_reset_key(token: &str) -> String {
    format!("{PASSWORD_RESET_KEY_PREFIX}{token}")
}

pub fn email_verification_key(token: &str) -> String {
    format!("{EMAIL_VERIFICATION_KEY_PREFIX}{token}")
}

/// Generic keyed TTL cache. A trait so the session manager and auth
/// service can be exercised in tests against an in-memory stand-in
/// without a live Redis instance.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), AppError>;
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn new(url: &str) -> Result<Self, AppError> {
        tracing::info!("connecting to cache");
        let client = Client::open(url).map_err(|e| AppError::Infrastructure(anyhow::Error::new(e)))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| AppError::Infrastructure(anyhow::Error::new(e)))?;
        tracing::info!("cache connection established");
        Ok(Self { manager })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let ttl = ttl_seconds.max(1) as u64;
        conn.set_ex::<_, _, ()>(key, value, ttl).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// In-process stand-in for [`Cache`], used by unit tests that exercise
/// session/token coherence logic without a Redis instance.
#[derive(Default)]
pub struct InMemoryCache {
    entries: dashmap::DashMap<String, (String, std::time::Instant, std::time::Duration)>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), AppError> {
        self.entries.insert(
            key.to_string(),
            (
                value.to_string(),
                std::time::Instant::now(),
                std::time::Duration::from_secs(ttl_seconds.max(1) as u64),
            ),
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match self.entries.get(key) {
            Some(entry) => {
                let (value, inserted_at, ttl) = entry.value().clone();
                if inserted_at.elapsed() > ttl {
                    drop(entry);
                    self.entries.remove(key);
                    Ok(None)
                } else {
                    Ok(Some(value))
                }
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_cache_round_trips_a_value() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn in_memory_cache_expires_entries_past_ttl() {
        let cache = InMemoryCache::new();
        cache.entries.insert(
            "k".to_string(),
            (
                "v".to_string(),
                std::time::Instant::now() - std::time::Duration::from_secs(5),
                std::time::Duration::from_secs(1),
            ),
        );
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn session_key_uses_fixed_prefix() {
        assert_eq!(session_key("abc"), "session:abc");
        assert_eq!(password_reset_key("abc"), "password_reset:abc");
        assert_eq!(email_verification_key("abc"), "email_verification:abc");
    }
}
