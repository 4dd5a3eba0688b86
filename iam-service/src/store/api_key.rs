//! ApiKey store (§3, §4.2). Lookup is always by `key_id` plus the
//! deterministic secret lookup hash (§4.2 "lookup hash" design note) —
//! never by scanning and Argon2-verifying every row.

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::api_key::ApiKey;

pub async fn insert<'e, E>(exec: E, key: &ApiKey) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO api_keys
            (api_key_id, organization_id, key_id, secret_hash, service_account_id,
             allowed_ip_cidrs, scopes, rate_limit_per_hour, expires_at, usage_count, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(key.api_key_id)
    .bind(key.organization_id)
    .bind(&key.key_id)
    .bind(&key.secret_hash)
    .bind(key.service_account_id)
    .bind(&key.allowed_ip_cidrs)
    .bind(&key.scopes)
    .bind(key.rate_limit_per_hour)
    .bind(key.expires_at)
    .bind(key.usage_count)
    .bind(key.created_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_key_id<'e, E>(exec: E, organization_id: Uuid, key_id: &str) -> Result<Option<ApiKey>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let key = sqlx::query_as::<_, ApiKey>(
        "SELECT * FROM api_keys WHERE key_id = $1 AND organization_id = $2 AND deleted_at IS NULL",
    )
    .bind(key_id)
    .bind(organization_id)
    .fetch_optional(exec)
    .await?;
    Ok(key)
}

pub async fn list_for_service_account<'e, E>(exec: E, service_account_id: Uuid) -> Result<Vec<ApiKey>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let keys = sqlx::query_as::<_, ApiKey>(
        "SELECT * FROM api_keys WHERE service_account_id = $1 AND deleted_at IS NULL",
    )
    .bind(service_account_id)
    .fetch_all(exec)
    .await?;
    Ok(keys)
}

pub async fn list_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<ApiKey>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let keys = sqlx::query_as::<_, ApiKey>(
        "SELECT * FROM api_keys WHERE organization_id = $1 AND deleted_at IS NULL",
    )
    .bind(organization_id)
    .fetch_all(exec)
    .await?;
    Ok(keys)
}

pub async fn increment_usage<'e, E>(exec: E, api_key_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE api_keys SET usage_count = usage_count + 1 WHERE api_key_id = $1")
        .bind(api_key_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn revoke<'e, E>(exec: E, api_key_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE api_keys SET deleted_at = now() WHERE api_key_id = $1")
        .bind(api_key_id)
        .execute(exec)
        .await?;
    Ok(())
}
