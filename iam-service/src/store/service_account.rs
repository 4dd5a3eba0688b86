//! ServiceAccount store (§3, §4.2). Service accounts are principals in
//! their own right — the authz and session layers treat them through
//! `PrincipalId`, never through this module directly.

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::service_account::ServiceAccount;

pub async fn insert<'e, E>(exec: E, account: &ServiceAccount) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO service_accounts
            (service_account_id, organization_id, name, key_rotation_days, allowed_ip_cidrs,
             max_token_lifetime_seconds, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(account.service_account_id)
    .bind(account.organization_id)
    .bind(&account.name)
    .bind(account.key_rotation_days)
    .bind(&account.allowed_ip_cidrs)
    .bind(account.max_token_lifetime_seconds)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E>(
    exec: E,
    organization_id: Uuid,
    service_account_id: Uuid,
) -> Result<Option<ServiceAccount>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let account = sqlx::query_as::<_, ServiceAccount>(
        "SELECT * FROM service_accounts WHERE service_account_id = $1 AND organization_id = $2 AND deleted_at IS NULL",
    )
    .bind(service_account_id)
    .bind(organization_id)
    .fetch_optional(exec)
    .await?;
    Ok(account)
}

pub async fn list_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<ServiceAccount>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let accounts = sqlx::query_as::<_, ServiceAccount>(
        "SELECT * FROM service_accounts WHERE organization_id = $1 AND deleted_at IS NULL",
    )
    .bind(organization_id)
    .fetch_all(exec)
    .await?;
    Ok(accounts)
}

pub async fn soft_delete<'e, E>(exec: E, service_account_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE service_accounts SET deleted_at = now(), updated_at = now() WHERE service_account_id = $1")
        .bind(service_account_id)
        .execute(exec)
        .await?;
    Ok(())
}
