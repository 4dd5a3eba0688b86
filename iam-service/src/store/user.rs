use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::user::User;
use crate::tenant::TenantGuard;

pub async fn insert<'e, E>(exec: E, user: &User) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO users
            (user_id, organization_id, email, password_hash, email_verified, mfa_methods,
             failed_login_attempts, locked_until, last_login, display_name, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(user.user_id)
    .bind(user.organization_id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.email_verified)
    .bind(&user.mfa_methods)
    .bind(user.failed_login_attempts)
    .bind(user.locked_until)
    .bind(user.last_login)
    .bind(&user.display_name)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E>(exec: E, guard: TenantGuard, user_id: Uuid) -> Result<Option<User>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let user = match guard.organization_filter() {
        Some(org_id) => {
            sqlx::query_as::<_, User>(
                "SELECT * FROM users WHERE user_id = $1 AND organization_id = $2 AND deleted_at IS NULL",
            )
            .bind(user_id)
            .bind(org_id)
            .fetch_optional(exec)
            .await?
        }
        None => {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1 AND deleted_at IS NULL")
                .bind(user_id)
                .fetch_optional(exec)
                .await?
        }
    };
    Ok(user)
}

pub async fn find_by_email_in_organization<'e, E>(
    exec: E,
    organization_id: Uuid,
    email: &str,
) -> Result<Option<User>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE organization_id = $1 AND LOWER(email) = LOWER($2) AND deleted_at IS NULL",
    )
    .bind(organization_id)
    .bind(email)
    .fetch_optional(exec)
    .await?;
    Ok(user)
}

pub async fn list_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<User>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE organization_id = $1 AND deleted_at IS NULL",
    )
    .bind(organization_id)
    .fetch_all(exec)
    .await?;
    Ok(users)
}

pub async fn record_failed_login<'e, E>(
    exec: E,
    user_id: Uuid,
    attempts: i32,
    locked_until: Option<DateTime<Utc>>,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "UPDATE users SET failed_login_attempts = $1, locked_until = $2, updated_at = now() WHERE user_id = $3",
    )
    .bind(attempts)
    .bind(locked_until)
    .bind(user_id)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn record_successful_login<'e, E>(exec: E, user_id: Uuid, now: DateTime<Utc>) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, last_login = $1, updated_at = now() WHERE user_id = $2",
    )
    .bind(now)
    .bind(user_id)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn update_password_hash<'e, E>(exec: E, user_id: Uuid, password_hash: &str) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE user_id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn soft_delete<'e, E>(exec: E, user_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE users SET deleted_at = now(), updated_at = now() WHERE user_id = $1")
        .bind(user_id)
        .execute(exec)
        .await?;
    Ok(())
}
