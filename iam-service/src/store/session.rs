//! Session store (§3, §4.5). Store is authoritative; the session manager
//! service layers Cache coherence on top of these primitives.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::principal::PrincipalId;
use crate::models::session::{Session, SessionStatus};

pub async fn insert<'e, E>(exec: E, session: &Session) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO sessions
            (session_id, token, organization_id, principal_id, principal_type, assumed_role_id,
             mfa_verified, ip_address, user_agent, device_fingerprint, issued_at, expires_at,
             last_used_at, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(session.session_id)
    .bind(&session.token)
    .bind(session.organization_id)
    .bind(session.principal_id)
    .bind(session.principal_type)
    .bind(session.assumed_role_id)
    .bind(session.mfa_verified)
    .bind(&session.ip_address)
    .bind(&session.user_agent)
    .bind(&session.device_fingerprint)
    .bind(session.issued_at)
    .bind(session.expires_at)
    .bind(session.last_used_at)
    .bind(session.status)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_token<'e, E>(exec: E, token: &str) -> Result<Option<Session>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = $1")
        .bind(token)
        .fetch_optional(exec)
        .await?;
    Ok(session)
}

pub async fn find_by_id<'e, E>(exec: E, session_id: Uuid) -> Result<Option<Session>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE session_id = $1")
        .bind(session_id)
        .fetch_optional(exec)
        .await?;
    Ok(session)
}

pub async fn list_for_principal<'e, E>(
    exec: E,
    organization_id: Uuid,
    principal: PrincipalId,
) -> Result<Vec<Session>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sessions = sqlx::query_as::<_, Session>(
        "SELECT * FROM sessions WHERE organization_id = $1 AND principal_id = $2 AND principal_type = $3",
    )
    .bind(organization_id)
    .bind(principal.id)
    .bind(principal.principal_type)
    .fetch_all(exec)
    .await?;
    Ok(sessions)
}

pub async fn list_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<Session>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sessions = sqlx::query_as::<_, Session>(
        "SELECT * FROM sessions WHERE organization_id = $1 ORDER BY issued_at DESC",
    )
    .bind(organization_id)
    .fetch_all(exec)
    .await?;
    Ok(sessions)
}

pub async fn set_status<'e, E>(exec: E, session_id: Uuid, status: SessionStatus) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE sessions SET status = $1 WHERE session_id = $2")
        .bind(status)
        .bind(session_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn revoke<'e, E>(exec: E, session_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    set_status(exec, session_id, SessionStatus::Revoked).await
}

/// Revokes every currently-active session for a principal in one
/// statement (§4.5 `RevokeAllUserSessions`), returning the tokens of the
/// rows it touched so the caller can invalidate the matching Cache
/// entries.
pub async fn revoke_all_for_principal<'e, E>(
    exec: E,
    organization_id: Uuid,
    principal: PrincipalId,
) -> Result<Vec<String>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        UPDATE sessions SET status = 'revoked'
        WHERE organization_id = $1 AND principal_id = $2 AND principal_type = $3 AND status = 'active'
        RETURNING token
        "#,
    )
    .bind(organization_id)
    .bind(principal.id)
    .bind(principal.principal_type)
    .fetch_all(exec)
    .await?;
    Ok(rows.into_iter().map(|(token,)| token).collect())
}

pub async fn touch_last_used<'e, E>(exec: E, session_id: Uuid, now: DateTime<Utc>) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE sessions SET last_used_at = $1 WHERE session_id = $2")
        .bind(now)
        .bind(session_id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Idempotent sweep (§4.5): flips every row whose expiry has passed but
/// whose status column still says active. Safe under concurrent
/// execution from multiple replicas — the `WHERE` clause guarantees each
/// row transitions at most once.
pub async fn sweep_expired<'e, E>(exec: E, now: DateTime<Utc>) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("UPDATE sessions SET status = 'expired' WHERE status = 'active' AND expires_at < $1")
        .bind(now)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}
