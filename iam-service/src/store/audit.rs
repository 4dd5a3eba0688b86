//! AuditEvent store (§3, §4.7). Append-only: there is deliberately no
//! update or delete here. `list_for_organization` exists only for the
//! read-only audit listing handler — nothing in the decision path calls
//! it (§4.7: "never consult AuditEvents when producing an authorization
//! decision").

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::audit::AuditEvent;

pub async fn insert<'e, E>(exec: E, event: &AuditEvent) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO audit_events
            (event_id, timestamp, organization_id, principal_id, principal_type, session_id,
             action, resource_type, resource_id, resource_arn, result, error_message,
             ip_address, user_agent, request_id, additional_context, severity)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(&event.event_id)
    .bind(event.timestamp)
    .bind(event.organization_id)
    .bind(event.principal_id)
    .bind(event.principal_type)
    .bind(event.session_id)
    .bind(&event.action)
    .bind(&event.resource_type)
    .bind(&event.resource_id)
    .bind(&event.resource_arn)
    .bind(event.result)
    .bind(&event.error_message)
    .bind(&event.ip_address)
    .bind(&event.user_agent)
    .bind(&event.request_id)
    .bind(&event.additional_context)
    .bind(event.severity)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn list_for_organization<'e, E>(
    exec: E,
    organization_id: Uuid,
    limit: i64,
) -> Result<Vec<AuditEvent>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let events = sqlx::query_as::<_, AuditEvent>(
        "SELECT * FROM audit_events WHERE organization_id = $1 ORDER BY timestamp DESC LIMIT $2",
    )
    .bind(organization_id)
    .bind(limit)
    .fetch_all(exec)
    .await?;
    Ok(events)
}
