use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::role::{Role, RolePolicy};

pub async fn insert<'e, E>(exec: E, role: &Role) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO roles
            (role_id, organization_id, name, max_session_duration_seconds,
             trust_policy, assume_conditions, is_system, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(role.role_id)
    .bind(role.organization_id)
    .bind(&role.name)
    .bind(role.max_session_duration_seconds)
    .bind(&role.trust_policy)
    .bind(&role.assume_conditions)
    .bind(role.is_system)
    .bind(role.status)
    .bind(role.created_at)
    .bind(role.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E>(exec: E, organization_id: Uuid, role_id: Uuid) -> Result<Option<Role>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let role = sqlx::query_as::<_, Role>(
        "SELECT * FROM roles WHERE role_id = $1 AND organization_id = $2 AND deleted_at IS NULL",
    )
    .bind(role_id)
    .bind(organization_id)
    .fetch_optional(exec)
    .await?;
    Ok(role)
}

pub async fn list_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<Role>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE organization_id = $1 AND deleted_at IS NULL")
        .bind(organization_id)
        .fetch_all(exec)
        .await?;
    Ok(roles)
}

pub async fn attach_policy<'e, E>(exec: E, attachment: &RolePolicy) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO role_policies (role_id, policy_id, attached_by, attached_at) VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
    )
    .bind(attachment.role_id)
    .bind(attachment.policy_id)
    .bind(attachment.attached_by)
    .bind(attachment.attached_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn detach_policy<'e, E>(exec: E, role_id: Uuid, policy_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("DELETE FROM role_policies WHERE role_id = $1 AND policy_id = $2")
        .bind(role_id)
        .bind(policy_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn list_policies_for_roles<'e, E>(exec: E, role_ids: &[Uuid]) -> Result<Vec<RolePolicy>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let attachments = sqlx::query_as::<_, RolePolicy>("SELECT * FROM role_policies WHERE role_id = ANY($1)")
        .bind(role_ids)
        .fetch_all(exec)
        .await?;
    Ok(attachments)
}
