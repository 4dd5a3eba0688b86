//! GroupMembership store (§3, §4.4).

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::membership::GroupMembership;
use crate::models::principal::PrincipalType;

pub async fn insert<'e, E>(exec: E, membership: &GroupMembership) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO group_memberships
            (group_membership_id, organization_id, group_id, principal_id, principal_type,
             role_in_group, joined_at, expires_at, added_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(membership.group_membership_id)
    .bind(membership.organization_id)
    .bind(membership.group_id)
    .bind(membership.principal_id)
    .bind(membership.principal_type)
    .bind(membership.role_in_group)
    .bind(membership.joined_at)
    .bind(membership.expires_at)
    .bind(membership.added_by)
    .execute(exec)
    .await?;
    Ok(())
}

/// All memberships in the organization — the permission resolver (§4.4)
/// needs the whole graph to walk nested-group membership transitively,
/// not just one principal's direct rows.
pub async fn list_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<GroupMembership>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let memberships = sqlx::query_as::<_, GroupMembership>(
        "SELECT * FROM group_memberships WHERE organization_id = $1",
    )
    .bind(organization_id)
    .fetch_all(exec)
    .await?;
    Ok(memberships)
}

pub async fn list_for_group<'e, E>(exec: E, group_id: Uuid) -> Result<Vec<GroupMembership>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let memberships =
        sqlx::query_as::<_, GroupMembership>("SELECT * FROM group_memberships WHERE group_id = $1")
            .bind(group_id)
            .fetch_all(exec)
            .await?;
    Ok(memberships)
}

pub async fn remove<'e, E>(
    exec: E,
    group_id: Uuid,
    principal_id: Uuid,
    principal_type: PrincipalType,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "DELETE FROM group_memberships WHERE group_id = $1 AND principal_id = $2 AND principal_type = $3",
    )
    .bind(group_id)
    .bind(principal_id)
    .bind(principal_type)
    .execute(exec)
    .await?;
    Ok(())
}
