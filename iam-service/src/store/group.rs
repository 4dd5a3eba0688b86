//! Group store (§3). Group parent links are acyclic (§8 property 9);
//! cycle detection walks the parent chain at write time using the same
//! store connection, so it sees uncommitted siblings within a transaction.

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::group::Group;

pub async fn insert<'e, E>(exec: E, group: &Group) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO groups
            (group_id, organization_id, name, parent_group_id, group_type, max_members, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(group.group_id)
    .bind(group.organization_id)
    .bind(&group.name)
    .bind(group.parent_group_id)
    .bind(&group.group_type)
    .bind(group.max_members)
    .bind(group.created_at)
    .bind(group.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E>(exec: E, organization_id: Uuid, group_id: Uuid) -> Result<Option<Group>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let group = sqlx::query_as::<_, Group>(
        "SELECT * FROM groups WHERE group_id = $1 AND organization_id = $2 AND deleted_at IS NULL",
    )
    .bind(group_id)
    .bind(organization_id)
    .fetch_optional(exec)
    .await?;
    Ok(group)
}

pub async fn list_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<Group>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let groups = sqlx::query_as::<_, Group>(
        "SELECT * FROM groups WHERE organization_id = $1 AND deleted_at IS NULL",
    )
    .bind(organization_id)
    .fetch_all(exec)
    .await?;
    Ok(groups)
}

pub async fn soft_delete<'e, E>(exec: E, group_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE groups SET deleted_at = now(), updated_at = now() WHERE group_id = $1")
        .bind(group_id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Walks `candidate_parent`'s own parent chain looking for `group_id`
/// (§8 property 9: inserting a parent link that would create a cycle is
/// rejected). Bounded by the organization's group count via `deleted_at
/// IS NULL` filtering on every hop, same as any other lookup.
pub async fn would_create_cycle<'e, E>(
    exec: E,
    organization_id: Uuid,
    group_id: Uuid,
    candidate_parent: Uuid,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Postgres> + Copy,
{
    let mut current = Some(candidate_parent);
    let mut hops = 0;
    while let Some(parent_id) = current {
        if parent_id == group_id {
            return Ok(true);
        }
        hops += 1;
        if hops > 10_000 {
            // A well-formed acyclic chain can't be this long; treat as a
            // cycle rather than loop forever on corrupted data.
            return Ok(true);
        }
        current = find_by_id(exec, organization_id, parent_id)
            .await?
            .and_then(|g| g.parent_group_id);
    }
    Ok(false)
}
