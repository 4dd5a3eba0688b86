//! Resource store (§3, §4.2). ARNs are unique per organization; parent
//! links follow the same acyclicity rule as groups (§8 property 9).

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::resource::Resource;

pub async fn insert<'e, E>(exec: E, resource: &Resource) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO resources
            (resource_id, organization_id, arn, resource_type, parent_resource_id,
             owner_principal_id, owner_principal_type, attributes, tags, access_level,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(resource.resource_id)
    .bind(resource.organization_id)
    .bind(&resource.arn)
    .bind(resource.resource_type)
    .bind(resource.parent_resource_id)
    .bind(resource.owner_principal_id)
    .bind(resource.owner_principal_type)
    .bind(&resource.attributes)
    .bind(&resource.tags)
    .bind(&resource.access_level)
    .bind(resource.created_at)
    .bind(resource.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E>(exec: E, organization_id: Uuid, resource_id: Uuid) -> Result<Option<Resource>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let resource = sqlx::query_as::<_, Resource>(
        "SELECT * FROM resources WHERE resource_id = $1 AND organization_id = $2 AND deleted_at IS NULL",
    )
    .bind(resource_id)
    .bind(organization_id)
    .fetch_optional(exec)
    .await?;
    Ok(resource)
}

pub async fn find_by_arn<'e, E>(exec: E, organization_id: Uuid, arn: &str) -> Result<Option<Resource>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let resource = sqlx::query_as::<_, Resource>(
        "SELECT * FROM resources WHERE arn = $1 AND organization_id = $2 AND deleted_at IS NULL",
    )
    .bind(arn)
    .bind(organization_id)
    .fetch_optional(exec)
    .await?;
    Ok(resource)
}

pub async fn list_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<Resource>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let resources = sqlx::query_as::<_, Resource>(
        "SELECT * FROM resources WHERE organization_id = $1 AND deleted_at IS NULL",
    )
    .bind(organization_id)
    .fetch_all(exec)
    .await?;
    Ok(resources)
}

pub async fn soft_delete<'e, E>(exec: E, resource_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE resources SET deleted_at = now(), updated_at = now() WHERE resource_id = $1")
        .bind(resource_id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Same shape as `group::would_create_cycle` — walks `candidate_parent`'s
/// chain looking for `resource_id`.
pub async fn would_create_cycle<'e, E>(
    exec: E,
    organization_id: Uuid,
    resource_id: Uuid,
    candidate_parent: Uuid,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Postgres> + Copy,
{
    let mut current = Some(candidate_parent);
    let mut hops = 0;
    while let Some(parent_id) = current {
        if parent_id == resource_id {
            return Ok(true);
        }
        hops += 1;
        if hops > 10_000 {
            return Ok(true);
        }
        current = find_by_id(exec, organization_id, parent_id)
            .await?
            .and_then(|r| r.parent_resource_id);
    }
    Ok(false)
}
