//! Organization store. The organization table is the one entity that is
//! never itself tenant-scoped — it *is* the tenant.

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::organization::{Organization, OrganizationStatus};

pub async fn insert<'e, E>(exec: E, org: &Organization) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO organizations
            (organization_id, name, slug, parent_id, settings, status,
             max_users, max_resources, allowed_cors_origins, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(org.organization_id)
    .bind(&org.name)
    .bind(&org.slug)
    .bind(org.parent_id)
    .bind(&org.settings)
    .bind(org.status)
    .bind(org.max_users)
    .bind(org.max_resources)
    .bind(&org.allowed_cors_origins)
    .bind(org.created_at)
    .bind(org.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E>(exec: E, organization_id: Uuid) -> Result<Option<Organization>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let org = sqlx::query_as::<_, Organization>(
        "SELECT * FROM organizations WHERE organization_id = $1 AND deleted_at IS NULL",
    )
    .bind(organization_id)
    .fetch_optional(exec)
    .await?;
    Ok(org)
}

pub async fn find_by_slug<'e, E>(exec: E, slug: &str) -> Result<Option<Organization>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let org = sqlx::query_as::<_, Organization>(
        "SELECT * FROM organizations WHERE slug = $1 AND deleted_at IS NULL",
    )
    .bind(slug)
    .fetch_optional(exec)
    .await?;
    Ok(org)
}

pub async fn set_status<'e, E>(exec: E, organization_id: Uuid, status: OrganizationStatus) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE organizations SET status = $1, updated_at = now() WHERE organization_id = $2")
        .bind(status)
        .bind(organization_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn soft_delete<'e, E>(exec: E, organization_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE organizations SET deleted_at = now(), updated_at = now() WHERE organization_id = $1")
        .bind(organization_id)
        .execute(exec)
        .await?;
    Ok(())
}
