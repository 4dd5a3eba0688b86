use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::policy::{bump_patch, Policy, PolicyStatus, PolicyVersion};

pub async fn insert<'e, E>(exec: E, policy: &Policy) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO policies
            (policy_id, organization_id, name, version, document, effect_default,
             policy_type, is_system, status, approved_by, approved_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(policy.policy_id)
    .bind(policy.organization_id)
    .bind(&policy.name)
    .bind(&policy.version)
    .bind(&policy.document)
    .bind(policy.effect_default)
    .bind(&policy.policy_type)
    .bind(policy.is_system)
    .bind(policy.status)
    .bind(policy.approved_by)
    .bind(policy.approved_at)
    .bind(policy.created_at)
    .bind(policy.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E>(exec: E, organization_id: Uuid, policy_id: Uuid) -> Result<Option<Policy>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let policy = sqlx::query_as::<_, Policy>(
        "SELECT * FROM policies WHERE policy_id = $1 AND organization_id = $2 AND deleted_at IS NULL",
    )
    .bind(policy_id)
    .bind(organization_id)
    .fetch_optional(exec)
    .await?;
    Ok(policy)
}

pub async fn list_active_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<Policy>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let policies = sqlx::query_as::<_, Policy>(
        "SELECT * FROM policies WHERE organization_id = $1 AND status = 'active' AND deleted_at IS NULL",
    )
    .bind(organization_id)
    .fetch_all(exec)
    .await?;
    Ok(policies)
}

/// Writes a snapshot of the current document to `policy_versions`, then
/// overwrites the live document and bumps the version column (§4.2
/// versioning rule: every edit is preceded by a history write).
/// `status_override` lets a rollback mark the policy `active` again in
/// the same statement — a rollback of a `deprecated`/`draft` policy must
/// leave it active, per §4.2's "marks the policy active" rule. A plain
/// update passes `None` and leaves the status column untouched.
pub async fn write_version_and_update<'tx>(
    tx: &mut sqlx::Transaction<'tx, Postgres>,
    policy: &Policy,
    new_document: &sqlx::types::Json<crate::authz::document::PolicyDocument>,
    updated_by: Uuid,
    status_override: Option<PolicyStatus>,
) -> Result<String, AppError> {
    let snapshot = PolicyVersion {
        policy_version_id: Uuid::new_v4(),
        policy_id: policy.policy_id,
        version: policy.version.clone(),
        document: policy.document.clone(),
        created_by: updated_by,
        status: policy.status,
        created_at: chrono::Utc::now(),
    };
    sqlx::query(
        r#"
        INSERT INTO policy_versions (policy_version_id, policy_id, version, document, created_by, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(snapshot.policy_version_id)
    .bind(snapshot.policy_id)
    .bind(&snapshot.version)
    .bind(&snapshot.document)
    .bind(snapshot.created_by)
    .bind(snapshot.status)
    .bind(snapshot.created_at)
    .execute(&mut **tx)
    .await?;

    let new_version = bump_patch(&policy.version);
    match status_override {
        Some(status) => {
            sqlx::query(
                "UPDATE policies SET document = $1, version = $2, status = $3, updated_at = now() WHERE policy_id = $4",
            )
            .bind(new_document)
            .bind(&new_version)
            .bind(status)
            .bind(policy.policy_id)
            .execute(&mut **tx)
            .await?;
        }
        None => {
            sqlx::query("UPDATE policies SET document = $1, version = $2, updated_at = now() WHERE policy_id = $3")
                .bind(new_document)
                .bind(&new_version)
                .bind(policy.policy_id)
                .execute(&mut **tx)
                .await?;
        }
    }

    Ok(new_version)
}

pub async fn find_version<'e, E>(exec: E, policy_id: Uuid, version: &str) -> Result<Option<PolicyVersion>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let version = sqlx::query_as::<_, PolicyVersion>(
        "SELECT * FROM policy_versions WHERE policy_id = $1 AND version = $2",
    )
    .bind(policy_id)
    .bind(version)
    .fetch_optional(exec)
    .await?;
    Ok(version)
}

pub async fn set_status<'e, E>(exec: E, policy_id: Uuid, status: PolicyStatus) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE policies SET status = $1, updated_at = now() WHERE policy_id = $2")
        .bind(status)
        .bind(policy_id)
        .execute(exec)
        .await?;
    Ok(())
}
