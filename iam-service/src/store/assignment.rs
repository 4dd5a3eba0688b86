//! RoleAssignment store (§3, §4.4).

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::assignment::RoleAssignment;
use crate::models::principal::PrincipalType;

pub async fn insert<'e, E>(exec: E, assignment: &RoleAssignment) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO role_assignments
            (role_assignment_id, organization_id, role_id, principal_id, principal_type,
             assigned_by, assigned_at, expires_at, conditions)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(assignment.role_assignment_id)
    .bind(assignment.organization_id)
    .bind(assignment.role_id)
    .bind(assignment.principal_id)
    .bind(assignment.principal_type)
    .bind(assignment.assigned_by)
    .bind(assignment.assigned_at)
    .bind(assignment.expires_at)
    .bind(&assignment.conditions)
    .execute(exec)
    .await?;
    Ok(())
}

/// All role assignments in the organization — like group memberships,
/// the resolver (§4.4) needs the full set to join direct and
/// group-mediated roles in one pass.
pub async fn list_for_organization<'e, E>(exec: E, organization_id: Uuid) -> Result<Vec<RoleAssignment>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let assignments = sqlx::query_as::<_, RoleAssignment>(
        "SELECT * FROM role_assignments WHERE organization_id = $1",
    )
    .bind(organization_id)
    .fetch_all(exec)
    .await?;
    Ok(assignments)
}

pub async fn list_for_principal<'e, E>(
    exec: E,
    organization_id: Uuid,
    principal_id: Uuid,
    principal_type: PrincipalType,
) -> Result<Vec<RoleAssignment>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let assignments = sqlx::query_as::<_, RoleAssignment>(
        "SELECT * FROM role_assignments WHERE organization_id = $1 AND principal_id = $2 AND principal_type = $3",
    )
    .bind(organization_id)
    .bind(principal_id)
    .bind(principal_type)
    .fetch_all(exec)
    .await?;
    Ok(assignments)
}

pub async fn delete<'e, E>(exec: E, role_assignment_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("DELETE FROM role_assignments WHERE role_assignment_id = $1")
        .bind(role_assignment_id)
        .execute(exec)
        .await?;
    Ok(())
}
