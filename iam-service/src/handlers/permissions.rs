//! `GET /permissions/effective` (§4.4 last paragraph, SPEC_FULL.md §15):
//! introspection-only report of a principal's resolved permission set.
//! Never consulted by `authz::check` itself — see
//! [`crate::services::permissions`].

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::principal::{PrincipalId, PrincipalType};
use crate::response::{ok, Envelope};
use crate::services::EffectivePermissionEntry;
use crate::tenant::TenantContext;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EffectivePermissionsQuery {
    pub principal_id: Option<Uuid>,
    pub principal_type: Option<PrincipalType>,
}

pub async fn effective(
    context: TenantContext,
    State(state): State<AppState>,
    Query(query): Query<EffectivePermissionsQuery>,
) -> Result<Json<Envelope<Vec<EffectivePermissionEntry>>>, AppError> {
    let principal = match (query.principal_id, query.principal_type) {
        (Some(id), Some(principal_type)) => PrincipalId { id, principal_type },
        _ => context.principal,
    };

    let entries = state.permissions.effective_permissions(context.organization_id, principal).await?;
    Ok(Json(ok(entries)))
}
