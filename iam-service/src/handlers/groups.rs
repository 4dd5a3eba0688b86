//! Group management (§3, §4.4): creating groups and adding members. See
//! `handlers::roles` for why full CRUD isn't exposed here.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::{AddGroupMemberRequest, CreateGroupRequest, Group, GroupMembership, GroupMembershipResponse, GroupResponse, PrincipalId};
use crate::response::{ok, Envelope};
use crate::store;
use crate::tenant::TenantContext;
use crate::AppState;

pub async fn create(
    context: TenantContext,
    State(state): State<AppState>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<Json<Envelope<GroupResponse>>, AppError> {
    let organization_id = context.guard.require_organization(context.organization_id)?;

    if let Some(parent_id) = body.parent_group_id {
        store::group::find_by_id(&state.pool, organization_id, parent_id)
            .await?
            .ok_or_else(AppError::not_found)?;
    }

    let mut group = Group::new(organization_id, body.name, body.group_type);
    group.parent_group_id = body.parent_group_id;
    store::group::insert(&state.pool, &group).await?;
    Ok(Json(ok(GroupResponse::from(group))))
}

/// `POST /groups/:group_id/members`.
pub async fn add_member(
    context: TenantContext,
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(body): Json<AddGroupMemberRequest>,
) -> Result<Json<Envelope<GroupMembershipResponse>>, AppError> {
    let organization_id = context.guard.require_organization(context.organization_id)?;
    store::group::find_by_id(&state.pool, organization_id, group_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let principal = PrincipalId { id: body.principal_id, principal_type: body.principal_type };
    let membership = GroupMembership::new(
        organization_id,
        group_id,
        principal,
        body.role_in_group,
        context.principal.id,
        body.expires_at,
    );
    store::membership::insert(&state.pool, &membership).await?;
    Ok(Json(ok(GroupMembershipResponse::from(membership))))
}
