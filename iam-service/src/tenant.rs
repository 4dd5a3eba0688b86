//! Tenant guard (§4.1): every store access is scoped to an organization
//! unless the caller is explicitly operating cross-tenant.
//!
//! This replaces the teacher's ad hoc `tenant_id` parameter threaded by
//! hand through each `Database` method (see `services/database.rs`) with
//! a guard value the store layer takes instead of a raw id, so a write
//! path cannot forget to filter by organization.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use iam_core::error::AppError;

use crate::models::organization::SYSTEM_ORGANIZATION_ID;
use crate::models::principal::PrincipalId;

/// The two read modes a request can run under (§4.1).
///
/// `CrossTenant` is never inferred from a request header or client flag:
/// it is only constructed for a principal holding a role in the system
/// organization, identified by role, not by claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantGuard {
    Scoped(Uuid),
    CrossTenant,
}

impl TenantGuard {
    /// The organization filter this guard applies to a read, `None` only
    /// for cross-tenant queries that intentionally span organizations.
    pub fn organization_filter(&self) -> Option<Uuid> {
        match self {
            TenantGuard::Scoped(org_id) => Some(*org_id),
            TenantGuard::CrossTenant => None,
        }
    }

    /// The organization id a write must stamp onto a new row, or verify
    /// against an existing row's `organization_id` before mutating it.
    /// Cross-tenant callers never get to skip this check: they still
    /// write into a single named organization per call.
    pub fn require_organization(&self, requested: Uuid) -> Result<Uuid, AppError> {
        match self {
            TenantGuard::Scoped(org_id) if *org_id == requested => Ok(requested),
            TenantGuard::Scoped(_) => Err(AppError::Forbidden),
            TenantGuard::CrossTenant => Ok(requested),
        }
    }

    pub fn is_cross_tenant(&self) -> bool {
        matches!(self, TenantGuard::CrossTenant)
    }
}

/// The authenticated-request context carried from the session manager
/// into every handler and store call: who is asking, from which
/// organization, and under which tenant guard.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub organization_id: Uuid,
    pub principal: PrincipalId,
    pub session_id: Uuid,
    pub guard: TenantGuard,
}

impl TenantContext {
    pub fn new(organization_id: Uuid, principal: PrincipalId, session_id: Uuid, is_system_admin: bool) -> Self {
        let guard = if is_system_admin && organization_id == SYSTEM_ORGANIZATION_ID {
            TenantGuard::CrossTenant
        } else {
            TenantGuard::Scoped(organization_id)
        };
        Self { organization_id, principal, session_id, guard }
    }

    /// Verifies a row's `organization_id` belongs to this context before
    /// a write proceeds. Every mutating store call must run this check
    /// (§4.1 write rule) rather than trust the caller passed the right id.
    pub fn verify_write(&self, row_organization_id: Uuid) -> Result<(), AppError> {
        if self.guard.is_cross_tenant() || row_organization_id == self.organization_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no authenticated tenant context on request".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_guard_rejects_foreign_organization() {
        let org = Uuid::new_v4();
        let other = Uuid::new_v4();
        let guard = TenantGuard::Scoped(org);
        assert!(guard.require_organization(org).is_ok());
        assert!(guard.require_organization(other).is_err());
    }

    #[test]
    fn cross_tenant_guard_permits_any_organization() {
        let guard = TenantGuard::CrossTenant;
        assert!(guard.require_organization(Uuid::new_v4()).is_ok());
        assert_eq!(guard.organization_filter(), None);
    }

    #[test]
    fn system_admin_in_system_org_gets_cross_tenant_guard() {
        let principal = PrincipalId::user(Uuid::new_v4());
        let ctx = TenantContext::new(SYSTEM_ORGANIZATION_ID, principal, Uuid::new_v4(), true);
        assert!(ctx.guard.is_cross_tenant());
    }

    #[test]
    fn non_admin_is_always_scoped_even_in_system_org() {
        let principal = PrincipalId::user(Uuid::new_v4());
        let ctx = TenantContext::new(SYSTEM_ORGANIZATION_ID, principal, Uuid::new_v4(), false);
        assert!(!ctx.guard.is_cross_tenant());
    }

    #[test]
    fn verify_write_rejects_cross_organization_row() {
        let org = Uuid::new_v4();
        let principal = PrincipalId::user(Uuid::new_v4());
        let ctx = TenantContext::new(org, principal, Uuid::new_v4(), false);
        assert!(ctx.verify_write(org).is_ok());
        assert!(ctx.verify_write(Uuid::new_v4()).is_err());
    }
}
