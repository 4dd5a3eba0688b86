//! Data models for the IAM data plane (§3).
//!
//! Organizations are the tenant root; every other entity carries a
//! `organization_id` and the soft-delete / audit-timestamp triple
//! (`created_at`, `updated_at`, `deleted_at`) the tenant guard and store
//! layer rely on.

pub mod api_key;
pub mod assignment;
pub mod audit;
pub mod group;
pub mod membership;
pub mod organization;
pub mod policy;
pub mod principal;
pub mod resource;
pub mod role;
pub mod service_account;
pub mod session;
pub mod user;

pub use api_key::{ApiKey, ApiKeyCreatedResponse, ApiKeyResponse, CreateApiKeyRequest};
pub use assignment::{CreateRoleAssignmentRequest, RoleAssignment, RoleAssignmentResponse};
pub use audit::{AuditEvent, AuditEventBuilder, AuditEventResponse, AuditResult, AuditSeverity};
pub use group::{CreateGroupRequest, Group, GroupMemberRole, GroupResponse};
pub use membership::{AddGroupMemberRequest, GroupMembership, GroupMembershipResponse};
pub use organization::{
    CreateOrganizationRequest, Organization, OrganizationLimits, OrganizationResponse,
    OrganizationStatus, SYSTEM_ORGANIZATION_ID,
};
pub use policy::{
    bump_patch, CreatePolicyRequest, Effect, Policy, PolicyResponse, PolicyStatus, PolicyVersion,
    RollbackPolicyRequest, UpdatePolicyRequest,
};
pub use principal::{PrincipalId, PrincipalType};
pub use resource::{Arn, ArnParseError, CreateResourceRequest, Resource, ResourceResponse, ResourceType};
pub use role::{AttachPolicyRequest, CreateRoleRequest, Role, RolePolicy, RoleResponse};
pub use service_account::{
    CreateServiceAccountRequest, ServiceAccount, ServiceAccountResponse,
};
pub use session::{Session, SessionResponse, SessionStatus};
pub use user::{LoginRequest, RegisterUserRequest, User, UserResponse};
