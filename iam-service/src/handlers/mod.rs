//! HTTP handlers (§6). Organized by the subsystem each endpoint sits on
//! top of, matching the `services`/`store` module split rather than a
//! flat REST-resource listing. Full CRUD for organizations, users,
//! resources, service accounts, and API keys is deliberately not
//! exposed here (§1 Non-goals): those remain store-layer operations for
//! an external admin/provisioning surface to call directly.

pub mod auth;
pub mod authz;
pub mod groups;
pub mod permissions;
pub mod policies;
pub mod roles;
pub mod sessions;
