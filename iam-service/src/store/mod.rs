//! Store layer (§4.1, §9): one module per entity, each function generic
//! over `sqlx::Executor` rather than hand-rolled connection/transaction
//! variants — the teacher's `Database` wrapper flattens every query onto
//! a single pool, which works until a multi-statement write needs to
//! share a transaction. sqlx's own `Executor` trait is implemented for
//! both `&PgPool` and `&mut Transaction<'_, Postgres>`, so a store
//! function written against `E: Executor<'_, Database = Postgres>` can be
//! called with either a bare pool connection for a single read, or a
//! transaction handle for a write that must commit atomically alongside
//! others (e.g. session issue followed by a cache write).
//!
//! Every query that reads or writes a tenant-scoped row takes an explicit
//! `organization_id` and filters on it directly; there is no path into
//! this module that can reach a query without one. The
//! [`crate::tenant::TenantGuard`] enforcement point sits one layer up, in
//! `session_auth_middleware` and the handlers that call into this module
//! — by the time a request reaches a store function, the guard has
//! already resolved which organization id (if any) it may use.

pub mod api_key;
pub mod assignment;
pub mod audit;
pub mod group;
pub mod membership;
pub mod organization;
pub mod policy;
pub mod resource;
pub mod role;
pub mod service_account;
pub mod session;
pub mod user;
