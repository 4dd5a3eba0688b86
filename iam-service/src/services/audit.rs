//! Audit interface (§4.7, expanded in SPEC_FULL.md §14): a thin
//! synchronous wrapper over `store::audit::insert`, called at every
//! authorization decision and identity-lifecycle event. There is
//! deliberately no read path here beyond what the store module exposes
//! for the read-only listing handler — nothing in this service ever
//! consults past events to shape a new decision.

use sqlx::PgPool;

use iam_core::error::AppError;

use crate::models::audit::AuditEvent;
use crate::store;

#[derive(Clone)]
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records one event. Audit writes are append-only bookkeeping, not
    /// the operation they describe — a write failure is logged and
    /// swallowed so a secondary audit-store outage cannot fail the
    /// primary login/authorization/session-lifecycle path.
    pub async fn record(&self, event: AuditEvent) {
        if let Err(err) = store::audit::insert(&self.pool, &event).await {
            tracing::warn!(error = %err, action = %event.action, "failed to record audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::{AuditEventBuilder, AuditResult};

    #[test]
    fn builder_produces_the_requested_action_and_result() {
        let event = AuditEventBuilder::new("session.issue", AuditResult::Success).build();
        assert_eq!(event.action, "session.issue");
        assert_eq!(event.result, AuditResult::Success);
    }
}
