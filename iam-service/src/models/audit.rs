//! AuditEvent model — the fixed record schema intake by the audit
//! interface (§3, §6, §4.7). Append-only; never consulted when producing
//! an authorization decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::principal::{PrincipalId, PrincipalType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_result", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Failure,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_severity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

#[derive(Debug, Clone, FromRow)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub organization_id: Option<Uuid>,
    pub principal_id: Option<Uuid>,
    pub principal_type: Option<PrincipalType>,
    pub session_id: Option<Uuid>,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub resource_arn: Option<String>,
    pub result: AuditResult,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
    pub additional_context: serde_json::Value,
    pub severity: AuditSeverity,
}

/// Builder for [`AuditEvent`], mirroring the teacher's
/// `AuditEvent::user_action`/`service_action`/`system_action` constructors
/// but collapsed into one type now that principals are polymorphic.
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    pub fn new(action: impl Into<String>, result: AuditResult) -> Self {
        Self {
            event: AuditEvent {
                event_id: format!("evt_{}", Uuid::new_v4().simple()),
                timestamp: Utc::now(),
                organization_id: None,
                principal_id: None,
                principal_type: None,
                session_id: None,
                action: action.into(),
                resource_type: None,
                resource_id: None,
                resource_arn: None,
                result,
                error_message: None,
                ip_address: None,
                user_agent: None,
                request_id: None,
                additional_context: serde_json::json!({}),
                severity: AuditSeverity::Info,
            },
        }
    }

    pub fn organization(mut self, organization_id: Uuid) -> Self {
        self.event.organization_id = Some(organization_id);
        self
    }

    pub fn principal(mut self, principal: PrincipalId) -> Self {
        self.event.principal_id = Some(principal.id);
        self.event.principal_type = Some(principal.principal_type);
        self
    }

    pub fn session(mut self, session_id: Uuid) -> Self {
        self.event.session_id = Some(session_id);
        self
    }

    pub fn resource(mut self, resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        self.event.resource_type = Some(resource_type.into());
        self.event.resource_id = Some(resource_id.into());
        self
    }

    pub fn resource_arn(mut self, arn: impl Into<String>) -> Self {
        self.event.resource_arn = Some(arn.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.event.error_message = Some(message.into());
        self
    }

    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.event.ip_address = Some(ip.into());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.event.user_agent = Some(ua.into());
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.event.request_id = Some(id.into());
        self
    }

    pub fn context(mut self, context: serde_json::Value) -> Self {
        self.event.additional_context = context;
        self
    }

    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.event.severity = severity;
        self
    }

    pub fn build(self) -> AuditEvent {
        self.event
    }
}

#[derive(Debug, Serialize)]
pub struct AuditEventResponse {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub result: AuditResult,
    pub severity: AuditSeverity,
}

impl From<AuditEvent> for AuditEventResponse {
    fn from(e: AuditEvent) -> Self {
        Self {
            event_id: e.event_id,
            timestamp: e.timestamp,
            action: e.action,
            result: e.result,
            severity: e.severity,
        }
    }
}
