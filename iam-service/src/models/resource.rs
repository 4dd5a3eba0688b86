//! Resource model and the ARN grammar fixed bit-exact by §3/§6:
//! `arn:<vendor>:<service>:<region>:<org-id>:<type>/<id>`.

use crate::models::principal::PrincipalId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Object,
    Service,
    Namespace,
    Infrastructure,
}

#[derive(Debug, Clone, FromRow)]
pub struct Resource {
    pub resource_id: Uuid,
    pub organization_id: Uuid,
    pub arn: String,
    pub resource_type: ResourceType,
    pub parent_resource_id: Option<Uuid>,
    pub owner_principal_id: Uuid,
    pub owner_principal_type: crate::models::principal::PrincipalType,
    pub attributes: serde_json::Value,
    pub tags: serde_json::Value,
    pub access_level: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Resource {
    pub fn owner(&self) -> PrincipalId {
        PrincipalId {
            id: self.owner_principal_id,
            principal_type: self.owner_principal_type,
        }
    }
}

/// A parsed ARN. `*` is not interpreted specially here — wildcard matching
/// against ARNs happens later, in the policy evaluator's pattern matcher,
/// never during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub vendor: String,
    pub service: String,
    pub region: String,
    pub organization_id: String,
    pub resource_type: String,
    pub resource_local_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ArnParseError {
    #[error("ARN must have 6 colon-separated segments: arn:<vendor>:<service>:<region>:<org-id>:<type>/<id>")]
    WrongSegmentCount,
    #[error("ARN must start with the literal \"arn\"")]
    MissingPrefix,
    #[error("ARN type/id segment must be of the form <type>/<id>")]
    MissingTypeSeparator,
}

impl Arn {
    /// Parses `arn:<vendor>:<service>:<region>:<org-id>:<type>/<id>`.
    pub fn parse(s: &str) -> Result<Self, ArnParseError> {
        let parts: Vec<&str> = s.splitn(6, ':').collect();
        if parts.len() != 6 {
            return Err(ArnParseError::WrongSegmentCount);
        }
        if parts[0] != "arn" {
            return Err(ArnParseError::MissingPrefix);
        }
        let (resource_type, resource_local_id) = parts[5]
            .split_once('/')
            .ok_or(ArnParseError::MissingTypeSeparator)?;

        Ok(Self {
            vendor: parts[1].to_string(),
            service: parts[2].to_string(),
            region: parts[3].to_string(),
            organization_id: parts[4].to_string(),
            resource_type: resource_type.to_string(),
            resource_local_id: resource_local_id.to_string(),
        })
    }

    pub fn format(
        vendor: &str,
        service: &str,
        region: &str,
        organization_id: &str,
        resource_type: &str,
        resource_local_id: &str,
    ) -> String {
        format!("arn:{vendor}:{service}:{region}:{organization_id}:{resource_type}/{resource_local_id}")
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub arn: String,
    pub resource_type: ResourceType,
    pub parent_resource_id: Option<Uuid>,
    pub attributes: serde_json::Value,
    pub tags: serde_json::Value,
    pub access_level: String,
}

#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub resource_id: Uuid,
    pub organization_id: Uuid,
    pub arn: String,
    pub resource_type: ResourceType,
    pub access_level: String,
}

impl From<Resource> for ResourceResponse {
    fn from(r: Resource) -> Self {
        Self {
            resource_id: r.resource_id,
            organization_id: r.organization_id,
            arn: r.arn,
            resource_type: r.resource_type,
            access_level: r.access_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_arn() {
        let arn = Arn::parse("arn:aws:docs:us:org1:resource/secret/x").unwrap();
        assert_eq!(arn.vendor, "aws");
        assert_eq!(arn.service, "docs");
        assert_eq!(arn.region, "us");
        assert_eq!(arn.organization_id, "org1");
        assert_eq!(arn.resource_type, "resource");
        assert_eq!(arn.resource_local_id, "secret/x");
    }

    #[test]
    fn rejects_missing_segments() {
        assert!(matches!(
            Arn::parse("arn:aws:docs"),
            Err(ArnParseError::WrongSegmentCount)
        ));
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert!(matches!(
            Arn::parse("urn:aws:docs:us:org1:resource/foo"),
            Err(ArnParseError::MissingPrefix)
        ));
    }
}
