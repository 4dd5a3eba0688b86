//! Policy document grammar (§4.2): the JSON shape a `Policy.document`
//! column actually stores.
//!
//! ```json
//! { "Version": "2025-01-01", "Statement": [
//!   { "Sid": "ReadOwnProfile", "Effect": "Allow",
//!     "Action": "user:read", "Resource": "arn:iam:user:*:org1:user/${self}" }
//! ]}
//! ```
//!
//! `Version` here is a free-form label on the document itself, unrelated
//! to the `Policy.version` semver column that tracks edits over time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::authz::condition::ConditionBlock;
use crate::models::policy::Effect;

/// A field that may be given as a single string or a list of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(v) => v,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OneOrMany::One(_) => false,
            OneOrMany::Many(v) => v.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Sid", skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub action: OneOrMany<String>,
    #[serde(rename = "Resource")]
    pub resource: OneOrMany<String>,
    #[serde(rename = "Condition", skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<Statement>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("policy document must contain at least one statement")]
    EmptyStatementArray,
    #[error("statement {0} has an empty Action list")]
    EmptyAction(usize),
    #[error("statement {0} has an empty Resource list")]
    EmptyResource(usize),
}

impl PolicyDocument {
    /// Document validation rule from §4.2: the `Statement` array must be
    /// non-empty, and every statement's `Action`/`Resource` must name at
    /// least one entry. `Effect` is structurally required by the type
    /// itself, so there is nothing further to check there.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.statement.is_empty() {
            return Err(DocumentError::EmptyStatementArray);
        }
        for (i, stmt) in self.statement.iter().enumerate() {
            if stmt.action.is_empty() {
                return Err(DocumentError::EmptyAction(i));
            }
            if stmt.resource.is_empty() {
                return Err(DocumentError::EmptyResource(i));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> PolicyDocument {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn parses_action_and_resource_as_single_string() {
        let doc = parse(serde_json::json!({
            "Version": "2025-01-01",
            "Statement": [{
                "Effect": "Allow",
                "Action": "user:read",
                "Resource": "arn:iam:user:*:org1:user/*"
            }]
        }));
        assert_eq!(doc.statement[0].action.as_slice(), ["user:read"]);
    }

    #[test]
    fn parses_action_and_resource_as_list() {
        let doc = parse(serde_json::json!({
            "Version": "2025-01-01",
            "Statement": [{
                "Effect": "Deny",
                "Action": ["user:read", "user:write"],
                "Resource": ["arn:a", "arn:b"]
            }]
        }));
        assert_eq!(doc.statement[0].action.as_slice().len(), 2);
        assert_eq!(doc.statement[0].resource.as_slice().len(), 2);
    }

    #[test]
    fn rejects_empty_statement_array() {
        let doc = parse(serde_json::json!({"Version": "1", "Statement": []}));
        assert_eq!(doc.validate(), Err(DocumentError::EmptyStatementArray));
    }

    #[test]
    fn rejects_empty_action_list() {
        let doc = parse(serde_json::json!({
            "Version": "1",
            "Statement": [{"Effect": "Allow", "Action": [], "Resource": "arn:a"}]
        }));
        assert_eq!(doc.validate(), Err(DocumentError::EmptyAction(0)));
    }

    #[test]
    fn accepts_well_formed_document() {
        let doc = parse(serde_json::json!({
            "Version": "1",
            "Statement": [{
                "Sid": "S1",
                "Effect": "Allow",
                "Action": "*",
                "Resource": "*",
                "Condition": {"StringEquals": {"dept": "eng"}}
            }]
        }));
        assert!(doc.validate().is_ok());
    }
}
