//! Policy grammar, pattern matching, and the evaluation algorithm (§4.2-§4.3).
//!
//! The permission resolver (§4.4) owns gathering which documents apply to
//! a principal; this module only knows how to decide a single request
//! against a set of documents already in hand.

pub mod condition;
pub mod document;
pub mod evaluator;
pub mod pattern;
pub mod resolver;

pub use condition::{ConditionBlock, ConditionContext, ConditionValue};
pub use document::{DocumentError, OneOrMany, PolicyDocument, Statement};
pub use evaluator::{evaluate, evaluate_document, Decision, DocumentMatch, DocumentOutcome, EvaluationOutcome, Request};
pub use pattern::{any_matches, wildcard_match};
pub use resolver::{applicable_policies, applicable_role_ids, authorize, resolve_documents, transitive_group_ids};
