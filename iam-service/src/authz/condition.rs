//! Condition operators (§4.3).
//!
//! A condition block maps operator name to a map of context-key to
//! expected value(s). Every operator in the block — and every key within
//! it — must be satisfied for the block to pass. A missing context key
//! fails a positive operator and satisfies its negative counterpart
//! (`StringNotEquals` succeeds when the key is simply absent).

use chrono::DateTime;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

use super::pattern::wildcard_match;

/// `Condition` block: `{ "StringEquals": { "aws:username": "alice" }, ... }`.
pub type ConditionBlock = HashMap<String, HashMap<String, ConditionValue>>;

/// Expected value(s) for one operator/key pair. A list means "any of
/// these" for positive operators, "none of these" for negative ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ConditionValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            ConditionValue::Single(s) => vec![s.as_str()],
            ConditionValue::Multiple(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

/// The request-scoped key/value context a condition block is evaluated
/// against. Deliberately just string-keyed strings: the evaluator never
/// needs to know the business meaning of a key, only how to compare it
/// under whichever operator named it.
pub type ConditionContext = HashMap<String, String>;

/// Evaluates every operator/key pair in `block` against `context`.
/// Returns `true` only if all of them are satisfied.
pub fn evaluate_condition_block(block: &ConditionBlock, context: &ConditionContext) -> bool {
    block
        .iter()
        .all(|(operator, keys)| keys.iter().all(|(key, expected)| {
            evaluate_operator(operator, key, expected, context)
        }))
}

fn evaluate_operator(
    operator: &str,
    key: &str,
    expected: &ConditionValue,
    context: &ConditionContext,
) -> bool {
    let actual = context.get(key);
    let expected_values = expected.values();

    match operator {
        "StringEquals" => actual.is_some_and(|a| expected_values.iter().any(|e| *e == a)),
        "StringNotEquals" => actual.is_none_or(|a| expected_values.iter().all(|e| *e != a)),
        "StringLike" => actual.is_some_and(|a| expected_values.iter().any(|p| wildcard_match(p, a))),
        "StringNotLike" => {
            actual.is_none_or(|a| expected_values.iter().all(|p| !wildcard_match(p, a)))
        }
        "NumericEquals" => numeric_compare(actual, &expected_values, |a, e| a == e),
        "NumericLessThanOrEquals" => numeric_compare(actual, &expected_values, |a, e| a <= e),
        "NumericLessThan" => numeric_compare(actual, &expected_values, |a, e| a < e),
        "NumericGreaterThan" => numeric_compare(actual, &expected_values, |a, e| a > e),
        "NumericGreaterThanOrEquals" => numeric_compare(actual, &expected_values, |a, e| a >= e),
        "DateLessThan" => date_compare(actual, &expected_values, |a, e| a < e),
        "DateLessThanOrEquals" => date_compare(actual, &expected_values, |a, e| a <= e),
        "DateGreaterThan" => date_compare(actual, &expected_values, |a, e| a > e),
        "DateGreaterThanOrEquals" => date_compare(actual, &expected_values, |a, e| a >= e),
        "IpAddress" => ip_compare(actual, &expected_values, true),
        "NotIpAddress" => ip_compare(actual, &expected_values, false),
        "Bool" => actual.is_some_and(|a| {
            let parsed = a.parse::<bool>().ok();
            expected_values
                .iter()
                .any(|e| e.parse::<bool>().ok() == parsed && parsed.is_some())
        }),
        // An operator name the engine doesn't recognize never matches; it
        // is not an error, just an unsatisfiable condition.
        _ => false,
    }
}

fn numeric_compare(
    actual: Option<&String>,
    expected: &[&str],
    cmp: impl Fn(f64, f64) -> bool,
) -> bool {
    let Some(actual_n) = actual.and_then(|a| a.parse::<f64>().ok()) else {
        return false;
    };
    expected
        .iter()
        .filter_map(|e| e.parse::<f64>().ok())
        .any(|e| cmp(actual_n, e))
}

fn date_compare(
    actual: Option<&String>,
    expected: &[&str],
    cmp: impl Fn(DateTime<chrono::FixedOffset>, DateTime<chrono::FixedOffset>) -> bool,
) -> bool {
    let Some(actual_d) = actual.and_then(|a| DateTime::parse_from_rfc3339(a).ok()) else {
        return false;
    };
    expected
        .iter()
        .filter_map(|e| DateTime::parse_from_rfc3339(e).ok())
        .any(|e| cmp(actual_d, e))
}

fn ip_compare(actual: Option<&String>, expected: &[&str], want_contained: bool) -> bool {
    let Some(ip) = actual.and_then(|a| a.parse::<IpAddr>().ok()) else {
        return !want_contained;
    };
    let contained = expected
        .iter()
        .filter_map(|cidr| cidr.parse::<IpNet>().ok())
        .any(|net| net.contains(&ip));
    contained == want_contained
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(json: serde_json::Value) -> ConditionBlock {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn string_equals_matches() {
        let b = block(serde_json::json!({"StringEquals": {"dept": "eng"}}));
        let mut ctx = ConditionContext::new();
        ctx.insert("dept".into(), "eng".into());
        assert!(evaluate_condition_block(&b, &ctx));
        ctx.insert("dept".into(), "sales".into());
        assert!(!evaluate_condition_block(&b, &ctx));
    }

    #[test]
    fn string_not_equals_satisfied_when_key_absent() {
        let b = block(serde_json::json!({"StringNotEquals": {"dept": "eng"}}));
        let ctx = ConditionContext::new();
        assert!(evaluate_condition_block(&b, &ctx));
    }

    #[test]
    fn date_less_than_bounds_access_window() {
        let b = block(serde_json::json!({"DateLessThan": {"now": "2030-01-01T00:00:00Z"}}));

        let mut ctx = ConditionContext::new();
        ctx.insert("now".into(), "2025-06-01T00:00:00Z".into());
        assert!(evaluate_condition_block(&b, &ctx));

        ctx.insert("now".into(), "2031-01-01T00:00:00Z".into());
        assert!(!evaluate_condition_block(&b, &ctx));
    }

    #[test]
    fn ip_address_cidr_containment() {
        let b = block(serde_json::json!({"IpAddress": {"src_ip": "10.0.0.0/8"}}));
        let mut ctx = ConditionContext::new();
        ctx.insert("src_ip".into(), "10.1.2.3".into());
        assert!(evaluate_condition_block(&b, &ctx));
        ctx.insert("src_ip".into(), "192.168.1.1".into());
        assert!(!evaluate_condition_block(&b, &ctx));
    }

    #[test]
    fn numeric_fails_closed_on_non_numeric_input() {
        let b = block(serde_json::json!({"NumericLessThan": {"n": "10"}}));
        let mut ctx = ConditionContext::new();
        ctx.insert("n".into(), "not-a-number".into());
        assert!(!evaluate_condition_block(&b, &ctx));
    }

    #[test]
    fn multiple_operators_all_required() {
        let b = block(serde_json::json!({
            "StringEquals": {"dept": "eng"},
            "Bool": {"mfa": "true"}
        }));
        let mut ctx = ConditionContext::new();
        ctx.insert("dept".into(), "eng".into());
        ctx.insert("mfa".into(), "false".into());
        assert!(!evaluate_condition_block(&b, &ctx));
        ctx.insert("mfa".into(), "true".into());
        assert!(evaluate_condition_block(&b, &ctx));
    }
}
