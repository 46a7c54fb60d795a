//! Field sanitizer and per-resource policy registry.
//!
//! Every resource type a client requests must have an entry in its
//! [`PolicyRegistry`]. Identity behaviour is only available through an
//! explicit [`FieldPolicy::Passthrough`] entry, so the decision shows up when
//! the registry is diffed.

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fields a resource type may expose to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum FieldPolicy {
    /// Keep only these fields
    Allow(Vec<String>),
    /// Strip these fields, keep everything else
    Deny(Vec<String>),
    /// Return the payload untouched
    Passthrough,
}

impl FieldPolicy {
    /// Allow-list policy from field names.
    pub fn allow<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Allow(fields.into_iter().map(Into::into).collect())
    }

    /// Deny-list policy from field names.
    pub fn deny<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Deny(fields.into_iter().map(Into::into).collect())
    }

    /// Policy kind, for reporting.
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Allow(_) => PolicyKind::Allow,
            Self::Deny(_) => PolicyKind::Deny,
            Self::Passthrough => PolicyKind::Passthrough,
        }
    }
}

/// Which kind of policy produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Allow,
    Deny,
    Passthrough,
}

/// Redaction applied to a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redaction {
    /// Resource type the policy was looked up for
    pub resource: String,

    /// Kind of policy applied
    pub policy: PolicyKind,
}

impl Redaction {
    /// Whether any field could have been removed.
    pub fn is_active(&self) -> bool {
        self.policy != PolicyKind::Passthrough
    }
}

/// Resource type → field policy, declared once per client.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, FieldPolicy>,
}

impl PolicyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the policy for a resource type.
    pub fn with(mut self, resource: impl Into<String>, policy: FieldPolicy) -> Self {
        self.policies.insert(resource.into(), policy);
        self
    }

    /// Policy for a resource type.
    pub fn get(&self, resource: &str) -> ClientResult<&FieldPolicy> {
        self.policies
            .get(resource)
            .ok_or_else(|| ClientError::UnregisteredResource(resource.to_string()))
    }

    /// Whether a resource type has a declared policy.
    pub fn contains(&self, resource: &str) -> bool {
        self.policies.contains_key(resource)
    }

    /// Registered resource types, sorted.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    /// Sanitize a value with the policy of a resource type.
    pub fn apply(&self, resource: &str, value: Value) -> ClientResult<(Value, Redaction)> {
        let policy = self.get(resource)?;
        let redaction = Redaction {
            resource: resource.to_string(),
            policy: policy.kind(),
        };
        Ok((sanitize(value, policy), redaction))
    }
}

/// Project a decoded value onto a field policy.
///
/// Objects are projected, arrays are projected element by element with order
/// and length preserved, and any other value is returned as is.
pub fn sanitize(value: Value, policy: &FieldPolicy) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| sanitize_item(item, policy))
                .collect(),
        ),
        other => sanitize_item(other, policy),
    }
}

fn sanitize_item(value: Value, policy: &FieldPolicy) -> Value {
    let Value::Object(mut source) = value else {
        return value;
    };

    match policy {
        FieldPolicy::Passthrough => Value::Object(source),
        FieldPolicy::Allow(fields) => {
            let mut kept = Map::new();
            for field in fields {
                if let Some(v) = source.remove(field) {
                    kept.insert(field.clone(), v);
                }
            }
            Value::Object(kept)
        }
        FieldPolicy::Deny(fields) => {
            for field in fields {
                source.remove(field);
            }
            Value::Object(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_allow_list_projection() {
        let policy = FieldPolicy::allow(["id", "name"]);
        let result = sanitize(json!({"id": "1", "name": "x", "secret": "y"}), &policy);
        assert_eq!(result, json!({"id": "1", "name": "x"}));
    }

    #[test]
    fn test_missing_fields_not_synthesized() {
        let policy = FieldPolicy::allow(["id", "name", "slug"]);
        let result = sanitize(json!({"id": "1"}), &policy);
        assert_eq!(result, json!({"id": "1"}));
    }

    #[test]
    fn test_idempotent() {
        let policy = FieldPolicy::allow(["id", "name"]);
        let once = sanitize(json!({"id": 1, "name": "a", "token": "t"}), &policy);
        let twice = sanitize(once.clone(), &policy);
        assert_eq!(once, twice);

        let policy = FieldPolicy::deny(["token"]);
        let once = sanitize(json!({"id": 1, "token": "t"}), &policy);
        assert_eq!(sanitize(once.clone(), &policy), once);
    }

    #[test]
    fn test_array_preserves_order_and_length() {
        let policy = FieldPolicy::allow(["id"]);
        let input = json!([
            {"id": 3, "x": 1},
            {"x": 2},
            {"id": 1},
            "scalar"
        ]);
        let result = sanitize(input, &policy);
        assert_eq!(result, json!([{"id": 3}, {}, {"id": 1}, "scalar"]));
    }

    #[test]
    fn test_deny_list() {
        let policy = FieldPolicy::deny(["user", "metaData"]);
        let result = sanitize(
            json!({"id": "e1", "user": {"email": "a@b.c"}, "metaData": {}, "context": "GET /"}),
            &policy,
        );
        assert_eq!(result, json!({"id": "e1", "context": "GET /"}));
    }

    #[test]
    fn test_passthrough_is_identity() {
        let input = json!({"anything": [1, 2, 3], "nested": {"a": null}});
        assert_eq!(sanitize(input.clone(), &FieldPolicy::Passthrough), input);
    }

    #[test]
    fn test_registry_requires_explicit_entry() {
        let registry = PolicyRegistry::new()
            .with("project", FieldPolicy::allow(["id"]))
            .with("release", FieldPolicy::Passthrough);

        let err = registry.apply("build", json!({})).unwrap_err();
        assert!(matches!(err, ClientError::UnregisteredResource(ref r) if r == "build"));

        let (value, redaction) = registry
            .apply("project", json!({"id": 1, "api_key": "k"}))
            .unwrap();
        assert_eq!(value, json!({"id": 1}));
        assert!(redaction.is_active());

        let (_, redaction) = registry.apply("release", json!({})).unwrap();
        assert_eq!(redaction.policy, PolicyKind::Passthrough);
        assert!(!redaction.is_active());

        assert_eq!(registry.resources().collect::<Vec<_>>(), vec!["project", "release"]);
    }
}
