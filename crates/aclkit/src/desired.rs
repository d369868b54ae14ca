//! Desired-state ACL documents and their normalization.
//!
//! A document maps each principal to a list of rule definitions:
//!
//! ```json
//! {
//!   "alice": {
//!     "acls": [
//!       {
//!         "resource-pattern-type": "literal",
//!         "operation": ["read", "describe"],
//!         "topic": ["orders"],
//!         "group": ["orders-consumer"],
//!         "transactionalId": [],
//!         "cluster": false
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Resource lists and `cluster` are optional. Keys may carry a principal
//! type (`RedpandaRole:ops`); bare keys are `User` principals.
//!
//! Known limitation: `kafka-cluster` is the name cluster rows carry, so it is
//! rejected as a topic, group or transactional id. An ACL on a real resource
//! with that name cannot be declared, and `apply` will delete it.

use crate::error::{Error, Result};
use crate::types::{CanonicalRule, CLUSTER_RESOURCE_NAME, Principal, ResourceType, RuleSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One rule definition for a principal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleDefinition {
    /// `literal` or `prefixed` (any case)
    #[serde(rename = "resource-pattern-type")]
    pub pattern_type: String,
    /// Operations granted on every listed resource
    pub operation: Vec<String>,
    /// Topic names
    #[serde(default)]
    pub topic: Vec<String>,
    /// Consumer group names
    #[serde(default)]
    pub group: Vec<String>,
    /// Transactional ids
    #[serde(default, rename = "transactionalId")]
    pub transactional_id: Vec<String>,
    /// Grant the operations on the cluster resource too
    #[serde(default)]
    pub cluster: bool,
}

impl RuleDefinition {
    /// Number of rows this definition expands to.
    pub fn row_count(&self) -> usize {
        let resources =
            self.topic.len() + self.group.len() + self.transactional_id.len() + usize::from(self.cluster);
        resources * self.operation.len()
    }

    /// Expand into one rule per (operation, resource), plus one cluster
    /// rule per operation when `cluster` is set.
    fn expand<'a>(&'a self, principal: &'a Principal) -> impl Iterator<Item = CanonicalRule> + 'a {
        let pattern_type = self.pattern_type.to_uppercase();
        self.operation.iter().flat_map(move |operation| {
            let operation = operation.to_uppercase();
            let named = [
                (ResourceType::Group, &self.group),
                (ResourceType::Topic, &self.topic),
                (ResourceType::TransactionalId, &self.transactional_id),
            ];
            let mut rows: Vec<CanonicalRule> = named
                .into_iter()
                .flat_map(|(resource_type, names)| {
                    names.iter().map(move |name| (resource_type.clone(), name))
                })
                .map(|(resource_type, name)| {
                    CanonicalRule::allow(
                        principal.clone(),
                        resource_type,
                        name.as_str(),
                        pattern_type.as_str(),
                        operation.as_str(),
                    )
                })
                .collect();
            if self.cluster {
                rows.push(CanonicalRule::allow_cluster(
                    principal.clone(),
                    pattern_type.as_str(),
                    operation.as_str(),
                ));
            }
            rows
        })
    }
}

/// The ACLs declared for one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalAcls {
    /// Rule definitions, in document order
    pub acls: Vec<RuleDefinition>,
}

/// A parsed desired-state document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclDocument {
    /// Principal key (as written) to its definitions
    pub principals: BTreeMap<String, PrincipalAcls>,
}

impl AclDocument {
    /// Parse a JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    /// Parse a TOML document (same shape as JSON, principals as tables).
    pub fn from_toml(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let value = serde_json::to_value(table)?;
        Self::from_value(&value)
    }

    /// Load a document from disk; `.toml` files are TOML, anything else JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Build a document from an already-parsed value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let entries = value.as_object().ok_or_else(|| {
            Error::malformed("document", "expected an object mapping principals to ACLs")
        })?;

        let mut principals = BTreeMap::new();
        for (principal, entry) in entries {
            let acls = entry
                .as_object()
                .and_then(|e| e.get("acls"))
                .and_then(serde_json::Value::as_array)
                .ok_or_else(|| Error::malformed(principal.as_str(), "expected an `acls` list"))?;

            let mut definitions = Vec::with_capacity(acls.len());
            for (index, raw) in acls.iter().enumerate() {
                let context = format!("{principal}, acls[{index}]");
                let definition = RuleDefinition::deserialize(raw)
                    .map_err(|e| Error::malformed(context.as_str(), e.to_string()))?;
                validate(&definition, &context)?;
                definitions.push(definition);
            }

            principals.insert(principal.clone(), PrincipalAcls { acls: definitions });
        }

        Ok(Self { principals })
    }

    /// Total rows the document expands to, before duplicates collapse.
    pub fn row_count(&self) -> usize {
        self.principals
            .values()
            .flat_map(|p| &p.acls)
            .map(RuleDefinition::row_count)
            .sum()
    }
}

fn validate(definition: &RuleDefinition, context: &str) -> Result<()> {
    if definition.operation.is_empty() {
        return Err(Error::malformed(context, "`operation` must list at least one operation"));
    }
    let reserved = definition
        .topic
        .iter()
        .chain(&definition.group)
        .chain(&definition.transactional_id)
        .any(|name| name == CLUSTER_RESOURCE_NAME);
    if reserved {
        return Err(Error::malformed(
            context,
            format!("`{CLUSTER_RESOURCE_NAME}` is reserved for cluster rules; use `cluster: true`"),
        ));
    }
    Ok(())
}

/// Flatten a document into the canonical rules it declares.
///
/// Every row is an `ALLOW` on host `*` with no error. Duplicates collapse.
pub fn normalize(document: &AclDocument) -> RuleSet {
    let rules: RuleSet = document
        .principals
        .iter()
        .flat_map(|(key, entry)| {
            let principal = Principal::parse(key);
            entry
                .acls
                .iter()
                .flat_map(|definition| definition.expand(&principal).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        })
        .collect();
    log::debug!(
        "normalized {} principals into {} rules",
        document.principals.len(),
        rules.len()
    );
    rules
}

/// Parse and normalize a JSON document in one step.
pub fn normalize_json(content: &str) -> Result<RuleSet> {
    Ok(normalize(&AclDocument::from_json(content)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NO_ERROR, Permission, WILDCARD_HOST};
    use std::io::Write;

    const SCENARIO_A: &str = r#"{
        "alice": {
            "acls": [
                {
                    "resource-pattern-type": "literal",
                    "operation": ["read"],
                    "topic": ["orders"],
                    "group": [],
                    "transactionalId": [],
                    "cluster": false
                }
            ]
        }
    }"#;

    #[test]
    fn test_single_topic_rule() {
        let rules = normalize_json(SCENARIO_A).unwrap();
        assert_eq!(rules.len(), 1);

        let rule = rules.first().unwrap();
        assert_eq!(rule.principal, Principal::user("alice"));
        assert_eq!(rule.host, WILDCARD_HOST);
        assert_eq!(rule.resource_type, ResourceType::Topic);
        assert_eq!(rule.resource_name, "orders");
        assert_eq!(rule.pattern_type, "LITERAL");
        assert_eq!(rule.operation, "READ");
        assert_eq!(rule.permission, Permission::Allow);
        assert_eq!(rule.error, NO_ERROR);
    }

    #[test]
    fn test_empty_document_is_empty_set() {
        assert!(normalize_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_row_count_matches_expansion() {
        let doc = AclDocument::from_json(
            r#"{
                "alice": {"acls": [
                    {"resource-pattern-type": "prefixed", "operation": ["read", "describe"],
                     "topic": ["orders", "payments"], "group": ["billing"]},
                    {"resource-pattern-type": "literal", "operation": ["all"], "cluster": true}
                ]},
                "User:bob": {"acls": [
                    {"resource-pattern-type": "literal", "operation": ["write"],
                     "transactionalId": ["tx-1"], "cluster": true}
                ]}
            }"#,
        )
        .unwrap();

        // alice: 2 ops * 3 resources + 1 op * cluster; bob: 1 op * (1 + cluster)
        assert_eq!(doc.row_count(), 6 + 1 + 2);
        assert_eq!(normalize(&doc).len(), 9);
    }

    #[test]
    fn test_cluster_flag_adds_one_row_per_operation() {
        let rules = normalize_json(
            r#"{"svc": {"acls": [
                {"resource-pattern-type": "literal", "operation": ["describe", "alter"], "cluster": true}
            ]}}"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.resource_type == ResourceType::Cluster
            && r.resource_name == CLUSTER_RESOURCE_NAME));
        let ops: Vec<&str> = rules.iter().map(|r| r.operation.as_str()).collect();
        assert_eq!(ops, vec!["ALTER", "DESCRIBE"]);
    }

    #[test]
    fn test_empty_resource_lists_contribute_nothing() {
        let rules = normalize_json(
            r#"{"svc": {"acls": [
                {"resource-pattern-type": "literal", "operation": ["read"],
                 "topic": [], "group": [], "transactionalId": [], "cluster": false}
            ]}}"#,
        )
        .unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let rules = normalize_json(
            r#"{"alice": {"acls": [
                {"resource-pattern-type": "literal", "operation": ["read", "READ"], "topic": ["orders"]},
                {"resource-pattern-type": "LITERAL", "operation": ["Read"], "topic": ["orders"]}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_principal_type_prefix_is_kept() {
        let rules = normalize_json(
            r#"{"RedpandaRole:ops": {"acls": [
                {"resource-pattern-type": "literal", "operation": ["read"], "group": ["g"]}
            ]}}"#,
        )
        .unwrap();
        let rule = rules.first().unwrap();
        assert_eq!(rule.principal, Principal::new("RedpandaRole", "ops"));
        assert_eq!(rule.resource_type, ResourceType::Group);
    }

    #[test]
    fn test_missing_operation_is_malformed() {
        let err = normalize_json(
            r#"{"alice": {"acls": [{"resource-pattern-type": "literal", "topic": ["orders"]}]}}"#,
        )
        .unwrap_err();
        match err {
            Error::MalformedInput { context, message } => {
                assert_eq!(context, "alice, acls[0]");
                assert!(message.contains("operation"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_acls_is_malformed() {
        let err = normalize_json(r#"{"alice": {"rules": []}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { ref context, .. } if context == "alice"));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        assert!(matches!(
            normalize_json(r#"["alice"]"#).unwrap_err(),
            Error::MalformedInput { .. }
        ));
        assert!(matches!(
            normalize_json(
                r#"{"alice": {"acls": [{"resource-pattern-type": "literal", "operation": "read"}]}}"#
            )
            .unwrap_err(),
            Error::MalformedInput { .. }
        ));
    }

    #[test]
    fn test_empty_operation_list_is_malformed() {
        let err = normalize_json(
            r#"{"alice": {"acls": [{"resource-pattern-type": "literal", "operation": [], "topic": ["t"]}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn test_sentinel_name_reserved_for_cluster() {
        let err = normalize_json(
            r#"{"alice": {"acls": [{"resource-pattern-type": "literal", "operation": ["read"], "topic": ["kafka-cluster"]}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        assert!(matches!(normalize_json("{").unwrap_err(), Error::Json(_)));
    }

    #[test]
    fn test_toml_document() {
        let doc = AclDocument::from_toml(
            r#"
            [alice]
            acls = [
                { resource-pattern-type = "literal", operation = ["read"], topic = ["orders"] },
            ]
            "#,
        )
        .unwrap();
        let rules = normalize(&doc);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.first().unwrap().resource_name, "orders");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(SCENARIO_A.as_bytes()).unwrap();

        let doc = AclDocument::load(file.path()).unwrap();
        assert_eq!(doc.principals.len(), 1);
        assert_eq!(doc.row_count(), 1);
    }
}
