//! Translation of canonical rules into `rpk acl` invocations.
//!
//! Builders are pure: they return argument lists and never run anything.

use crate::error::{Error, Result};
use crate::types::{Action, CanonicalRule, Connection, Permission, ResourceType};
use std::fmt;

/// Flag that skips `rpk acl delete`'s interactive confirmation.
pub const NO_CONFIRM_FLAG: &str = "--no-confirm";

/// A fully built invocation for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCommand {
    /// Create or delete
    pub action: Action,
    /// The rule this invocation converges
    pub rule: CanonicalRule,
    /// Arguments after the `rpk` executable
    pub args: Vec<String>,
}

impl RuleCommand {
    /// Build the invocation for `rule`.
    pub fn new(rule: &CanonicalRule, action: Action, connection: &Connection) -> Result<Self> {
        Ok(Self {
            action,
            rule: rule.clone(),
            args: build_args(rule, action, connection)?,
        })
    }

    /// Arguments with the password value masked, for display.
    pub fn redacted_args(&self) -> Vec<String> {
        let mut masked = Vec::with_capacity(self.args.len());
        let mut hide_next = false;
        for arg in &self.args {
            if hide_next {
                masked.push("***".to_string());
            } else {
                masked.push(arg.clone());
            }
            hide_next = arg == "--password";
        }
        masked
    }
}

impl fmt::Display for RuleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rpk {}", self.redacted_args().join(" "))
    }
}

/// `rpk acl list` arguments for a connection.
pub fn list_args(connection: &Connection) -> Vec<String> {
    let mut args = vec![
        "acl".to_string(),
        "list".to_string(),
        "--brokers".to_string(),
        connection.brokers.clone(),
    ];
    args.extend(connection.auth.args());
    args
}

/// Flag selecting a named resource; `None` for the cluster.
fn resource_flag(rule: &CanonicalRule) -> Result<Option<&'static str>> {
    match &rule.resource_type {
        ResourceType::Cluster => Ok(None),
        ResourceType::Topic => Ok(Some("--topic")),
        ResourceType::Group => Ok(Some("--group")),
        ResourceType::TransactionalId => Ok(Some("--transactional-id")),
        ResourceType::Other(kind) => Err(Error::UnsupportedResourceType {
            resource_type: kind.clone(),
            rule: rule.to_string(),
        }),
    }
}

/// Principal and host flags matching the rule's permission.
fn principal_flags(rule: &CanonicalRule) -> Result<(&'static str, &'static str)> {
    match &rule.permission {
        Permission::Allow => Ok(("--allow-principal", "--allow-host")),
        Permission::Deny => Ok(("--deny-principal", "--deny-host")),
        Permission::Other(permission) => Err(Error::UnsupportedPermission {
            permission: permission.clone(),
            rule: rule.to_string(),
        }),
    }
}

/// Build the `rpk acl create|delete` arguments for one rule.
///
/// Cluster rules get a bare `--cluster` flag; their sentinel resource
/// name is never sent. Deletes skip the interactive confirmation.
/// Authentication arguments always come last.
pub fn build_args(rule: &CanonicalRule, action: Action, connection: &Connection) -> Result<Vec<String>> {
    let resource = resource_flag(rule)?;
    let (principal_flag, host_flag) = principal_flags(rule)?;

    let mut args = vec![
        "acl".to_string(),
        action.as_str().to_string(),
        principal_flag.to_string(),
        rule.principal.to_string(),
    ];
    if !rule.is_any_host() {
        args.extend([host_flag.to_string(), rule.host.clone()]);
    }
    args.extend([
        "--operation".to_string(),
        rule.operation.clone(),
        "--resource-pattern-type".to_string(),
        rule.pattern_type.clone(),
        "--brokers".to_string(),
        connection.brokers.clone(),
    ]);

    match resource {
        Some(flag) => args.extend([flag.to_string(), rule.resource_name.clone()]),
        None => args.push("--cluster".to_string()),
    }

    if action == Action::Delete {
        args.push(NO_CONFIRM_FLAG.to_string());
    }

    args.extend(connection.auth.args());

    log::debug!("built rpk {} for {}", action, rule);
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Auth, CLUSTER_RESOURCE_NAME, Principal};

    fn connection() -> Connection {
        Connection::local("localhost:9092")
    }

    fn rule(resource_type: ResourceType, name: &str) -> CanonicalRule {
        CanonicalRule::allow(
            Principal::user("alice"),
            resource_type,
            name,
            "LITERAL",
            "READ",
        )
    }

    #[test]
    fn test_topic_create() {
        let args = build_args(&rule(ResourceType::Topic, "orders"), Action::Create, &connection())
            .unwrap();
        assert_eq!(
            args,
            [
                "acl",
                "create",
                "--allow-principal",
                "User:alice",
                "--operation",
                "READ",
                "--resource-pattern-type",
                "LITERAL",
                "--brokers",
                "localhost:9092",
                "--topic",
                "orders",
            ]
        );
    }

    #[test]
    fn test_resource_flags() {
        let group = build_args(&rule(ResourceType::Group, "g1"), Action::Create, &connection())
            .unwrap();
        assert!(group.windows(2).any(|w| w == ["--group", "g1"]));

        let tx = build_args(
            &rule(ResourceType::TransactionalId, "tx-1"),
            Action::Create,
            &connection(),
        )
        .unwrap();
        assert!(tx.windows(2).any(|w| w == ["--transactional-id", "tx-1"]));
    }

    #[test]
    fn test_cluster_rule_has_no_resource_name() {
        let cluster = CanonicalRule::allow_cluster(Principal::user("bob"), "LITERAL", "ALL");
        let args = build_args(&cluster, Action::Create, &connection()).unwrap();

        assert!(args.contains(&"--cluster".to_string()));
        assert!(!args.iter().any(|a| a == CLUSTER_RESOURCE_NAME));
        assert!(!args.iter().any(|a| a == "--topic" || a == "--group"));
    }

    #[test]
    fn test_delete_is_non_interactive() {
        let args = build_args(&rule(ResourceType::Topic, "orders"), Action::Delete, &connection())
            .unwrap();
        assert_eq!(args[1], "delete");
        assert_eq!(args.last().map(String::as_str), Some(NO_CONFIRM_FLAG));

        let create = build_args(&rule(ResourceType::Topic, "orders"), Action::Create, &connection())
            .unwrap();
        assert!(!create.contains(&NO_CONFIRM_FLAG.to_string()));
    }

    #[test]
    fn test_auth_args_come_last() {
        let conn = Connection::new(
            "broker:9092",
            Auth::Sasl {
                user: "admin".to_string(),
                password: "secret".to_string(),
                mechanism: None,
            },
        );
        let args = build_args(&rule(ResourceType::Topic, "orders"), Action::Delete, &conn).unwrap();
        let tail: Vec<&str> = args.iter().rev().take(5).rev().map(String::as_str).collect();
        assert_eq!(tail, [NO_CONFIRM_FLAG, "--user", "admin", "--password", "secret"]);
    }

    #[test]
    fn test_unknown_resource_type_is_rejected() {
        let unknown = rule(ResourceType::Other("DELEGATION_TOKEN".to_string()), "t");
        let err = build_args(&unknown, Action::Delete, &connection()).unwrap_err();
        match err {
            Error::UnsupportedResourceType {
                resource_type,
                rule,
            } => {
                assert_eq!(resource_type, "DELEGATION_TOKEN");
                assert!(rule.contains("User:alice"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_deny_rule_uses_deny_flags() {
        let mut denied = rule(ResourceType::Topic, "orders");
        denied.permission = Permission::Deny;
        denied.host = "10.0.0.1".to_string();
        let args = build_args(&denied, Action::Delete, &connection()).unwrap();

        assert!(args.windows(2).any(|w| w == ["--deny-principal", "User:alice"]));
        assert!(args.windows(2).any(|w| w == ["--deny-host", "10.0.0.1"]));
        assert!(!args.iter().any(|a| a == "--allow-principal"));
    }

    #[test]
    fn test_unknown_permission_is_rejected() {
        let mut odd = rule(ResourceType::Topic, "orders");
        odd.permission = Permission::Other("ANY".to_string());
        assert!(matches!(
            build_args(&odd, Action::Delete, &connection()),
            Err(Error::UnsupportedPermission { .. })
        ));
    }

    #[test]
    fn test_redacted_display() {
        let conn = Connection::new(
            "broker:9092",
            Auth::Sasl {
                user: "admin".to_string(),
                password: "secret".to_string(),
                mechanism: None,
            },
        );
        let cmd = RuleCommand::new(&rule(ResourceType::Topic, "orders"), Action::Create, &conn)
            .unwrap();
        let shown = cmd.to_string();
        assert!(shown.starts_with("rpk acl create"));
        assert!(shown.contains("--password ***"));
        assert!(!shown.contains("secret"));
        assert!(cmd.args.contains(&"secret".to_string()));
    }

    #[test]
    fn test_list_args() {
        assert_eq!(
            list_args(&connection()),
            ["acl", "list", "--brokers", "localhost:9092"]
        );
    }
}
