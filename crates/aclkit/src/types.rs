//! Core types for ACL reconciliation.
//!
//! Both the desired document and the live `rpk acl list` output are
//! normalized into [`CanonicalRule`] rows, collected into a [`RuleSet`].
//! Every comparison in the crate goes through the identity defined here.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Resource name `rpk` reports for cluster-level ACLs.
///
/// Display only: it is never passed back to `rpk`.
pub const CLUSTER_RESOURCE_NAME: &str = "kafka-cluster";

/// Host filter matching every host.
pub const WILDCARD_HOST: &str = "*";

/// Placeholder used in the `ERROR` column when a row carries no error.
pub const NO_ERROR: &str = "None";

/// Principal type assumed when an identifier has no `Type:` prefix.
pub const DEFAULT_PRINCIPAL_TYPE: &str = "User";

/// Column order of the canonical rule table.
pub const TABLE_COLUMNS: [&str; 8] = [
    "PRINCIPAL",
    "HOST",
    "RESOURCE-TYPE",
    "RESOURCE-NAME",
    "RESOURCE-PATTERN-TYPE",
    "OPERATION",
    "PERMISSION",
    "ERROR",
];

/// Kind of resource an ACL applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    /// The cluster itself
    Cluster,
    /// A topic
    Topic,
    /// A consumer group
    Group,
    /// A transactional id
    TransactionalId,
    /// Anything `rpk` reports that this crate does not manage
    Other(String),
}

impl ResourceType {
    /// Name as it appears in the `RESOURCE-TYPE` column.
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Cluster => "CLUSTER",
            ResourceType::Topic => "TOPIC",
            ResourceType::Group => "GROUP",
            ResourceType::TransactionalId => "TRANSACTIONAL_ID",
            ResourceType::Other(name) => name,
        }
    }

    /// Parse a `RESOURCE-TYPE` column value (case-insensitive).
    ///
    /// Unknown values are kept verbatim as [`ResourceType::Other`].
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "CLUSTER" => ResourceType::Cluster,
            "TOPIC" => ResourceType::Topic,
            "GROUP" => ResourceType::Group,
            "TRANSACTIONAL_ID" => ResourceType::TransactionalId,
            _ => ResourceType::Other(s.to_string()),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a rule grants or denies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    /// Grants the operation
    Allow,
    /// Denies the operation
    Deny,
    /// Unrecognized value from the listing
    Other(String),
}

impl Permission {
    /// Name as it appears in the `PERMISSION` column.
    pub fn as_str(&self) -> &str {
        match self {
            Permission::Allow => "ALLOW",
            Permission::Deny => "DENY",
            Permission::Other(name) => name,
        }
    }

    /// Parse a `PERMISSION` column value (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ALLOW" => Permission::Allow,
            "DENY" => Permission::Deny,
            _ => Permission::Other(s.to_string()),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity a rule applies to, e.g. `User:alice`.
///
/// The type tag and the identifier are kept apart so that principals of
/// different types with the same name never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal {
    /// Principal type tag (`User`, `RedpandaRole`, ...)
    pub kind: String,
    /// Identifier after the colon
    pub name: String,
}

impl Principal {
    /// Create a principal from its parts.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a `User:` principal.
    pub fn user(name: impl Into<String>) -> Self {
        Self::new(DEFAULT_PRINCIPAL_TYPE, name)
    }

    /// Parse `Type:name`, defaulting the type to `User` when no tag is present.
    ///
    /// The `User` tag is matched case-insensitively; other tags are kept verbatim.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((kind, name)) if kind.eq_ignore_ascii_case(DEFAULT_PRINCIPAL_TYPE) => {
                Self::user(name)
            }
            Some((kind, name)) if !kind.is_empty() => Self::new(kind, name),
            Some((_, name)) => Self::user(name),
            None => Self::user(s),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// One access-control grant, normalized.
///
/// Equality, ordering and hashing cover every field except `error`,
/// which is diagnostic output from the listing and not part of identity.
#[derive(Debug, Clone)]
pub struct CanonicalRule {
    /// Who the rule applies to
    pub principal: Principal,
    /// Originating host filter (`*` when unconstrained)
    pub host: String,
    /// Kind of resource
    pub resource_type: ResourceType,
    /// Resource instance name ([`CLUSTER_RESOURCE_NAME`] for cluster rules)
    pub resource_name: String,
    /// `LITERAL` or `PREFIXED`, upper-cased
    pub pattern_type: String,
    /// Operation such as `READ` or `ALL`, upper-cased
    pub operation: String,
    /// Allow or deny
    pub permission: Permission,
    /// Value of the `ERROR` column ([`NO_ERROR`] when absent)
    pub error: String,
}

type RuleKey<'a> = (
    &'a Principal,
    &'a str,
    &'a ResourceType,
    &'a str,
    &'a str,
    &'a str,
    &'a Permission,
);

impl CanonicalRule {
    /// Build an `ALLOW` rule on any host, the shape every desired row takes.
    pub fn allow(
        principal: Principal,
        resource_type: ResourceType,
        resource_name: impl Into<String>,
        pattern_type: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            principal,
            host: WILDCARD_HOST.to_string(),
            resource_type,
            resource_name: resource_name.into(),
            pattern_type: pattern_type.into(),
            operation: operation.into(),
            permission: Permission::Allow,
            error: NO_ERROR.to_string(),
        }
    }

    /// Build an `ALLOW` cluster rule carrying the sentinel resource name.
    pub fn allow_cluster(
        principal: Principal,
        pattern_type: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self::allow(
            principal,
            ResourceType::Cluster,
            CLUSTER_RESOURCE_NAME,
            pattern_type,
            operation,
        )
    }

    /// Replace the error column.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    /// Whether the rule applies to every host.
    pub fn is_any_host(&self) -> bool {
        self.host == WILDCARD_HOST
    }

    fn key(&self) -> RuleKey<'_> {
        (
            &self.principal,
            &self.host,
            &self.resource_type,
            &self.resource_name,
            &self.pattern_type,
            &self.operation,
            &self.permission,
        )
    }

    /// Row values in [`TABLE_COLUMNS`] order.
    pub fn columns(&self) -> [String; 8] {
        [
            self.principal.to_string(),
            self.host.clone(),
            self.resource_type.to_string(),
            self.resource_name.clone(),
            self.pattern_type.clone(),
            self.operation.clone(),
            self.permission.to_string(),
            self.error.clone(),
        ]
    }
}

impl PartialEq for CanonicalRule {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CanonicalRule {}

impl Hash for CanonicalRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for CanonicalRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CanonicalRule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for CanonicalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}:{} ({}) on host {}",
            self.permission,
            self.principal,
            self.operation,
            self.resource_type,
            self.resource_name,
            self.pattern_type,
            self.host
        )
    }
}

impl Serialize for CanonicalRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let [principal, host, resource_type, resource_name, pattern_type, operation, permission, error] =
            self.columns();
        let mut row = serializer.serialize_struct("CanonicalRule", TABLE_COLUMNS.len())?;
        row.serialize_field("PRINCIPAL", &principal)?;
        row.serialize_field("HOST", &host)?;
        row.serialize_field("RESOURCE-TYPE", &resource_type)?;
        row.serialize_field("RESOURCE-NAME", &resource_name)?;
        row.serialize_field("RESOURCE-PATTERN-TYPE", &pattern_type)?;
        row.serialize_field("OPERATION", &operation)?;
        row.serialize_field("PERMISSION", &permission)?;
        row.serialize_field("ERROR", &error)?;
        row.end()
    }
}

/// A set of canonical rules in deterministic (identity) order.
pub type RuleSet = BTreeSet<CanonicalRule>;

/// What to do with a rule on the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `rpk acl create`
    Create,
    /// `rpk acl delete`
    Delete,
}

impl Action {
    /// The `rpk acl` subcommand for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `rpk` authenticates against the brokers.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Unauthenticated cluster
    None,
    /// SASL/SCRAM credentials
    Sasl {
        /// SASL user
        user: String,
        /// SASL password
        password: String,
        /// Mechanism override (`SCRAM-SHA-256`, `SCRAM-SHA-512`)
        mechanism: Option<String>,
    },
}

impl Auth {
    /// Arguments appended to every `rpk` invocation.
    pub fn args(&self) -> Vec<String> {
        match self {
            Auth::None => Vec::new(),
            Auth::Sasl {
                user,
                password,
                mechanism,
            } => {
                let mut args = vec![
                    "--user".to_string(),
                    user.clone(),
                    "--password".to_string(),
                    password.clone(),
                ];
                if let Some(mechanism) = mechanism {
                    args.extend(["--sasl-mechanism".to_string(), mechanism.clone()]);
                }
                args
            }
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => f.write_str("None"),
            Auth::Sasl {
                user, mechanism, ..
            } => f
                .debug_struct("Sasl")
                .field("user", user)
                .field("password", &"***")
                .field("mechanism", mechanism)
                .finish(),
        }
    }
}

/// Where and how to reach the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Comma-separated broker addresses
    pub brokers: String,
    /// Authentication arguments
    pub auth: Auth,
}

impl Connection {
    /// Create a connection.
    pub fn new(brokers: impl Into<String>, auth: Auth) -> Self {
        Self {
            brokers: brokers.into(),
            auth,
        }
    }

    /// Connection to an unauthenticated cluster.
    pub fn local(brokers: impl Into<String>) -> Self {
        Self::new(brokers, Auth::None)
    }
}

/// Retry configuration for a single `rpk` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 means no retry)
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}
