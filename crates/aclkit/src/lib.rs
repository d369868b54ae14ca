//! # aclkit
//!
//! Pure Rust library for reconciling Redpanda/Kafka ACLs through `rpk`.
//!
//! This crate provides functionality for:
//! - Normalizing a declarative ACL document into canonical rules
//! - Parsing `rpk acl list` output into the same representation
//! - Computing what to create and delete to converge a cluster
//! - Building and running `rpk acl create|delete` invocations
//!
//! ## Example
//!
//! ```no_run
//! use aclkit::{AclDocument, Client, Connection};
//! use aclkit::apply::ApplyOptions;
//! use std::path::Path;
//!
//! let client = Client::new("rpk", Connection::local("localhost:9092")).expect("rpk not available");
//! let document = AclDocument::load(Path::new("acls.json")).expect("Failed to load");
//!
//! // Preview
//! let reconciliation = client.reconcile(&document).expect("Listing failed");
//! for rule in &reconciliation.to_create {
//!     println!("+ {rule}");
//! }
//!
//! // Converge
//! let summary = client.sync(&document, &ApplyOptions::default()).expect("Apply failed");
//! println!("{} created, {} deleted", summary.created, summary.deleted);
//! ```
//!
//! ## Retry Logic
//!
//! Invocations that fail with a network error can be retried with
//! exponential backoff. Configure retry behavior with [`RetryConfig`]
//! through [`apply::ApplyOptions`]; it is off by default.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apply;
pub mod backend;
pub mod command;
pub mod desired;
pub mod error;
pub mod listing;
pub mod reconcile;
pub mod retry;
pub mod types;

pub use apply::{ApplyOptions, ApplyPlan, ApplySummary, NoProgress, ProgressCallback};
pub use command::RuleCommand;
pub use desired::{AclDocument, normalize};
pub use error::{Error, ErrorCategory, Result};
pub use reconcile::{Reconciliation, reconcile};
pub use types::{
    Action, Auth, CanonicalRule, Connection, Permission, Principal, ResourceType, RetryConfig,
    RuleSet,
};

use backend::{Backend, rpk::RpkBackend};

/// High-level client for one cluster.
///
/// The client pairs a backend with the connection every invocation uses.
pub struct Client {
    backend: Box<dyn Backend>,
    connection: Connection,
}

impl Client {
    /// Create a client driving the given `rpk` executable.
    ///
    /// Returns an error if `rpk` cannot be found.
    pub fn new(rpk: &str, connection: Connection) -> Result<Self> {
        let backend = RpkBackend::new(rpk)?;
        Ok(Self {
            backend: Box::new(backend),
            connection,
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>, connection: Connection) -> Self {
        Self {
            backend,
            connection,
        }
    }

    /// Connection used for every invocation.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Check if the backend can be used.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Raw `rpk acl list` output.
    pub fn list_raw(&self) -> Result<String> {
        self.backend.list(&self.connection)
    }

    /// Rules currently on the cluster.
    pub fn actual_rules(&self) -> Result<RuleSet> {
        listing::parse_listing(&self.list_raw()?)
    }

    /// Compare a document against the cluster.
    pub fn reconcile(&self, document: &AclDocument) -> Result<Reconciliation> {
        let desired = normalize(document);
        let actual = self.actual_rules()?;
        Ok(reconcile::reconcile(&desired, &actual))
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Build every invocation a reconciliation needs.
    pub fn build_plan(&self, reconciliation: &Reconciliation) -> Result<ApplyPlan> {
        ApplyPlan::build(reconciliation, &self.connection)
    }

    /// Run a plan with progress reporting.
    pub fn apply<P: ProgressCallback>(
        &self,
        plan: &ApplyPlan,
        opts: &ApplyOptions,
        progress: &mut P,
    ) -> Result<ApplySummary> {
        apply::apply(self.backend.as_ref(), plan, opts, progress)
    }

    /// Reconcile, plan and apply in one step.
    pub fn sync(&self, document: &AclDocument, opts: &ApplyOptions) -> Result<ApplySummary> {
        let reconciliation = self.reconcile(document)?;
        let plan = self.build_plan(&reconciliation)?;
        self.apply(&plan, opts, &mut NoProgress)
    }
}
