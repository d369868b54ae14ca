//! Backend abstraction for cluster ACL operations.
//!
//! The [`Backend`] trait is the only way the crate touches a cluster,
//! allowing for different implementations (real `rpk`, in-memory for testing).

pub mod memory;
pub mod rpk;

use crate::command::RuleCommand;
use crate::error::Result;
use crate::types::Connection;

/// Backend trait for cluster ACL operations.
///
/// This trait abstracts how ACLs are read and changed, enabling:
/// - Real CLI execution via `rpk`
/// - In-memory clusters for testing
pub trait Backend: Send + Sync {
    /// Check if the backend can be used at all.
    fn is_available(&self) -> bool;

    /// Raw `rpk acl list` output, header line included.
    fn list(&self, connection: &Connection) -> Result<String>;

    /// Run one create/delete invocation.
    fn execute(&self, command: &RuleCommand) -> Result<()>;
}
