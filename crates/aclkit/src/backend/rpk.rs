//! Real backend using `rpk acl` commands.

use crate::backend::Backend;
use crate::command::{RuleCommand, list_args};
use crate::error::{Error, Result};
use crate::types::Connection;
use std::io::ErrorKind;
use std::process::{Command, Output};

/// Backend that executes real `rpk` commands.
pub struct RpkBackend {
    /// Path or name of the rpk executable
    rpk_path: String,
}

impl RpkBackend {
    /// Create a new RpkBackend.
    ///
    /// A bare name is looked up on PATH; returns an error if it cannot be found.
    pub fn new(rpk: &str) -> Result<Self> {
        let rpk_path = find_rpk(rpk)?;
        Ok(Self { rpk_path })
    }

    /// Run rpk and return its raw output.
    fn run_rpk(&self, args: &[String]) -> Result<Output> {
        Command::new(&self.rpk_path)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::RpkNotFound(self.rpk_path.clone()),
                _ => Error::CommandFailed {
                    message: format!("failed to execute rpk: {e}"),
                    stderr: String::new(),
                },
            })
    }

    /// Run rpk and check for success.
    fn run_rpk_checked(&self, args: &[String], context: &str) -> Result<String> {
        let output = self.run_rpk(args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_rpk_output(&stderr, context));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Backend for RpkBackend {
    fn is_available(&self) -> bool {
        self.run_rpk(&["version".to_string()])
            .is_ok_and(|output| output.status.success())
    }

    fn list(&self, connection: &Connection) -> Result<String> {
        log::info!("listing ACLs on {}", connection.brokers);
        let stdout = self.run_rpk_checked(&list_args(connection), "acl list")?;
        Ok(stdout.trim().to_string())
    }

    fn execute(&self, command: &RuleCommand) -> Result<()> {
        log::debug!("running {command}");
        let context = format!("{} {}", command.action, command.rule);
        self.run_rpk_checked(&command.args, &context)?;
        Ok(())
    }
}

/// Resolve the rpk executable.
fn find_rpk(rpk: &str) -> Result<String> {
    // Explicit paths are used as given
    if rpk.contains(std::path::MAIN_SEPARATOR) {
        if std::path::Path::new(rpk).exists() {
            return Ok(rpk.to_string());
        }
        return Err(Error::RpkNotFound(rpk.to_string()));
    }

    let output = Command::new("which")
        .arg(rpk)
        .output()
        .map_err(|_| Error::RpkNotFound(rpk.to_string()))?;

    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Ok(path);
        }
    }

    Err(Error::RpkNotFound(rpk.to_string()))
}
