//! In-memory backend simulating a cluster's ACL store.

use crate::backend::Backend;
use crate::command::RuleCommand;
use crate::error::{Error, Result};
use crate::listing::format_table;
use crate::types::{Action, CanonicalRule, Connection, RuleSet};
use std::sync::Mutex;

/// Backend holding ACLs in memory and recording every invocation.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rules: Mutex<RuleSet>,
    history: Mutex<Vec<RuleCommand>>,
    failing: Mutex<Vec<CanonicalRule>>,
}

impl MemoryBackend {
    /// Empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cluster already holding `rules`.
    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            rules: Mutex::new(rules),
            ..Self::default()
        }
    }

    /// Make every invocation touching `rule` fail.
    pub fn fail_on(&self, rule: CanonicalRule) {
        lock(&self.failing).push(rule);
    }

    /// Current rules.
    pub fn rules(&self) -> RuleSet {
        lock(&self.rules).clone()
    }

    /// Invocations executed so far, in order.
    pub fn history(&self) -> Vec<RuleCommand> {
        lock(&self.history).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl Backend for MemoryBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn list(&self, _connection: &Connection) -> Result<String> {
        Ok(format_table(&*lock(&self.rules)))
    }

    fn execute(&self, command: &RuleCommand) -> Result<()> {
        lock(&self.history).push(command.clone());

        if lock(&self.failing).contains(&command.rule) {
            return Err(Error::CommandFailed {
                message: format!("rpk failed for {} {}", command.action, command.rule),
                stderr: "injected failure".to_string(),
            });
        }

        let mut rules = lock(&self.rules);
        match command.action {
            Action::Create => {
                rules.insert(command.rule.clone());
            }
            Action::Delete => {
                rules.remove(&command.rule);
            }
        }
        Ok(())
    }
}
