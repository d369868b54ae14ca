//! Set difference between desired and actual rules.

use crate::types::RuleSet;

/// Outcome of comparing desired against actual rules.
///
/// `to_delete` keeps the rows as the cluster reported them (including the
/// error column); `to_create` and `unchanged` keep the desired rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Rules declared but missing on the cluster
    pub to_create: RuleSet,
    /// Rules on the cluster but not declared
    pub to_delete: RuleSet,
    /// Rules present on both sides
    pub unchanged: RuleSet,
}

impl Reconciliation {
    /// Whether the cluster already matches the desired state.
    pub fn is_converged(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }

    /// Number of invocations needed to converge.
    pub fn total_changes(&self) -> usize {
        self.to_create.len() + self.to_delete.len()
    }
}

/// Compute `desired \ actual`, `actual \ desired` and their intersection.
pub fn reconcile(desired: &RuleSet, actual: &RuleSet) -> Reconciliation {
    let reconciliation = Reconciliation {
        to_create: desired.difference(actual).cloned().collect(),
        to_delete: actual.difference(desired).cloned().collect(),
        unchanged: desired.intersection(actual).cloned().collect(),
    };
    log::debug!(
        "reconciled {} desired against {} actual: {} to create, {} to delete, {} unchanged",
        desired.len(),
        actual.len(),
        reconciliation.to_create.len(),
        reconciliation.to_delete.len(),
        reconciliation.unchanged.len()
    );
    reconciliation
}
