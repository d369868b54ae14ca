//! Two-phase application of a reconciliation.
//!
//! Every invocation is built before anything runs, so a rule that cannot
//! be expressed aborts the run with the cluster untouched. Creates run
//! first, then deletes; the delete phase only starts once every create
//! succeeded. There is no rollback: a failure leaves earlier invocations
//! applied, and re-running converges the rest.

use crate::backend::Backend;
use crate::command::RuleCommand;
use crate::error::{Error, Result};
use crate::reconcile::Reconciliation;
use crate::retry::{LogCallback, with_retry};
use crate::types::{Action, Connection, RetryConfig};
use rayon::prelude::*;

/// Invocations for both phases, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyPlan {
    /// Phase 1
    pub creates: Vec<RuleCommand>,
    /// Phase 2
    pub deletes: Vec<RuleCommand>,
}

impl ApplyPlan {
    /// Build every invocation a reconciliation needs.
    pub fn build(reconciliation: &Reconciliation, connection: &Connection) -> Result<Self> {
        let creates = reconciliation
            .to_create
            .iter()
            .map(|rule| RuleCommand::new(rule, Action::Create, connection))
            .collect::<Result<Vec<_>>>()?;
        let deletes = reconciliation
            .to_delete
            .iter()
            .map(|rule| RuleCommand::new(rule, Action::Delete, connection))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { creates, deletes })
    }

    /// Phases in the order they run.
    pub fn phases(&self) -> [(Action, &[RuleCommand]); 2] {
        [
            (Action::Create, self.creates.as_slice()),
            (Action::Delete, self.deletes.as_slice()),
        ]
    }

    /// Total number of invocations.
    pub fn total(&self) -> usize {
        self.creates.len() + self.deletes.len()
    }

    /// Whether there is nothing to run.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Options for applying a plan.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Build and report, but run nothing
    pub dry_run: bool,
    /// Concurrent invocations within one phase (1 = sequential)
    pub jobs: usize,
    /// Retry policy per invocation
    pub retry: RetryConfig,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 1,
            retry: RetryConfig::no_retry(),
        }
    }
}

/// Progress callback for plan execution.
pub trait ProgressCallback: Send {
    /// Called before a non-empty phase starts.
    fn on_phase_start(&mut self, action: Action, count: usize);

    /// Called after each invocation, with its error if it failed.
    fn on_command_complete(&mut self, command: &RuleCommand, error: Option<&Error>);

    /// Called when a phase finished without failures.
    fn on_phase_complete(&mut self, action: Action);
}

/// No-op progress callback.
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&mut self, _action: Action, _count: usize) {}
    fn on_command_complete(&mut self, _command: &RuleCommand, _error: Option<&Error>) {}
    fn on_phase_complete(&mut self, _action: Action) {}
}

/// What an apply run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Rules created
    pub created: usize,
    /// Rules deleted
    pub deleted: usize,
    /// Invocations not run (dry run)
    pub skipped: usize,
}

impl ApplySummary {
    /// Total number of changes made.
    pub fn total_changes(&self) -> usize {
        self.created + self.deleted
    }
}

/// Run a plan against a backend: all creates, then all deletes.
///
/// Returns the first failing invocation's error; later invocations in the
/// same phase (sequential mode) and the whole delete phase are not run.
pub fn apply<B, P>(
    backend: &B,
    plan: &ApplyPlan,
    opts: &ApplyOptions,
    progress: &mut P,
) -> Result<ApplySummary>
where
    B: Backend + ?Sized,
    P: ProgressCallback,
{
    if opts.dry_run {
        return Ok(ApplySummary {
            skipped: plan.total(),
            ..Default::default()
        });
    }

    let mut summary = ApplySummary::default();

    for (action, commands) in plan.phases() {
        if commands.is_empty() {
            continue;
        }

        log::info!("{} phase: {} ACLs", action, commands.len());
        progress.on_phase_start(action, commands.len());

        let done = if opts.jobs <= 1 || commands.len() == 1 {
            run_sequential(backend, commands, &opts.retry, progress)?
        } else {
            run_parallel(backend, commands, opts.jobs, &opts.retry, progress)?
        };

        match action {
            Action::Create => summary.created += done,
            Action::Delete => summary.deleted += done,
        }
        progress.on_phase_complete(action);
    }

    Ok(summary)
}

/// Apply with defaults and no progress reporting.
pub fn apply_simple<B: Backend + ?Sized>(backend: &B, plan: &ApplyPlan) -> Result<ApplySummary> {
    apply(backend, plan, &ApplyOptions::default(), &mut NoProgress)
}

fn run_one<B: Backend + ?Sized>(backend: &B, command: &RuleCommand, retry: &RetryConfig) -> Result<()> {
    with_retry(retry, Some(&LogCallback), || backend.execute(command))
}

fn run_sequential<B, P>(
    backend: &B,
    commands: &[RuleCommand],
    retry: &RetryConfig,
    progress: &mut P,
) -> Result<usize>
where
    B: Backend + ?Sized,
    P: ProgressCallback,
{
    for command in commands {
        let result = run_one(backend, command, retry);
        progress.on_command_complete(command, result.as_ref().err());
        result?;
    }
    Ok(commands.len())
}

/// Run a whole phase on a bounded pool, then report in plan order.
fn run_parallel<B, P>(
    backend: &B,
    commands: &[RuleCommand],
    jobs: usize,
    retry: &RetryConfig,
    progress: &mut P,
) -> Result<usize>
where
    B: Backend + ?Sized,
    P: ProgressCallback,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| Error::CommandFailed {
            message: format!("failed to create thread pool: {e}"),
            stderr: String::new(),
        })?;

    let results: Vec<Result<()>> = pool.install(|| {
        commands
            .par_iter()
            .map(|command| run_one(backend, command, retry))
            .collect()
    });

    let mut first_error = None;
    for (command, result) in commands.iter().zip(results) {
        progress.on_command_complete(command, result.as_ref().err());
        if let Err(e) = result
            && first_error.is_none()
        {
            first_error = Some(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(commands.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::desired::normalize_json;
    use crate::listing::parse_listing;
    use crate::reconcile::reconcile;
    use crate::types::{CanonicalRule, Principal, ResourceType, RuleSet};

    const DESIRED: &str = r#"{
        "alice": {"acls": [
            {"resource-pattern-type": "literal", "operation": ["read", "write"], "topic": ["orders"]}
        ]},
        "svc": {"acls": [
            {"resource-pattern-type": "prefixed", "operation": ["read"], "group": ["svc-"], "cluster": true}
        ]}
    }"#;

    fn conn() -> Connection {
        Connection::local("localhost:9092")
    }

    fn stale_rules() -> RuleSet {
        [
            CanonicalRule::allow(
                Principal::user("alice"),
                ResourceType::Topic,
                "orders",
                "LITERAL",
                "READ",
            ),
            CanonicalRule::allow_cluster(Principal::user("bob"), "LITERAL", "ALL"),
        ]
        .into_iter()
        .collect()
    }

    fn plan_for(backend: &MemoryBackend, desired: &RuleSet) -> ApplyPlan {
        let actual = parse_listing(&backend.list(&conn()).unwrap()).unwrap();
        ApplyPlan::build(&reconcile(desired, &actual), &conn()).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ProgressCallback for Recorder {
        fn on_phase_start(&mut self, action: Action, count: usize) {
            self.events.push(format!("start {action} {count}"));
        }
        fn on_command_complete(&mut self, command: &RuleCommand, error: Option<&Error>) {
            let status = if error.is_some() { "failed" } else { "ok" };
            self.events.push(format!("{} {status}", command.action));
        }
        fn on_phase_complete(&mut self, action: Action) {
            self.events.push(format!("end {action}"));
        }
    }

    #[test]
    fn test_apply_converges_and_is_idempotent() {
        let desired = normalize_json(DESIRED).unwrap();
        let backend = MemoryBackend::with_rules(stale_rules());

        let plan = plan_for(&backend, &desired);
        assert_eq!(plan.creates.len(), 3);
        assert_eq!(plan.deletes.len(), 1);

        let summary = apply_simple(&backend, &plan).unwrap();
        assert_eq!(summary.created, 3);
        assert_eq!(summary.deleted, 1);
        assert_eq!(backend.rules(), desired);

        let second = plan_for(&backend, &desired);
        assert!(second.is_empty());
    }

    #[test]
    fn test_creates_run_before_deletes() {
        let desired = normalize_json(DESIRED).unwrap();
        let backend = MemoryBackend::with_rules(stale_rules());
        let mut recorder = Recorder::default();

        apply(
            &backend,
            &plan_for(&backend, &desired),
            &ApplyOptions::default(),
            &mut recorder,
        )
        .unwrap();

        let actions: Vec<Action> = backend.history().iter().map(|c| c.action).collect();
        assert_eq!(
            actions,
            [Action::Create, Action::Create, Action::Create, Action::Delete]
        );
        assert_eq!(recorder.events.first().map(String::as_str), Some("start create 3"));
        assert_eq!(recorder.events.last().map(String::as_str), Some("end delete"));
    }

    #[test]
    fn test_create_failure_stops_before_deletes() {
        let desired = normalize_json(DESIRED).unwrap();
        let backend = MemoryBackend::with_rules(stale_rules());
        let plan = plan_for(&backend, &desired);
        backend.fail_on(plan.creates[1].rule.clone());

        let err = apply_simple(&backend, &plan).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));

        let history = backend.history();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|c| c.action == Action::Create));
        // No rollback of the create that succeeded
        assert!(backend.rules().contains(&plan.creates[0].rule));
        assert!(backend.rules().contains(&plan.deletes[0].rule));
    }

    #[test]
    fn test_parallel_phase_reports_first_failure() {
        let desired = normalize_json(DESIRED).unwrap();
        let backend = MemoryBackend::with_rules(stale_rules());
        let plan = plan_for(&backend, &desired);
        backend.fail_on(plan.creates[2].rule.clone());

        let opts = ApplyOptions {
            jobs: 4,
            ..Default::default()
        };
        let mut recorder = Recorder::default();
        assert!(apply(&backend, &plan, &opts, &mut recorder).is_err());

        // Whole create phase ran, delete phase did not
        assert_eq!(backend.history().len(), 3);
        assert!(recorder.events.contains(&"create failed".to_string()));
        assert!(!recorder.events.iter().any(|e| e.starts_with("start delete")));
    }

    #[test]
    fn test_parallel_apply_converges() {
        let desired = normalize_json(DESIRED).unwrap();
        let backend = MemoryBackend::with_rules(stale_rules());
        let opts = ApplyOptions {
            jobs: 4,
            ..Default::default()
        };

        let summary = apply(&backend, &plan_for(&backend, &desired), &opts, &mut NoProgress).unwrap();
        assert_eq!(summary.total_changes(), 4);
        assert_eq!(backend.rules(), desired);
    }

    #[test]
    fn test_dry_run_executes_nothing() {
        let desired = normalize_json(DESIRED).unwrap();
        let backend = MemoryBackend::with_rules(stale_rules());
        let opts = ApplyOptions {
            dry_run: true,
            ..Default::default()
        };

        let summary = apply(&backend, &plan_for(&backend, &desired), &opts, &mut NoProgress).unwrap();
        assert_eq!(summary.skipped, 4);
        assert_eq!(summary.total_changes(), 0);
        assert!(backend.history().is_empty());
    }

    #[test]
    fn test_unsupported_row_aborts_before_any_invocation() {
        let odd = CanonicalRule::allow(
            Principal::user("x"),
            ResourceType::Other("DELEGATION_TOKEN".to_string()),
            "t",
            "LITERAL",
            "READ",
        );
        let reconciliation = Reconciliation {
            to_create: normalize_json(DESIRED).unwrap(),
            to_delete: [odd].into_iter().collect(),
            ..Default::default()
        };

        let err = ApplyPlan::build(&reconciliation, &conn()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedResourceType { .. }));
    }
}
