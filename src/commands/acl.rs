//! ACL commands: plan, apply, list and render.

use aclkit::{AclDocument, ApplyPlan, ApplySummary, CanonicalRule, Client, Reconciliation};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::Context as AppContext;
use crate::cli::RenderFormat;
use crate::config::Settings;
use crate::progress::{self, ApplyProgress};
use crate::ui::{self, Marker};

/// Create a client, turning a missing `rpk` into advice.
fn create_client(settings: &Settings) -> Result<Client> {
    let client = Client::new(&settings.rpk, settings.connection.clone()).map_err(explain)?;
    log::debug!("using {} against {}", settings.rpk, settings.connection.brokers);
    Ok(client)
}

/// Print category advice for a core error and hand it back for propagation.
fn explain(error: aclkit::Error) -> anyhow::Error {
    let category = error.category();
    ui::error(category.description());
    ui::dim(category.advice());
    error.into()
}

fn load_document(path: &Path) -> Result<AclDocument> {
    AclDocument::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Load, list, reconcile and build every invocation.
fn prepare(client: &Client, desired: &Path) -> Result<(Reconciliation, ApplyPlan)> {
    let document = load_document(desired)?;

    let pb = progress::spinner("Reading ACLs from cluster...");
    let reconciliation = match client.reconcile(&document) {
        Ok(r) => {
            progress::finish_success(
                &pb,
                &format!(
                    "{} desired, {} to create, {} to delete",
                    r.unchanged.len() + r.to_create.len(),
                    r.to_create.len(),
                    r.to_delete.len()
                ),
            );
            r
        }
        Err(e) => {
            progress::finish_error(&pb, "Failed to read ACLs");
            return Err(explain(e)).context("Could not compare against the cluster");
        }
    };

    let plan = client
        .build_plan(&reconciliation)
        .map_err(explain)
        .context("Refusing to change the cluster")?;

    Ok((reconciliation, plan))
}

fn show_changes(reconciliation: &Reconciliation, plan: &ApplyPlan, show_commands: bool) {
    if !reconciliation.to_create.is_empty() {
        ui::section(&format!("To create ({})", reconciliation.to_create.len()));
        ui::print_rules(&reconciliation.to_create, Marker::Add);
    }
    if !reconciliation.to_delete.is_empty() {
        ui::section(&format!("To delete ({})", reconciliation.to_delete.len()));
        ui::print_rules(&reconciliation.to_delete, Marker::Remove);
    }
    if show_commands {
        ui::section("Invocations");
        for (_, commands) in plan.phases() {
            ui::print_commands(commands);
        }
    }
}

pub fn plan(_ctx: &AppContext, settings: &Settings, desired: &Path) -> Result<()> {
    ui::header("ACL Plan");
    ui::kv("Desired", &desired.display().to_string());
    ui::kv("Brokers", &settings.connection.brokers);

    let client = create_client(settings)?;
    let (reconciliation, plan) = prepare(&client, desired)?;

    if reconciliation.is_converged() {
        println!();
        ui::success("Cluster already matches the desired state");
        return Ok(());
    }

    show_changes(&reconciliation, &plan, true);
    println!();
    ui::info(&format!(
        "{} changes. Run 'aclsync apply {}' to converge.",
        reconciliation.total_changes(),
        desired.display()
    ));
    Ok(())
}

pub fn apply(ctx: &AppContext, settings: &Settings, desired: &Path, yes: bool, dry_run: bool) -> Result<()> {
    ui::header(if dry_run { "ACL Apply (dry run)" } else { "ACL Apply" });
    ui::kv("Desired", &desired.display().to_string());
    ui::kv("Brokers", &settings.connection.brokers);

    let client = create_client(settings)?;
    let (reconciliation, plan) = prepare(&client, desired)?;

    if plan.is_empty() {
        println!();
        ui::success("Cluster already matches the desired state");
        return Ok(());
    }

    show_changes(&reconciliation, &plan, dry_run || ctx.verbose > 0);

    if dry_run {
        println!();
        ui::info(&format!("Dry run: {} invocations not executed", plan.total()));
        return Ok(());
    }

    if !yes && !confirm_proceed(&plan)? {
        ui::warn("Aborted, no changes made");
        return Ok(());
    }

    let mut reporter = ApplyProgress::new(ctx.quiet);
    let summary = client
        .apply(&plan, &settings.apply_options(false), &mut reporter)
        .map_err(explain)
        .context("Apply stopped; re-run to converge the remaining ACLs")?;

    print_summary(&summary);
    Ok(())
}

/// Confirm with user
fn confirm_proceed(plan: &ApplyPlan) -> Result<bool> {
    use dialoguer::Confirm;

    println!();
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Create {} and delete {} ACLs?",
            plan.creates.len(),
            plan.deletes.len()
        ))
        .default(false)
        .interact()
        .context("Confirmation needs a terminal; pass --yes to skip it")?;

    Ok(confirmed)
}

fn print_summary(summary: &ApplySummary) {
    println!();
    println!(
        "  {} {} created, {} deleted",
        "✓".green(),
        summary.created.to_string().green(),
        summary.deleted.to_string().red()
    );
}

pub fn list(_ctx: &AppContext, settings: &Settings, format: RenderFormat) -> Result<()> {
    let client = create_client(settings)?;
    let rules = client
        .actual_rules()
        .map_err(explain)
        .context("Could not list ACLs")?;
    print_rows(&rules, format)
}

pub fn render(_ctx: &AppContext, desired: &Path, format: RenderFormat) -> Result<()> {
    let document = load_document(desired)?;
    let rules = aclkit::normalize(&document);
    log::info!(
        "{} definitions expanded to {} rows",
        document.row_count(),
        rules.len()
    );
    print_rows(&rules, format)
}

fn print_rows<'a>(rules: impl IntoIterator<Item = &'a CanonicalRule>, format: RenderFormat) -> Result<()> {
    match format {
        RenderFormat::Table => {
            for line in ui::rule_table(rules) {
                println!("{line}");
            }
        }
        RenderFormat::Json => {
            let rows: Vec<&CanonicalRule> = rules.into_iter().collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
