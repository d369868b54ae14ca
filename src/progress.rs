//! Progress indicators for the aclsync CLI.

use aclkit::{Action, Error, ProgressCallback, RuleCommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a single blocking step.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Bar counting invocations within one phase.
pub fn bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_message(msg.to_string());
    pb
}

pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    println!("{} {}", "✓".green(), msg);
}

pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    eprintln!("{} {}", "✗".red(), msg);
}

/// Reports apply phases as progress bars.
///
/// Quiet mode keeps the bars hidden but still reports failures.
pub struct ApplyProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl ApplyProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }
}

impl ProgressCallback for ApplyProgress {
    fn on_phase_start(&mut self, action: Action, count: usize) {
        let label = match action {
            Action::Create => "Creating ACLs",
            Action::Delete => "Deleting ACLs",
        };
        let pb = if self.quiet {
            ProgressBar::hidden()
        } else {
            bar(count as u64, label)
        };
        self.bar = Some(pb);
    }

    fn on_command_complete(&mut self, command: &RuleCommand, error: Option<&Error>) {
        let Some(pb) = &self.bar else {
            return;
        };
        match error {
            None => pb.inc(1),
            Some(e) => {
                pb.suspend(|| {
                    eprintln!("{} {} {}: {}", "✗".red(), command.action, command.rule, e);
                });
                pb.inc(1);
            }
        }
    }

    fn on_phase_complete(&mut self, action: Action) {
        if let Some(pb) = self.bar.take() {
            let done = pb.position();
            let msg = match action {
                Action::Create => format!("Created {done} ACLs"),
                Action::Delete => format!("Deleted {done} ACLs"),
            };
            if self.quiet {
                pb.finish_and_clear();
            } else {
                finish_success(&pb, &msg);
            }
        }
    }
}
