use aclkit::listing::format_table;
use aclkit::{Action, CanonicalRule, RuleCommand};
use colored::{ColoredString, Colorize};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Rule Tables
// ============================================================================

/// Marker shown in front of a row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Add,
    Remove,
}

impl Marker {
    fn symbol(self) -> ColoredString {
        match self {
            Marker::Add => "+".green(),
            Marker::Remove => "-".red(),
        }
    }
}

impl From<Action> for Marker {
    fn from(action: Action) -> Self {
        match action {
            Action::Create => Marker::Add,
            Action::Delete => Marker::Remove,
        }
    }
}

/// Lay out rows under the column header, padded to the widest cell.
pub fn rule_table<'a>(rules: impl IntoIterator<Item = &'a CanonicalRule>) -> Vec<String> {
    format_table(rules).lines().map(str::to_string).collect()
}

/// Print a rule table, every row prefixed with `marker`.
pub fn print_rules<'a>(rules: impl IntoIterator<Item = &'a CanonicalRule>, marker: Marker) {
    let mut lines = rule_table(rules).into_iter();
    if let Some(head) = lines.next() {
        println!("    {}", head.dimmed());
    }
    for line in lines {
        let row = match marker {
            Marker::Add => line.green(),
            Marker::Remove => line.red(),
        };
        println!("  {} {}", marker.symbol(), row);
    }
}

/// Print the exact invocations a phase would run.
pub fn print_commands(commands: &[RuleCommand]) {
    for command in commands {
        println!("  {} {}", Marker::from(command.action).symbol(), command.to_string().dimmed());
    }
}
