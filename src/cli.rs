use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aclsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative ACL reconciliation for Redpanda/Kafka clusters", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

// ============================================================================
// Connection
// ============================================================================

#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Config file (defaults to ~/.config/aclsync/config.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Comma-separated broker addresses
    #[arg(long, global = true, env = "RPK_BROKERS", value_name = "HOSTS")]
    pub brokers: Option<String>,

    /// SASL user
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// File holding the SASL password
    #[arg(long, global = true, value_name = "PATH")]
    pub password_file: Option<String>,

    /// SASL mechanism passed through to rpk
    #[arg(long, global = true, value_name = "MECHANISM")]
    pub sasl_mechanism: Option<String>,

    /// Local cluster: send no credentials
    #[arg(long, global = true)]
    pub local: bool,

    /// rpk executable to use
    #[arg(long, global = true, value_name = "PATH")]
    pub rpk: Option<String>,

    /// Attempts per rpk invocation (network errors only)
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Concurrent invocations within one phase
    #[arg(short, long, global = true, value_name = "N")]
    pub jobs: Option<usize>,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would create and delete
    Plan {
        /// Desired-state document (JSON or TOML)
        desired: PathBuf,
    },

    /// Converge the cluster to the desired state
    Apply(ApplyArgs),

    /// List ACLs currently on the cluster
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: RenderFormat,
    },

    /// Print the normalized rows of a desired-state document
    Render {
        /// Desired-state document (JSON or TOML)
        desired: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: RenderFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Desired-state document (JSON or TOML)
    pub desired: PathBuf,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Dry run - show what would be done
    #[arg(short, long)]
    pub dry_run: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    Table,
    Json,
}
