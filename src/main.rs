mod cli;
mod commands;
mod config;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Settings;
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Command::Plan { desired } => {
            let settings = Settings::load(&cli.connection)?;
            commands::acl::plan(&ctx, &settings, &desired)
        }
        Command::Apply(args) => {
            let settings = Settings::load(&cli.connection)?;
            commands::acl::apply(&ctx, &settings, &args.desired, args.yes, args.dry_run)
        }
        Command::List { format } => {
            let settings = Settings::load(&cli.connection)?;
            commands::acl::list(&ctx, &settings, format)
        }
        Command::Render { desired, format } => commands::acl::render(&ctx, &desired, format),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "aclsync", &mut io::stdout());
            Ok(())
        }
    }
}
