//! Settings assembly: CLI flags, environment, and the optional config file.
//!
//! Precedence is flag > environment > config file > default. The flag and
//! environment layers are merged by clap before anything here runs.

use aclkit::{ApplyOptions, Auth, Connection, RetryConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::ConnectionArgs;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_RPK: &str = "rpk";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("aclsync"));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("aclsync"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no broker address: pass --brokers, set RPK_BROKERS, or add `brokers` to the config file")]
    MissingBrokers,

    #[error("SASL credentials required: pass --user and --password-file, or --local")]
    MissingCredentials,

    #[error("password file {0} is empty")]
    EmptyPassword(String),

    #[error("jobs must be at least 1")]
    InvalidJobs,
}

// ============================================================================
// Config File
// ============================================================================

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub brokers: Option<String>,
    pub user: Option<String>,
    pub password_file: Option<String>,
    pub sasl_mechanism: Option<String>,
    pub rpk: Option<String>,
    pub retries: Option<u32>,
    pub jobs: Option<usize>,
    pub local: Option<bool>,
}

impl FileConfig {
    /// Parse a config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load the explicit config file, or the default one if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        let path = config_dir()?.join(CONFIG_FILE);
        if path.exists() {
            log::debug!("using config file {}", path.display());
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Everything a cluster command needs, resolved once.
#[derive(Debug, Clone)]
pub struct Settings {
    pub connection: Connection,
    pub rpk: String,
    pub retries: u32,
    pub jobs: usize,
}

impl Settings {
    /// Resolve settings from flags and the config file they point at.
    pub fn load(args: &ConnectionArgs) -> Result<Self> {
        let file = FileConfig::load(args.config.as_deref())?;
        Self::resolve(args, file)
    }

    /// Merge flags (already merged with the environment) over a config file.
    pub fn resolve(args: &ConnectionArgs, file: FileConfig) -> Result<Self> {
        let brokers = args
            .brokers
            .clone()
            .or(file.brokers)
            .filter(|b| !b.trim().is_empty())
            .ok_or(ConfigError::MissingBrokers)?;

        let local = args.local || file.local.unwrap_or(false);
        let auth = if local {
            Auth::None
        } else {
            let user = args.user.clone().or(file.user);
            let password_file = args.password_file.clone().or(file.password_file);
            let (Some(user), Some(password_file)) = (user, password_file) else {
                return Err(ConfigError::MissingCredentials.into());
            };
            Auth::Sasl {
                user,
                password: read_password(&password_file)?,
                mechanism: args.sasl_mechanism.clone().or(file.sasl_mechanism),
            }
        };

        let jobs = args.jobs.or(file.jobs).unwrap_or(1);
        if jobs == 0 {
            return Err(ConfigError::InvalidJobs.into());
        }

        Ok(Self {
            connection: Connection::new(brokers, auth),
            rpk: args
                .rpk
                .clone()
                .or(file.rpk)
                .unwrap_or_else(|| DEFAULT_RPK.to_string()),
            retries: args.retries.or(file.retries).unwrap_or(1).max(1),
            jobs,
        })
    }

    /// Retry policy for one invocation.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retries,
            ..RetryConfig::default()
        }
    }

    /// Apply options for a run.
    pub fn apply_options(&self, dry_run: bool) -> ApplyOptions {
        ApplyOptions {
            dry_run,
            jobs: self.jobs,
            retry: self.retry(),
        }
    }
}

/// Read a password file, expanding `~` and dropping the trailing newline.
pub fn read_password(path: &str) -> Result<String> {
    let expanded = shellexpand::tilde(path);
    let content = fs::read_to_string(&*expanded)
        .with_context(|| format!("Could not read password file {expanded}"))?;
    let password = content.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(ConfigError::EmptyPassword(expanded.into_owned()).into());
    }
    Ok(password)
}
