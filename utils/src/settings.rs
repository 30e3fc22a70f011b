use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::config_path::get_tables_path;

pub const DEFAULT_WORKING_DIR: &str = "./terraform_workspaces";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 1800;
pub const DEFAULT_TERRAFORM_BINARY: &str = "terraform";

/// Runtime settings for the runner, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    pub working_dir: PathBuf,
    pub command_timeout: Duration,
    pub terraform_binary: String,
    pub require_approval: bool,
    pub dry_run: bool,
    pub tables_path: Option<PathBuf>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        RunnerSettings {
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            command_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            terraform_binary: DEFAULT_TERRAFORM_BINARY.to_string(),
            require_approval: false,
            dry_run: false,
            tables_path: None,
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(anyhow!("{} must be true or false, got '{}'", name, other)),
    }
}

impl RunnerSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source so tests do not need
    /// to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = RunnerSettings::default();

        if let Some(dir) = lookup("TERRAFORM_WORKING_DIR") {
            settings.working_dir = PathBuf::from(dir);
        }
        if let Some(timeout) = lookup("TERRAFORM_TIMEOUT_SECONDS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!(
                    "TERRAFORM_TIMEOUT_SECONDS must be a whole number of seconds, got '{}'",
                    timeout
                )
            })?;
            if seconds == 0 {
                return Err(anyhow!("TERRAFORM_TIMEOUT_SECONDS must be greater than zero"));
            }
            settings.command_timeout = Duration::from_secs(seconds);
        }
        if let Some(binary) = lookup("TERRAFORM_BINARY") {
            settings.terraform_binary = binary;
        }
        if let Some(value) = lookup("REQUIRE_APPROVAL") {
            settings.require_approval = parse_bool("REQUIRE_APPROVAL", &value)?;
        }
        if let Some(value) = lookup("DRY_RUN") {
            settings.dry_run = parse_bool("DRY_RUN", &value)?;
        }
        settings.tables_path = match lookup("DBXWEAVE_TABLES") {
            Some(path) => Some(PathBuf::from(path)),
            None => get_tables_path().ok().filter(|path| path.exists()),
        };

        Ok(settings)
    }

    /// Working directory for a given workspace, e.g. `./terraform_workspaces/ml-prod`
    pub fn workspace_dir(&self, workspace_name: &str) -> PathBuf {
        self.working_dir.join(workspace_name)
    }
}
