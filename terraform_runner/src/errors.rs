use std::io;
use std::path::PathBuf;

use dbx_defs::{CommandKind, DeploymentErrorKind, DeploymentResult};
use thiserror::Error;

use crate::cmd::CommandOutput;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Command {program} timed out after {seconds}s")]
    Timeout { program: String, seconds: f64 },

    #[error("I/O error while running command: {0}")]
    Io(#[from] io::Error),
}

/// Terminal conditions of a workflow. Never escapes the executor: every
/// variant is turned into a failed `DeploymentResult` at the boundary.
#[derive(Error, Debug)]
pub(crate) enum WorkflowError {
    #[error("Failed to write configuration files to {}: {source}", .dir.display())]
    PersistenceFailed { dir: PathBuf, source: io::Error },

    #[error("terraform {command} failed: {}", .stderr.trim_end())]
    CommandFailed {
        command: CommandKind,
        stderr: String,
        plan_output: Option<String>,
    },

    #[error("terraform {command} timed out after {seconds}s")]
    Timeout { command: CommandKind, seconds: f64 },

    #[error("cancelled by user")]
    Cancelled { plan_output: Option<String> },

    #[error("Working directory {} does not exist", .0.display())]
    MissingWorkingDir(PathBuf),

    #[error("Unexpected error during terraform {command}: {source}")]
    Unexpected {
        command: CommandKind,
        source: CommandError,
    },
}

impl WorkflowError {
    pub(crate) fn command_failed(
        command: CommandKind,
        output: CommandOutput,
        plan_output: Option<String>,
    ) -> Self {
        let stderr = if output.stderr.trim().is_empty() {
            match output.exit_code {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            }
        } else {
            output.stderr
        };
        WorkflowError::CommandFailed {
            command,
            stderr,
            plan_output,
        }
    }

    pub(crate) fn into_result(self, deployment_time_seconds: f64) -> DeploymentResult {
        let message = self.to_string();
        match self {
            WorkflowError::PersistenceFailed { .. } => DeploymentResult::failed(
                DeploymentErrorKind::PersistenceFailed,
                message,
                deployment_time_seconds,
            ),
            WorkflowError::CommandFailed {
                command,
                plan_output,
                ..
            } => DeploymentResult::failed(
                DeploymentErrorKind::CommandFailed { command },
                message,
                deployment_time_seconds,
            )
            .with_plan_output(plan_output),
            WorkflowError::Timeout { command, .. } => DeploymentResult::failed(
                DeploymentErrorKind::Timeout { command },
                message,
                deployment_time_seconds,
            ),
            WorkflowError::Cancelled { plan_output } => DeploymentResult::failed(
                DeploymentErrorKind::Cancelled,
                message,
                deployment_time_seconds,
            )
            .with_plan_output(plan_output),
            WorkflowError::MissingWorkingDir(_) | WorkflowError::Unexpected { .. } => {
                DeploymentResult::failed(
                    DeploymentErrorKind::Unexpected,
                    message,
                    deployment_time_seconds,
                )
            }
        }
    }
}
