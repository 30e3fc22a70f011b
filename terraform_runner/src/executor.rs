use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dbx_defs::{CommandKind, ConfigArtifacts, DeploymentResult};
use dbx_utils::write_artifacts;
use log::{error, info, warn};

use crate::approval::ApprovalGate;
use crate::cmd::CommandOutput;
use crate::errors::{CommandError, WorkflowError};
use crate::outputs::parse_outputs;
use crate::terraform::CommandRunner;

/// Drives terraform through init -> plan -> [approve] -> apply -> outputs,
/// and separately through [approve] -> destroy.
///
/// Both workflows always return a `DeploymentResult`; failures after the
/// first side effect are reported inside it instead of being raised. Each
/// command is bounded by `command_timeout` on its own, and nothing is
/// retried.
pub struct DeploymentExecutor {
    runner: Arc<dyn CommandRunner>,
    approval: Arc<dyn ApprovalGate>,
    command_timeout: Duration,
}

fn elapsed_seconds(started: Instant) -> f64 {
    started.elapsed().as_secs_f64()
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

impl DeploymentExecutor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        approval: Arc<dyn ApprovalGate>,
        command_timeout: Duration,
    ) -> Self {
        info!(
            "DeploymentExecutor initialized with timeout: {:?}",
            command_timeout
        );
        DeploymentExecutor {
            runner,
            approval,
            command_timeout,
        }
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub async fn deploy(
        &self,
        artifacts: &ConfigArtifacts,
        working_dir: &Path,
        auto_approve: bool,
        dry_run: bool,
    ) -> DeploymentResult {
        let started = Instant::now();
        info!("Starting terraform deployment in: {}", working_dir.display());

        match self
            .apply_workflow(artifacts, working_dir, auto_approve, dry_run, started)
            .await
        {
            Ok(result) => {
                info!(
                    "Deployment finished successfully in {:.2}s",
                    result.deployment_time_seconds
                );
                result
            }
            Err(e) => {
                error!("Deployment in {} failed: {}", working_dir.display(), e);
                e.into_result(elapsed_seconds(started))
            }
        }
    }

    pub async fn destroy(&self, working_dir: &Path, auto_approve: bool) -> DeploymentResult {
        let started = Instant::now();
        info!("Starting terraform destroy in: {}", working_dir.display());

        match self.destroy_workflow(working_dir, auto_approve, started).await {
            Ok(result) => {
                info!(
                    "Destroy completed successfully in {:.2}s",
                    result.deployment_time_seconds
                );
                result
            }
            Err(e) => {
                error!("Destroy in {} failed: {}", working_dir.display(), e);
                e.into_result(elapsed_seconds(started))
            }
        }
    }

    async fn apply_workflow(
        &self,
        artifacts: &ConfigArtifacts,
        working_dir: &Path,
        auto_approve: bool,
        dry_run: bool,
        started: Instant,
    ) -> Result<DeploymentResult, WorkflowError> {
        write_artifacts(artifacts, working_dir).map_err(|source| {
            WorkflowError::PersistenceFailed {
                dir: working_dir.to_path_buf(),
                source,
            }
        })?;

        let init = self.run(CommandKind::Init, working_dir).await?;
        if !init.success() {
            return Err(WorkflowError::command_failed(CommandKind::Init, init, None));
        }

        let plan = self.run(CommandKind::Plan, working_dir).await?;
        if !plan.success() {
            let partial_plan = non_empty(plan.stdout.clone());
            return Err(WorkflowError::command_failed(
                CommandKind::Plan,
                plan,
                partial_plan,
            ));
        }
        let plan_output = plan.stdout;

        if dry_run {
            info!("Dry-run mode: skipping terraform apply");
            return Ok(DeploymentResult::succeeded(elapsed_seconds(started))
                .with_plan_output(Some(plan_output)));
        }

        if !auto_approve {
            info!("Waiting for manual approval...");
            if !self.approval.approve(&plan_output) {
                info!("Deployment cancelled by user");
                return Err(WorkflowError::Cancelled {
                    plan_output: Some(plan_output),
                });
            }
        }

        let apply = self.run(CommandKind::Apply, working_dir).await?;
        if !apply.success() {
            return Err(WorkflowError::command_failed(
                CommandKind::Apply,
                apply,
                Some(plan_output),
            ));
        }

        let outputs = self.show_outputs(working_dir).await;

        Ok(DeploymentResult::succeeded(elapsed_seconds(started))
            .with_plan_output(Some(plan_output))
            .with_outputs(outputs))
    }

    async fn destroy_workflow(
        &self,
        working_dir: &Path,
        auto_approve: bool,
        started: Instant,
    ) -> Result<DeploymentResult, WorkflowError> {
        if !working_dir.is_dir() {
            return Err(WorkflowError::MissingWorkingDir(working_dir.to_path_buf()));
        }

        if !auto_approve {
            info!("Waiting for destroy approval...");
            let warning = format!(
                "WARNING: This will DESTROY all resources managed in {}",
                working_dir.display()
            );
            if !self.approval.approve(&warning) {
                info!("Destroy cancelled by user");
                return Err(WorkflowError::Cancelled { plan_output: None });
            }
        }

        let destroy = self.run(CommandKind::Destroy, working_dir).await?;
        if !destroy.success() {
            return Err(WorkflowError::command_failed(
                CommandKind::Destroy,
                destroy,
                None,
            ));
        }

        Ok(DeploymentResult::succeeded(elapsed_seconds(started)))
    }

    /// Outputs are best effort: any failure here yields an empty mapping.
    async fn show_outputs(&self, working_dir: &Path) -> BTreeMap<String, String> {
        let output = match self.run(CommandKind::ShowOutputs, working_dir).await {
            Ok(output) if output.success() => output,
            Ok(output) => {
                warn!(
                    "terraform output exited with {:?}, continuing without outputs: {}",
                    output.exit_code,
                    output.stderr.trim_end()
                );
                return BTreeMap::new();
            }
            Err(e) => {
                warn!("Failed to read terraform outputs, continuing without them: {}", e);
                return BTreeMap::new();
            }
        };

        match parse_outputs(&output.stdout) {
            Ok(outputs) => {
                info!("Parsed {} terraform outputs", outputs.len());
                outputs
            }
            Err(e) => {
                warn!("Failed to parse terraform outputs: {}", e);
                BTreeMap::new()
            }
        }
    }

    async fn run(
        &self,
        command: CommandKind,
        working_dir: &Path,
    ) -> Result<CommandOutput, WorkflowError> {
        info!("Running terraform {}...", command);
        match self
            .runner
            .run(command, working_dir, self.command_timeout)
            .await
        {
            Ok(output) => {
                if !output.success() {
                    error!(
                        "terraform {} failed with code {:?}: {}",
                        command,
                        output.exit_code,
                        output.stderr.trim_end()
                    );
                }
                Ok(output)
            }
            Err(CommandError::Timeout { .. }) => Err(WorkflowError::Timeout {
                command,
                seconds: self.command_timeout.as_secs_f64(),
            }),
            Err(source) => Err(WorkflowError::Unexpected { command, source }),
        }
    }
}
