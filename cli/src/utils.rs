use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use dbx_common::{CapabilityOrchestrator, ConfigGenerator, ConfigTables, DecisionEngine};
use dbx_defs::{InfrastructureRequest, IntentParams};
use dbx_utils::RunnerSettings;
use log::info;
use terraform_runner::{DeploymentExecutor, PromptApproval, TerraformCli};

/// Request parameters, from flags or a JSON file. Flags win over the file.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// JSON file with the request parameters
    #[arg(long, value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Owning team, e.g. "data science"
    #[arg(long)]
    pub team: Option<String>,

    /// dev, staging or prod
    #[arg(long)]
    pub environment: Option<String>,

    /// Azure region, e.g. eastus or "East US"
    #[arg(long)]
    pub region: Option<String>,

    /// Use GPU instances
    #[arg(long)]
    pub gpu: bool,

    /// data_engineering, ml, analytics, data_science or etl
    #[arg(long)]
    pub workload_type: Option<String>,

    /// Monthly budget in USD
    #[arg(long)]
    pub cost_limit: Option<f64>,

    /// Defaults to <team>-<environment>
    #[arg(long)]
    pub workspace_name: Option<String>,

    /// Free-form requirements, recorded in the justification
    #[arg(long)]
    pub requirements: Option<String>,
}

impl RequestArgs {
    pub fn to_params(&self) -> Result<IntentParams> {
        let mut params = match &self.request {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read request file {}", path.display()))?;
                serde_json::from_str::<IntentParams>(&contents)
                    .with_context(|| format!("Invalid request file {}", path.display()))?
            }
            None => IntentParams::default(),
        };

        if self.team.is_some() {
            params.team = self.team.clone();
        }
        if self.environment.is_some() {
            params.environment = self.environment.clone();
        }
        if self.region.is_some() {
            params.region = self.region.clone();
        }
        if self.gpu {
            params.enable_gpu = Some(true);
        }
        if self.workload_type.is_some() {
            params.workload_type = self.workload_type.clone();
        }
        if self.cost_limit.is_some() {
            params.cost_limit = self.cost_limit;
        }
        if self.workspace_name.is_some() {
            params.workspace_name = self.workspace_name.clone();
        }
        if self.requirements.is_some() {
            params.additional_requirements = self.requirements.clone();
        }
        Ok(params)
    }

    pub fn to_request(&self) -> Result<InfrastructureRequest> {
        let request = InfrastructureRequest::try_from(self.to_params()?)?;
        Ok(request)
    }
}

pub fn load_settings() -> Result<RunnerSettings> {
    RunnerSettings::from_env().context("Invalid runner settings")
}

pub fn load_tables(settings: &RunnerSettings) -> Result<ConfigTables> {
    match &settings.tables_path {
        Some(path) => {
            info!("Loading decision tables from {}", path.display());
            Ok(ConfigTables::from_yaml_file(path)?)
        }
        None => Ok(ConfigTables::default()),
    }
}

pub fn decision_engine(settings: &RunnerSettings) -> Result<DecisionEngine> {
    Ok(DecisionEngine::new(Arc::new(load_tables(settings)?)))
}

pub fn orchestrator(settings: &RunnerSettings) -> Result<CapabilityOrchestrator> {
    let runner = Arc::new(TerraformCli::new(settings.terraform_binary.clone()));
    let executor = DeploymentExecutor::new(
        runner,
        Arc::new(PromptApproval::stdio()),
        settings.command_timeout,
    );
    Ok(CapabilityOrchestrator::new(
        decision_engine(settings)?,
        ConfigGenerator::builtin()?,
        executor,
    ))
}
