use std::path::{Path, PathBuf};

use dbx_defs::{
    Capability, ConfigArtifacts, DeploymentResult, GenerationError, InfrastructureDecision,
    InfrastructureRequest, IntentParams,
};
use log::info;
use serde::Serialize;
use terraform_runner::DeploymentExecutor;

use super::decision::DecisionEngine;
use super::generator::ConfigGenerator;
use crate::errors::OrchestratorError;

/// One resource the plan is going to create, for display before approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedResource {
    pub resource_type: String,
    pub name: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisioningPlan {
    pub capability: Capability,
    pub request: InfrastructureRequest,
    pub decision: InfrastructureDecision,
    pub artifacts: ConfigArtifacts,
    pub resources: Vec<PlannedResource>,
    pub working_dir: PathBuf,
    /// Dry-run result holding the terraform plan text.
    pub plan_result: DeploymentResult,
}

impl ProvisioningPlan {
    /// True when terraform produced a plan that can be applied.
    pub fn is_ready(&self) -> bool {
        self.plan_result.success
    }
}

fn planned_resources(decision: &InfrastructureDecision) -> Vec<PlannedResource> {
    vec![
        PlannedResource {
            resource_type: "azurerm_resource_group".to_string(),
            name: decision.resource_group_name.clone(),
            detail: decision.region.clone(),
        },
        PlannedResource {
            resource_type: "azurerm_databricks_workspace".to_string(),
            name: decision.workspace_name.clone(),
            detail: format!("{} SKU", decision.sku),
        },
        PlannedResource {
            resource_type: "databricks_cluster".to_string(),
            name: format!("{}-cluster", decision.workspace_name),
            detail: format!(
                "{}-{} x {} (driver {}), {}, stops after {} idle minutes",
                decision.min_workers,
                decision.max_workers,
                decision.worker_instance_type,
                decision.driver_instance_type,
                decision.runtime_version,
                decision.autotermination_minutes
            ),
        },
    ]
}

/// Sequences decision, generation and execution for one capability
/// invocation. Holds no per-request state.
pub struct CapabilityOrchestrator {
    engine: DecisionEngine,
    generator: ConfigGenerator,
    executor: DeploymentExecutor,
}

impl CapabilityOrchestrator {
    pub fn new(
        engine: DecisionEngine,
        generator: ConfigGenerator,
        executor: DeploymentExecutor,
    ) -> Self {
        CapabilityOrchestrator {
            engine,
            generator,
            executor,
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn generator(&self) -> &ConfigGenerator {
        &self.generator
    }

    /// Resolves a capability name and its raw parameters, as emitted by the
    /// intent layer, into a validated request.
    pub fn resolve(
        &self,
        capability_name: &str,
        params: IntentParams,
    ) -> Result<(Capability, InfrastructureRequest), OrchestratorError> {
        let capability = Capability::from_name(capability_name)?;
        let request = InfrastructureRequest::try_from(params)?;
        info!(
            "Resolved capability {} for workspace {}",
            capability, request.workspace_name
        );
        Ok((capability, request))
    }

    pub fn decide(&self, request: &InfrastructureRequest) -> InfrastructureDecision {
        self.engine.make_decision(request)
    }

    pub fn generate(
        &self,
        request: &InfrastructureRequest,
        decision: &InfrastructureDecision,
    ) -> Result<ConfigArtifacts, GenerationError> {
        self.generator.generate(
            decision,
            request.environment,
            &request.workload_type,
            &request.team,
        )
    }

    /// Decide, generate and deploy in one pass. Generation failures are
    /// raised before anything touches the filesystem; everything after is
    /// reported inside the `DeploymentResult`.
    pub async fn provision(
        &self,
        request: &InfrastructureRequest,
        working_dir: &Path,
        auto_approve: bool,
        dry_run: bool,
    ) -> Result<DeploymentResult, OrchestratorError> {
        let decision = self.decide(request);
        self.deploy(request, &decision, working_dir, auto_approve, dry_run)
            .await
    }

    /// Generates and deploys an already made decision, for callers that
    /// show the decision before deploying it.
    pub async fn deploy(
        &self,
        request: &InfrastructureRequest,
        decision: &InfrastructureDecision,
        working_dir: &Path,
        auto_approve: bool,
        dry_run: bool,
    ) -> Result<DeploymentResult, OrchestratorError> {
        info!("Provisioning workspace {}", request.workspace_name);
        let artifacts = self.generate(request, decision)?;
        Ok(self
            .executor
            .deploy(&artifacts, working_dir, auto_approve, dry_run)
            .await)
    }

    /// Runs everything up to and including `terraform plan`, without
    /// applying.
    pub async fn plan(
        &self,
        request: &InfrastructureRequest,
        working_dir: &Path,
    ) -> Result<ProvisioningPlan, OrchestratorError> {
        info!("Planning workspace {}", request.workspace_name);
        let decision = self.decide(request);
        let artifacts = self.generate(request, &decision)?;
        let plan_result = self
            .executor
            .deploy(&artifacts, working_dir, false, true)
            .await;

        Ok(ProvisioningPlan {
            capability: Capability::ProvisionDatabricks,
            request: request.clone(),
            resources: planned_resources(&decision),
            decision,
            artifacts,
            working_dir: working_dir.to_path_buf(),
            plan_result,
        })
    }

    /// Applies a plan previously returned by `plan`. Reviewing the plan is
    /// the approval, so the gate is skipped.
    pub async fn execute(&self, plan: &ProvisioningPlan) -> DeploymentResult {
        info!(
            "Executing plan for workspace {} in {}",
            plan.decision.workspace_name,
            plan.working_dir.display()
        );
        self.executor
            .deploy(&plan.artifacts, &plan.working_dir, true, false)
            .await
    }

    pub async fn teardown(&self, working_dir: &Path, auto_approve: bool) -> DeploymentResult {
        self.executor.destroy(working_dir, auto_approve).await
    }
}
