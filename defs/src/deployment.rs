use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const CANCELLED_MESSAGE: &str = "cancelled by user";

/// The logical commands run against the provisioning tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Init,
    Plan,
    Apply,
    Destroy,
    ShowOutputs,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Init => "init",
            CommandKind::Plan => "plan",
            CommandKind::Apply => "apply",
            CommandKind::Destroy => "destroy",
            CommandKind::ShowOutputs => "output",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeploymentErrorKind {
    PersistenceFailed,
    CommandFailed { command: CommandKind },
    Timeout { command: CommandKind },
    Cancelled,
    Unexpected,
}

/// Outcome of a single apply or destroy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub success: bool,
    pub workspace_url: Option<String>,
    pub workspace_id: Option<String>,
    pub resource_group_name: Option<String>,
    pub instance_pool_id: Option<String>,
    pub deployment_time_seconds: f64,
    pub plan_output: Option<String>,
    pub outputs: Option<BTreeMap<String, String>>,
    pub error_message: Option<String>,
    pub error_kind: Option<DeploymentErrorKind>,
}

impl DeploymentResult {
    pub fn succeeded(deployment_time_seconds: f64) -> Self {
        DeploymentResult {
            success: true,
            workspace_url: None,
            workspace_id: None,
            resource_group_name: None,
            instance_pool_id: None,
            deployment_time_seconds,
            plan_output: None,
            outputs: None,
            error_message: None,
            error_kind: None,
        }
    }

    pub fn failed(
        kind: DeploymentErrorKind,
        message: impl Into<String>,
        deployment_time_seconds: f64,
    ) -> Self {
        DeploymentResult {
            success: false,
            error_message: Some(message.into()),
            error_kind: Some(kind),
            ..DeploymentResult::succeeded(deployment_time_seconds)
        }
    }

    pub fn with_plan_output(mut self, plan_output: Option<String>) -> Self {
        self.plan_output = plan_output;
        self
    }

    /// Stores the parsed outputs and lifts the well-known keys into their
    /// dedicated fields. Missing keys are left unset.
    pub fn with_outputs(mut self, outputs: BTreeMap<String, String>) -> Self {
        self.workspace_url = outputs.get("workspace_url").cloned();
        self.workspace_id = outputs.get("workspace_id").cloned();
        self.resource_group_name = outputs.get("resource_group_name").cloned();
        self.instance_pool_id = outputs.get("instance_pool_id").cloned();
        self.outputs = Some(outputs);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.error_kind == Some(DeploymentErrorKind::Cancelled)
    }
}
