use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

pub const KNOWN_REGIONS: [&str; 9] = [
    "eastus",
    "eastus2",
    "westus",
    "westus2",
    "westus3",
    "centralus",
    "northcentralus",
    "southcentralus",
    "westcentralus",
];

pub const KNOWN_WORKLOAD_TYPES: [&str; 5] =
    ["data_engineering", "ml", "analytics", "data_science", "etl"];

pub const DEFAULT_WORKLOAD_TYPE: &str = "data_engineering";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "staging" | "stage" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(ValidationError::InvalidEnvironment(s.to_string())),
        }
    }
}

/// Normalizes a free-form region name to an Azure region code, e.g.
/// "East US" -> "eastus" and "west-us-2" -> "westus2".
pub fn normalize_region(region: &str) -> String {
    region
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

pub fn is_known_region(region: &str) -> bool {
    KNOWN_REGIONS.contains(&region)
}

/// A validated request for a workspace. Built once per provisioning attempt
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureRequest {
    pub workspace_name: String,
    pub team: String,
    pub environment: Environment,
    pub region: String,
    pub enable_gpu: bool,
    pub workload_type: String,
    pub cost_limit: Option<f64>,
    pub additional_requirements: Option<String>,
}

/// Structured arguments as emitted by the intent extraction layer. Every
/// field is optional here; `InfrastructureRequest::try_from` decides what is
/// required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentParams {
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub enable_gpu: Option<bool>,
    #[serde(default)]
    pub workload_type: Option<String>,
    #[serde(default)]
    pub cost_limit: Option<f64>,
    #[serde(default)]
    pub additional_requirements: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_workspace_name(name: &str) -> Result<(), ValidationError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if (3..=64).contains(&name.len()) && valid_chars {
        Ok(())
    } else {
        Err(ValidationError::InvalidWorkspaceName(name.to_string()))
    }
}

impl TryFrom<IntentParams> for InfrastructureRequest {
    type Error = ValidationError;

    fn try_from(params: IntentParams) -> Result<Self, Self::Error> {
        let team = required(params.team, "team")?;
        let environment: Environment = required(params.environment, "environment")?.parse()?;

        let raw_region = required(params.region, "region")?;
        let region = normalize_region(&raw_region);
        if !is_known_region(&region) {
            return Err(ValidationError::UnknownRegion(raw_region));
        }

        let workspace_name = match non_blank(params.workspace_name) {
            Some(name) => name.to_lowercase(),
            None => format!("{}-{}", team.to_lowercase().replace(' ', "-"), environment),
        };
        validate_workspace_name(&workspace_name)?;

        if let Some(limit) = params.cost_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(ValidationError::InvalidCostLimit(limit));
            }
        }

        Ok(InfrastructureRequest {
            workspace_name,
            team,
            environment,
            region,
            enable_gpu: params.enable_gpu.unwrap_or(false),
            workload_type: non_blank(params.workload_type)
                .map(|w| w.to_lowercase())
                .unwrap_or_else(|| DEFAULT_WORKLOAD_TYPE.to_string()),
            cost_limit: params.cost_limit,
            additional_requirements: non_blank(params.additional_requirements),
        })
    }
}
