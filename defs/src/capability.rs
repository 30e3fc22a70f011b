use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown capability '{0}'")]
pub struct UnknownCapability(pub String);

/// Provisioning capabilities the orchestrator can dispatch to. Anything not
/// listed here is rejected instead of being forwarded to a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ProvisionDatabricks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub keywords: &'static [&'static str],
    pub use_cases: &'static [&'static str],
    pub required_parameters: &'static [&'static str],
}

impl Capability {
    pub const ALL: [Capability; 1] = [Capability::ProvisionDatabricks];

    pub fn from_name(name: &str) -> Result<Self, UnknownCapability> {
        name.parse()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Capability::ProvisionDatabricks => "provision_databricks",
        }
    }

    pub fn info(&self) -> CapabilityInfo {
        match self {
            Capability::ProvisionDatabricks => CapabilityInfo {
                name: self.name(),
                display_name: "Azure Databricks Workspace",
                description: "Provision Azure Databricks workspace for data engineering, ML, and analytics",
                category: "compute",
                keywords: &[
                    "databricks",
                    "workspace",
                    "spark",
                    "ml platform",
                    "machine learning",
                    "data engineering",
                    "analytics",
                    "notebooks",
                ],
                use_cases: &[
                    "Data engineering pipelines",
                    "ML model training and experimentation",
                    "Large-scale data analytics",
                    "Spark workloads",
                ],
                required_parameters: &["team", "environment", "region"],
            },
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.name() == s.trim())
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_name() {
        assert_eq!(
            "provision_databricks".parse::<Capability>().unwrap(),
            Capability::ProvisionDatabricks
        );
        assert_eq!(
            Capability::from_name("provision_openai"),
            Err(UnknownCapability("provision_openai".to_string()))
        );
    }

    #[test]
    fn test_info_required_parameters() {
        let info = Capability::ProvisionDatabricks.info();
        assert_eq!(info.required_parameters, &["team", "environment", "region"]);
        assert_eq!(info.name, "provision_databricks");
    }
}
