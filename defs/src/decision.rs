use std::fmt;

use serde::{Deserialize, Serialize};

/// Internal sizing category driving instance type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Small,
    Medium,
    Large,
}

impl Tier {
    /// One step smaller, floored at `Small`.
    pub fn downgrade(self) -> Tier {
        match self {
            Tier::Large => Tier::Medium,
            Tier::Medium | Tier::Small => Tier::Small,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Small => "small",
            Tier::Medium => "medium",
            Tier::Large => "large",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sku {
    Standard,
    Premium,
}

impl Sku {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sku::Standard => "standard",
            Sku::Premium => "premium",
        }
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monthly cost estimate in USD. `total` is always the sum of the other parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub compute: f64,
    pub platform_fee: f64,
    pub storage: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub fn new(compute: f64, platform_fee: f64, storage: f64) -> Self {
        CostBreakdown {
            compute,
            platform_fee,
            storage,
            total: compute + platform_fee + storage,
        }
    }

    pub fn components(&self) -> [(&'static str, f64); 4] {
        [
            ("compute", self.compute),
            ("platform_fee", self.platform_fee),
            ("storage", self.storage),
            ("total", self.total),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureDecision {
    pub workspace_name: String,
    pub resource_group_name: String,
    pub region: String,
    pub sku: Sku,
    pub tier: Tier,
    pub min_workers: u32,
    pub max_workers: u32,
    pub driver_instance_type: String,
    pub worker_instance_type: String,
    pub runtime_version: String,
    pub autotermination_minutes: u32,
    pub enable_gpu: bool,
    pub estimated_monthly_cost: f64,
    pub cost_breakdown: CostBreakdown,
    pub justification: String,
    /// Table lookups that missed and fell back to a default value.
    #[serde(default)]
    pub defaults_applied: Vec<String>,
}

pub fn resource_group_name(workspace_name: &str) -> String {
    format!("rg-{}", workspace_name)
}
