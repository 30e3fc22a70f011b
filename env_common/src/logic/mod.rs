mod decision;
mod generator;
mod orchestrator;
mod tables;

pub use decision::{DecisionEngine, FixedTierPolicy, TierPolicy, WorkloadTierPolicy};

pub use generator::ConfigGenerator;

pub use orchestrator::{CapabilityOrchestrator, PlannedResource, ProvisioningPlan};

pub use tables::{
    ClusterPolicy, ConfigTables, CostAssumptions, CostEstimate, CostEstimator, CostQuery,
    DatabricksCostEstimator, InstancePair, RuntimeVersions,
};
