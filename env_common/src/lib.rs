pub mod errors;
pub mod logic;

pub use errors::{OrchestratorError, TablesError};

pub use logic::{
    CapabilityOrchestrator, ConfigGenerator, ConfigTables, CostEstimator, DatabricksCostEstimator,
    DecisionEngine, ProvisioningPlan,
};
