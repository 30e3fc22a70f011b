mod artifacts;
mod capability;
mod decision;
mod deployment;
mod errors;
mod request;

pub use artifacts::{ArtifactKind, ConfigArtifacts, PLAN_FILE};
pub use capability::{Capability, CapabilityInfo, UnknownCapability};
pub use decision::{resource_group_name, CostBreakdown, InfrastructureDecision, Sku, Tier};
pub use deployment::{
    CommandKind, DeploymentErrorKind, DeploymentResult, CANCELLED_MESSAGE,
};
pub use errors::{GenerationError, ValidationError};
pub use request::{
    is_known_region, normalize_region, Environment, InfrastructureRequest, IntentParams,
    DEFAULT_WORKLOAD_TYPE, KNOWN_REGIONS, KNOWN_WORKLOAD_TYPES,
};
