use std::sync::Arc;

use dbx_defs::{
    resource_group_name, Environment, InfrastructureDecision, InfrastructureRequest, Sku, Tier,
};
use log::{info, warn};

use super::tables::{
    ClusterPolicy, ConfigTables, CostEstimate, CostEstimator, CostQuery, DatabricksCostEstimator,
    InstancePair,
};

/// Chooses the starting size tier for a request.
pub trait TierPolicy: Send + Sync {
    fn select_tier(
        &self,
        request: &InfrastructureRequest,
        tables: &ConfigTables,
        defaults_applied: &mut Vec<String>,
    ) -> Tier;
}

/// Workload lookup, capped per environment. Unknown workloads are sized
/// medium.
pub struct WorkloadTierPolicy;

impl TierPolicy for WorkloadTierPolicy {
    fn select_tier(
        &self,
        request: &InfrastructureRequest,
        tables: &ConfigTables,
        defaults_applied: &mut Vec<String>,
    ) -> Tier {
        let tier = match tables.workload_tiers.get(&request.workload_type) {
            Some(tier) => *tier,
            None => {
                warn!(
                    "Unknown workload type '{}', using medium tier",
                    request.workload_type
                );
                defaults_applied.push(format!(
                    "workload type '{}' is not in the tier table, used medium",
                    request.workload_type
                ));
                Tier::Medium
            }
        };

        match tables.environment_tier_caps.get(&request.environment) {
            Some(cap) => tier.min(*cap),
            None => tier,
        }
    }
}

/// Always the same tier, e.g. smallest instances while testing costs.
pub struct FixedTierPolicy(pub Tier);

impl TierPolicy for FixedTierPolicy {
    fn select_tier(
        &self,
        _request: &InfrastructureRequest,
        _tables: &ConfigTables,
        _defaults_applied: &mut Vec<String>,
    ) -> Tier {
        info!("Using fixed {} instance size", self.0);
        self.0
    }
}

struct Sizing {
    tier: Tier,
    instances: InstancePair,
    estimate: CostEstimate,
}

pub struct DecisionEngine {
    tables: Arc<ConfigTables>,
    tier_policy: Box<dyn TierPolicy>,
    cost_estimator: Box<dyn CostEstimator>,
}

impl DecisionEngine {
    pub fn new(tables: Arc<ConfigTables>) -> Self {
        DecisionEngine {
            tables,
            tier_policy: Box::new(WorkloadTierPolicy),
            cost_estimator: Box::new(DatabricksCostEstimator),
        }
    }

    pub fn with_tier_policy(mut self, tier_policy: Box<dyn TierPolicy>) -> Self {
        self.tier_policy = tier_policy;
        self
    }

    pub fn with_cost_estimator(mut self, cost_estimator: Box<dyn CostEstimator>) -> Self {
        self.cost_estimator = cost_estimator;
        self
    }

    pub fn tables(&self) -> &ConfigTables {
        &self.tables
    }

    /// Derives a concrete configuration. Never fails: missing table entries
    /// fall back to defaults, which are logged and listed in
    /// `defaults_applied`.
    ///
    /// Over-budget requests are downgraded by one tier at most; the result
    /// can still exceed `cost_limit`.
    pub fn make_decision(&self, request: &InfrastructureRequest) -> InfrastructureDecision {
        info!("Making decisions for workspace: {}", request.workspace_name);
        let mut defaults_applied = Vec::new();

        let sku = self.resolve_sku(request.environment, &mut defaults_applied);
        let cluster = self.resolve_cluster_policy(request.environment, &mut defaults_applied);
        let runtime_version = if request.enable_gpu {
            self.tables.runtime_versions.gpu.clone()
        } else {
            self.tables.runtime_versions.cpu.clone()
        };

        let initial_tier =
            self.tier_policy
                .select_tier(request, &self.tables, &mut defaults_applied);
        info!("Selected instance size: {}", initial_tier);

        let mut sizing = self.size(
            request.enable_gpu,
            initial_tier,
            sku,
            &cluster,
            &mut defaults_applied,
        );
        if let Some(limit) = request.cost_limit {
            if sizing.estimate.breakdown.total > limit {
                warn!(
                    "Estimated cost ${:.2} exceeds limit ${:.2}",
                    sizing.estimate.breakdown.total, limit
                );
                sizing = self.size(
                    request.enable_gpu,
                    initial_tier.downgrade(),
                    sku,
                    &cluster,
                    &mut defaults_applied,
                );
                info!(
                    "Adjusted to {} instances. New cost: ${:.2}",
                    sizing.tier, sizing.estimate.breakdown.total
                );
            }
        }

        for item in &sizing.estimate.unpriced {
            warn!("No cost table entry: {}, using fallback rate", item);
            defaults_applied.push(format!("no {}, used fallback rate", item));
        }

        let breakdown = sizing.estimate.breakdown;
        let justification = justify(request, sizing.tier, sku, breakdown.total);

        info!(
            "Decision made - SKU: {}, Cost: ${:.2}/month",
            sku, breakdown.total
        );

        InfrastructureDecision {
            workspace_name: request.workspace_name.clone(),
            resource_group_name: resource_group_name(&request.workspace_name),
            region: request.region.clone(),
            sku,
            tier: sizing.tier,
            min_workers: cluster.min_workers,
            max_workers: cluster.max_workers,
            driver_instance_type: sizing.instances.driver,
            worker_instance_type: sizing.instances.worker,
            runtime_version,
            autotermination_minutes: cluster.autotermination_minutes,
            enable_gpu: request.enable_gpu,
            estimated_monthly_cost: breakdown.total,
            cost_breakdown: breakdown,
            justification,
            defaults_applied,
        }
    }

    fn size(
        &self,
        enable_gpu: bool,
        tier: Tier,
        sku: Sku,
        cluster: &ClusterPolicy,
        defaults_applied: &mut Vec<String>,
    ) -> Sizing {
        let instances = self.resolve_instances(enable_gpu, tier, defaults_applied);
        let estimate = self.cost_estimator.estimate(
            &self.tables,
            &CostQuery {
                driver_instance_type: &instances.driver,
                worker_instance_type: &instances.worker,
                min_workers: cluster.min_workers,
                max_workers: cluster.max_workers,
                sku,
            },
        );
        Sizing {
            tier,
            instances,
            estimate,
        }
    }

    fn resolve_instances(
        &self,
        enable_gpu: bool,
        tier: Tier,
        defaults_applied: &mut Vec<String>,
    ) -> InstancePair {
        let kind = if enable_gpu { "gpu" } else { "cpu" };
        let catalog = if enable_gpu {
            &self.tables.gpu_instances
        } else {
            &self.tables.cpu_instances
        };

        if let Some(instances) = catalog.get(&tier) {
            info!(
                "Instance types - Driver: {}, Worker: {}",
                instances.driver, instances.worker
            );
            return instances.clone();
        }

        warn!("No {} instances for {} tier, using medium", kind, tier);
        defaults_applied.push(format!("no {} instances for {} tier, used medium", kind, tier));
        if let Some(instances) = catalog.get(&Tier::Medium) {
            return instances.clone();
        }

        let builtin = ConfigTables::default();
        let builtin = if enable_gpu {
            builtin.gpu_instances
        } else {
            builtin.cpu_instances
        };
        builtin
            .get(&Tier::Medium)
            .cloned()
            .unwrap_or_else(|| InstancePair {
                driver: "Standard_DS4_v2".to_string(),
                worker: "Standard_DS4_v2".to_string(),
            })
    }

    fn resolve_sku(&self, environment: Environment, defaults_applied: &mut Vec<String>) -> Sku {
        match self.tables.skus.get(&environment) {
            Some(sku) => *sku,
            None => {
                warn!("No SKU mapped for {}, using standard", environment);
                defaults_applied.push(format!("no SKU for {}, used standard", environment));
                Sku::Standard
            }
        }
    }

    fn resolve_cluster_policy(
        &self,
        environment: Environment,
        defaults_applied: &mut Vec<String>,
    ) -> ClusterPolicy {
        if let Some(policy) = self.tables.cluster_policies.get(&environment) {
            return policy.clone();
        }
        warn!("No cluster policy for {}, using the dev policy", environment);
        defaults_applied.push(format!(
            "no cluster policy for {}, used dev policy",
            environment
        ));
        self.tables
            .cluster_policies
            .get(&Environment::Dev)
            .cloned()
            .unwrap_or(ClusterPolicy {
                min_workers: 1,
                max_workers: 2,
                autotermination_minutes: 10,
            })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn justify(request: &InfrastructureRequest, tier: Tier, sku: Sku, total: f64) -> String {
    let mut reasons = Vec::new();

    if request.environment == Environment::Prod {
        reasons.push(format!(
            "Production environment requires {} SKU for SLA guarantees and advanced features",
            sku
        ));
    } else {
        reasons.push(format!(
            "{} environment uses {} SKU for cost optimization",
            capitalize(request.environment.as_str()),
            sku
        ));
    }

    if request.enable_gpu {
        reasons.push(format!(
            "GPU instances ({}) selected for {} workload requiring accelerated computing",
            tier, request.workload_type
        ));
    } else {
        reasons.push(format!(
            "CPU instances ({}) sufficient for {} workload",
            tier, request.workload_type
        ));
    }

    match request.cost_limit {
        Some(limit) if total <= limit => reasons.push(format!(
            "Configuration within budget constraint of ${:.2}/month",
            limit
        )),
        Some(limit) => reasons.push(format!(
            "Configuration optimized to approach budget limit (${:.2}/month), final estimate: ${:.2}/month",
            limit, total
        )),
        None => reasons.push(format!("Estimated monthly cost: ${:.2}", total)),
    }

    if let Some(extra) = &request.additional_requirements {
        reasons.push(format!("Additional requirements: {}", extra));
    }

    reasons.join(". ") + "."
}
