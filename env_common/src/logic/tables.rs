use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use dbx_defs::{CostBreakdown, Environment, Sku, Tier};
use serde::{Deserialize, Serialize};

use crate::errors::TablesError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePair {
    pub driver: String,
    pub worker: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterPolicy {
    pub min_workers: u32,
    pub max_workers: u32,
    pub autotermination_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeVersions {
    pub cpu: String,
    pub gpu: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAssumptions {
    pub hours_per_month: f64,
    pub utilization_factor: f64,
    pub storage_monthly: f64,
    /// Used when a worker instance type has no entry in the rate tables.
    pub fallback_worker_hourly: f64,
    pub fallback_driver_hourly: f64,
    pub fallback_worker_units: f64,
    pub fallback_driver_units: f64,
}

/// Static lookup tables driving every decision. Built once (defaults or a
/// YAML override) and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigTables {
    pub workload_tiers: BTreeMap<String, Tier>,
    /// Largest tier an environment may use.
    pub environment_tier_caps: BTreeMap<Environment, Tier>,
    pub cpu_instances: BTreeMap<Tier, InstancePair>,
    pub gpu_instances: BTreeMap<Tier, InstancePair>,
    pub skus: BTreeMap<Environment, Sku>,
    pub cluster_policies: BTreeMap<Environment, ClusterPolicy>,
    pub runtime_versions: RuntimeVersions,
    /// USD per hour per VM.
    pub instance_hourly_rates: BTreeMap<String, f64>,
    /// Platform units consumed per hour per VM.
    pub platform_units_per_hour: BTreeMap<String, f64>,
    /// USD per platform unit, by SKU.
    pub platform_unit_rates: BTreeMap<Sku, f64>,
    pub costs: CostAssumptions,
}

fn pair(driver: &str, worker: &str) -> InstancePair {
    InstancePair {
        driver: driver.to_string(),
        worker: worker.to_string(),
    }
}

fn policy(min_workers: u32, max_workers: u32, autotermination_minutes: u32) -> ClusterPolicy {
    ClusterPolicy {
        min_workers,
        max_workers,
        autotermination_minutes,
    }
}

/// Upper bound for `max_workers` in a cluster policy.
pub const MAX_CLUSTER_WORKERS: u32 = 10_000;

fn check_amount(what: &str, value: f64) -> Result<(), TablesError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TablesError::Invalid(format!(
            "{} must be a finite non-negative number, got {}",
            what, value
        )))
    }
}

fn rates(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(name, rate)| (name.to_string(), *rate))
        .collect()
}

impl Default for ConfigTables {
    fn default() -> Self {
        ConfigTables {
            workload_tiers: BTreeMap::from([
                ("data_engineering".to_string(), Tier::Medium),
                ("ml".to_string(), Tier::Large),
                ("analytics".to_string(), Tier::Small),
                ("data_science".to_string(), Tier::Medium),
                ("etl".to_string(), Tier::Medium),
            ]),
            environment_tier_caps: BTreeMap::from([
                (Environment::Dev, Tier::Medium),
                (Environment::Staging, Tier::Large),
                (Environment::Prod, Tier::Large),
            ]),
            cpu_instances: BTreeMap::from([
                (Tier::Small, pair("Standard_D4s_v5", "Standard_D4s_v5")),
                (Tier::Medium, pair("Standard_DS4_v2", "Standard_DS4_v2")),
                (Tier::Large, pair("Standard_DS5_v2", "Standard_DS5_v2")),
            ]),
            gpu_instances: BTreeMap::from([
                (Tier::Small, pair("Standard_DS3_v2", "Standard_NC6s_v3")),
                (Tier::Medium, pair("Standard_DS4_v2", "Standard_NC12s_v3")),
                (Tier::Large, pair("Standard_DS5_v2", "Standard_NC24s_v3")),
            ]),
            skus: BTreeMap::from([
                (Environment::Dev, Sku::Standard),
                (Environment::Staging, Sku::Standard),
                (Environment::Prod, Sku::Premium),
            ]),
            cluster_policies: BTreeMap::from([
                (Environment::Dev, policy(1, 2, 10)),
                (Environment::Staging, policy(1, 3, 10)),
                (Environment::Prod, policy(1, 4, 10)),
            ]),
            runtime_versions: RuntimeVersions {
                cpu: "13.3.x-scala2.12".to_string(),
                gpu: "13.3.x-gpu-ml-scala2.12".to_string(),
            },
            instance_hourly_rates: rates(&[
                ("Standard_D4s_v5", 0.192),
                ("Standard_DS3_v2", 0.192),
                ("Standard_DS4_v2", 0.384),
                ("Standard_DS5_v2", 0.768),
                ("Standard_NC6s_v3", 3.06),
                ("Standard_NC12s_v3", 6.12),
                ("Standard_NC24s_v3", 12.24),
            ]),
            platform_units_per_hour: rates(&[
                ("Standard_D4s_v5", 0.75),
                ("Standard_DS3_v2", 0.75),
                ("Standard_DS4_v2", 1.5),
                ("Standard_DS5_v2", 3.0),
                ("Standard_NC6s_v3", 2.0),
                ("Standard_NC12s_v3", 4.0),
                ("Standard_NC24s_v3", 8.0),
            ]),
            platform_unit_rates: BTreeMap::from([(Sku::Standard, 0.15), (Sku::Premium, 0.20)]),
            costs: CostAssumptions {
                hours_per_month: 730.0,
                utilization_factor: 0.5,
                storage_monthly: 200.0,
                fallback_worker_hourly: 0.5,
                fallback_driver_hourly: 0.2,
                fallback_worker_units: 1.0,
                fallback_driver_units: 0.75,
            },
        }
    }
}

impl ConfigTables {
    pub fn from_yaml_str(yaml: &str, origin: &str) -> Result<Self, TablesError> {
        let tables: ConfigTables =
            serde_yaml::from_str(yaml).map_err(|source| TablesError::Parse {
                path: origin.to_string(),
                source,
            })?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, TablesError> {
        let yaml = fs::read_to_string(path).map_err(|source| TablesError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml, &path.display().to_string())
    }

    /// Rejects tables that could never produce a sane decision. Missing
    /// entries are allowed; lookups fall back to defaults.
    pub fn validate(&self) -> Result<(), TablesError> {
        if let Some((env, p)) = self
            .cluster_policies
            .iter()
            .find(|(_, p)| p.min_workers == 0 || p.min_workers > p.max_workers)
        {
            return Err(TablesError::Invalid(format!(
                "cluster policy for {} needs 0 < min_workers <= max_workers, got {}..{}",
                env, p.min_workers, p.max_workers
            )));
        }
        if let Some((env, p)) = self
            .cluster_policies
            .iter()
            .find(|(_, p)| p.max_workers > MAX_CLUSTER_WORKERS)
        {
            return Err(TablesError::Invalid(format!(
                "cluster policy for {} allows at most {} workers, got {}",
                env, MAX_CLUSTER_WORKERS, p.max_workers
            )));
        }
        if let Some((env, _)) = self
            .cluster_policies
            .iter()
            .find(|(_, p)| p.autotermination_minutes == 0)
        {
            return Err(TablesError::Invalid(format!(
                "cluster policy for {} needs a positive autotermination_minutes",
                env
            )));
        }
        if !(0.0..=1.0).contains(&self.costs.utilization_factor) {
            return Err(TablesError::Invalid(format!(
                "utilization_factor must be within 0..=1, got {}",
                self.costs.utilization_factor
            )));
        }

        let costs = &self.costs;
        check_amount("hours_per_month", costs.hours_per_month)?;
        check_amount("storage_monthly", costs.storage_monthly)?;
        check_amount("fallback_worker_hourly", costs.fallback_worker_hourly)?;
        check_amount("fallback_driver_hourly", costs.fallback_driver_hourly)?;
        check_amount("fallback_worker_units", costs.fallback_worker_units)?;
        check_amount("fallback_driver_units", costs.fallback_driver_units)?;

        for (instance, rate) in &self.instance_hourly_rates {
            check_amount(&format!("hourly rate for {}", instance), *rate)?;
        }
        for (instance, units) in &self.platform_units_per_hour {
            check_amount(&format!("platform units for {}", instance), *units)?;
        }
        for (sku, rate) in &self.platform_unit_rates {
            check_amount(&format!("platform unit rate for {}", sku), *rate)?;
        }
        Ok(())
    }

    pub fn is_gpu_instance(&self, instance_type: &str) -> bool {
        self.gpu_instances
            .values()
            .any(|pair| pair.worker == instance_type)
    }
}

/// Inputs to a cost estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct CostQuery<'a> {
    pub driver_instance_type: &'a str,
    pub worker_instance_type: &'a str,
    pub min_workers: u32,
    pub max_workers: u32,
    pub sku: Sku,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostEstimate {
    pub breakdown: CostBreakdown,
    /// Instance types or SKUs that had no rate and were priced by fallback.
    pub unpriced: Vec<String>,
}

pub trait CostEstimator: Send + Sync {
    fn estimate(&self, tables: &ConfigTables, query: &CostQuery<'_>) -> CostEstimate;
}

pub struct DatabricksCostEstimator;

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl CostEstimator for DatabricksCostEstimator {
    fn estimate(&self, tables: &ConfigTables, query: &CostQuery<'_>) -> CostEstimate {
        let costs = &tables.costs;
        let mut unpriced = Vec::new();

        let mut lookup = |table: &BTreeMap<String, f64>, key: &str, fallback: f64, what: &str| {
            table.get(key).copied().unwrap_or_else(|| {
                unpriced.push(format!("{} for {}", what, key));
                fallback
            })
        };

        let worker_hourly = lookup(
            &tables.instance_hourly_rates,
            query.worker_instance_type,
            costs.fallback_worker_hourly,
            "hourly rate",
        );
        let driver_hourly = lookup(
            &tables.instance_hourly_rates,
            query.driver_instance_type,
            costs.fallback_driver_hourly,
            "hourly rate",
        );
        let worker_units = lookup(
            &tables.platform_units_per_hour,
            query.worker_instance_type,
            costs.fallback_worker_units,
            "platform units",
        );
        let driver_units = lookup(
            &tables.platform_units_per_hour,
            query.driver_instance_type,
            costs.fallback_driver_units,
            "platform units",
        );

        let unit_rate = match tables.platform_unit_rates.get(&query.sku) {
            Some(rate) => *rate,
            None => {
                unpriced.push(format!("platform unit rate for {}", query.sku));
                tables
                    .platform_unit_rates
                    .get(&Sku::Standard)
                    .copied()
                    .unwrap_or(0.15)
            }
        };

        let hours = costs.hours_per_month;
        let avg_workers =
            (f64::from(query.min_workers) + f64::from(query.max_workers)) / 2.0
                * costs.utilization_factor;

        let compute = worker_hourly * avg_workers * hours + driver_hourly * hours;
        let platform_fee =
            worker_units * unit_rate * avg_workers * hours + driver_units * unit_rate * hours;

        CostEstimate {
            breakdown: CostBreakdown::new(
                round_cents(compute),
                round_cents(platform_fee),
                round_cents(costs.storage_monthly),
            ),
            unpriced,
        }
    }
}
