//! Platform pricing models
//!
//! Each platform variant is described by an immutable [`PricingModel`] built
//! fresh from a [`PricingCatalog`] for every calculation. The catalog is plain
//! configuration data; nothing here holds process-wide pricing state.

use crate::error::{checked_mul, Result, SimError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Seconds per billing hour
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Supported billing platforms, in comparison order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    /// Consumption-billed serverless containers with scale-to-zero (ACA)
    ConsumptionServerless,
    /// Always-on per-container billing (ACI)
    PerContainer,
    /// Managed cluster on discounted spot capacity (AKS spot)
    ClusterSpot,
    /// Managed cluster on on-demand capacity (AKS on-demand)
    ClusterOnDemand,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::ConsumptionServerless,
        Platform::PerContainer,
        Platform::ClusterSpot,
        Platform::ClusterOnDemand,
    ];

    /// Canonical platform identifier
    pub fn id(&self) -> &'static str {
        match self {
            Platform::ConsumptionServerless => "consumption-serverless",
            Platform::PerContainer => "per-container",
            Platform::ClusterSpot => "cluster-spot",
            Platform::ClusterOnDemand => "cluster-on-demand",
        }
    }

    /// Key used for the platform in comparison documents
    pub fn report_key(&self) -> &'static str {
        match self {
            Platform::ConsumptionServerless => "aca",
            Platform::PerContainer => "aci",
            Platform::ClusterSpot => "aks_spot",
            Platform::ClusterOnDemand => "aks_ondemand",
        }
    }

    /// Short label used in cost difference and savings tables
    pub fn label(&self) -> &'static str {
        match self {
            Platform::ConsumptionServerless => "ACA",
            Platform::PerContainer => "ACI",
            Platform::ClusterSpot => "AKS Spot",
            Platform::ClusterOnDemand => "AKS On-Demand",
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, Platform::ClusterSpot | Platform::ClusterOnDemand)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "consumption-serverless" | "aca" => Ok(Platform::ConsumptionServerless),
            "per-container" | "aci" => Ok(Platform::PerContainer),
            "cluster-spot" | "aks-spot" | "aks_spot" | "aks" | "cluster" => {
                Ok(Platform::ClusterSpot)
            }
            "cluster-on-demand" | "aks-ondemand" | "aks_ondemand" | "aks-on-demand" => {
                Ok(Platform::ClusterOnDemand)
            }
            _ => Err(SimError::UnknownPlatform {
                platform: s.to_string(),
            }),
        }
    }
}

/// How an add-on fee accrues over the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeBasis {
    /// Billed per hour of the window
    Hourly,
    /// Added once as-is
    Flat,
}

impl FeeBasis {
    /// Fees whose name carries `per_hour` are hourly rates; all others are flat.
    pub fn from_name(name: &str) -> Self {
        if name.contains("per_hour") {
            FeeBasis::Hourly
        } else {
            FeeBasis::Flat
        }
    }
}

/// Named add-on fee attached to a pricing model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOnFee {
    pub amount: Decimal,
    pub basis: FeeBasis,
}

impl AddOnFee {
    pub fn named(name: &str, amount: Decimal) -> Self {
        Self {
            amount,
            basis: FeeBasis::from_name(name),
        }
    }

    /// Fee accrued over a window of `window_seconds`
    pub fn cost_for(&self, window_seconds: Decimal) -> Result<Decimal> {
        match self.basis {
            FeeBasis::Hourly => checked_mul(self.amount, hours(window_seconds), "add-on fee"),
            FeeBasis::Flat => Ok(self.amount),
        }
    }
}

/// Platform-level overhead billed once per cluster rather than per service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterOverhead {
    pub control_plane_per_hour: Decimal,
    pub per_node_overhead: Decimal,
    /// Assumed node pool size; not derived from node telemetry
    pub node_count: u32,
}

impl ClusterOverhead {
    pub fn control_plane_cost(&self, window_seconds: Decimal) -> Result<Decimal> {
        checked_mul(self.control_plane_per_hour, hours(window_seconds), "control plane cost")
    }

    pub fn node_overhead_cost(&self, window_seconds: Decimal) -> Result<Decimal> {
        let per_hour = checked_mul(
            self.per_node_overhead,
            Decimal::from(self.node_count),
            "node overhead cost",
        )?;
        checked_mul(per_hour, hours(window_seconds), "node overhead cost")
    }
}

/// Immutable description of how one platform variant bills
#[derive(Debug, Clone, PartialEq)]
pub struct PricingModel {
    pub name: String,
    pub vcpu_per_second: Decimal,
    pub memory_per_gb_second: Decimal,
    pub supports_scale_to_zero: bool,
    /// Capacity floor applied when scale-to-zero is unsupported
    pub minimum_instances: u32,
    pub additional_costs: BTreeMap<String, AddOnFee>,
    pub cluster_overhead: Option<ClusterOverhead>,
}

/// Per-call options for cluster variants
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PricingOptions {
    /// Bill at the discounted (spot) rate. Defaults to true for
    /// [`Platform::ClusterSpot`] and false for [`Platform::ClusterOnDemand`].
    pub use_discounted_capacity: Option<bool>,
    /// Discount fraction applied to on-demand rates. Defaults to the
    /// catalog's `spot_discount`.
    pub discount: Option<Decimal>,
}

impl PricingOptions {
    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn with_discounted_capacity(mut self, enabled: bool) -> Self {
        self.use_discounted_capacity = Some(enabled);
        self
    }
}

/// Pricing for container plans billed directly per vCPU-second and GB-second
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerPlanPricing {
    pub name: String,
    pub vcpu_per_second: Decimal,
    pub memory_per_gb_second: Decimal,
    pub supports_scale_to_zero: bool,
    pub minimum_instances: u32,
}

impl ContainerPlanPricing {
    /// Consumption plan: $0.000012 per vCPU-second, $0.0000015 per GB-second
    pub fn serverless() -> Self {
        Self {
            name: "Azure Container Apps (ACA)".to_string(),
            vcpu_per_second: Decimal::new(12, 6),
            memory_per_gb_second: Decimal::new(15, 7),
            supports_scale_to_zero: true,
            minimum_instances: 0,
        }
    }

    /// Same unit rates as the consumption plan, but at least one container
    /// is always running
    pub fn per_container() -> Self {
        Self {
            name: "Azure Container Instances (ACI)".to_string(),
            supports_scale_to_zero: false,
            minimum_instances: 1,
            ..Self::serverless()
        }
    }

    fn to_model(&self) -> PricingModel {
        PricingModel {
            name: self.name.clone(),
            vcpu_per_second: self.vcpu_per_second,
            memory_per_gb_second: self.memory_per_gb_second,
            supports_scale_to_zero: self.supports_scale_to_zero,
            minimum_instances: self.minimum_instances,
            additional_costs: BTreeMap::new(),
            cluster_overhead: None,
        }
    }
}

/// Managed cluster pricing, published as per-hour node rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPricing {
    pub name: String,
    pub on_demand_vcpu_per_hour: Decimal,
    pub on_demand_memory_per_gb_hour: Decimal,
    pub control_plane_per_hour: Decimal,
    pub node_overhead_per_node: Decimal,
    pub assumed_node_count: u32,
    pub spot_discount: Decimal,
}

impl Default for ClusterPricing {
    fn default() -> Self {
        Self {
            name: "Azure Kubernetes Service (AKS)".to_string(),
            on_demand_vcpu_per_hour: Decimal::new(48, 3),
            on_demand_memory_per_gb_hour: Decimal::new(5, 3),
            control_plane_per_hour: Decimal::new(10, 2),
            node_overhead_per_node: Decimal::new(1, 2),
            assumed_node_count: 2,
            spot_discount: Decimal::new(70, 2),
        }
    }
}

impl ClusterPricing {
    fn to_model(&self, discounted: bool, discount: Decimal) -> PricingModel {
        let hour = Decimal::from(SECONDS_PER_HOUR);
        let mut vcpu_per_second = self.on_demand_vcpu_per_hour / hour;
        let mut memory_per_gb_second = self.on_demand_memory_per_gb_hour / hour;

        if discounted {
            let factor = Decimal::ONE - discount;
            vcpu_per_second *= factor;
            memory_per_gb_second *= factor;
        }

        let mut additional_costs = BTreeMap::new();
        additional_costs.insert(
            "control_plane_per_hour".to_string(),
            AddOnFee::named("control_plane_per_hour", self.control_plane_per_hour),
        );
        additional_costs.insert(
            "node_overhead_per_node".to_string(),
            AddOnFee::named("node_overhead_per_node", self.node_overhead_per_node),
        );

        PricingModel {
            name: format!(
                "{} - {}",
                self.name,
                if discounted { "Spot" } else { "On-Demand" }
            ),
            vcpu_per_second,
            memory_per_gb_second,
            supports_scale_to_zero: false,
            minimum_instances: 0,
            additional_costs,
            cluster_overhead: Some(ClusterOverhead {
                control_plane_per_hour: self.control_plane_per_hour,
                per_node_overhead: self.node_overhead_per_node,
                node_count: self.assumed_node_count,
            }),
        }
    }
}

/// Immutable pricing configuration for every supported platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingCatalog {
    #[serde(default = "ContainerPlanPricing::serverless")]
    pub serverless: ContainerPlanPricing,
    #[serde(default = "ContainerPlanPricing::per_container")]
    pub per_container: ContainerPlanPricing,
    #[serde(default)]
    pub cluster: ClusterPricing,
}

impl Default for PricingCatalog {
    fn default() -> Self {
        Self {
            serverless: ContainerPlanPricing::serverless(),
            per_container: ContainerPlanPricing::per_container(),
            cluster: ClusterPricing::default(),
        }
    }
}

impl PricingCatalog {
    /// Build the pricing model for a platform variant
    pub fn model_for(&self, platform: Platform, options: &PricingOptions) -> PricingModel {
        match platform {
            Platform::ConsumptionServerless => self.serverless.to_model(),
            Platform::PerContainer => self.per_container.to_model(),
            Platform::ClusterSpot | Platform::ClusterOnDemand => {
                let discounted = options
                    .use_discounted_capacity
                    .unwrap_or(platform == Platform::ClusterSpot);
                let discount = options.discount.unwrap_or(self.cluster.spot_discount);
                self.cluster.to_model(discounted, discount)
            }
        }
    }

    /// Resolve a platform identifier and build its pricing model
    pub fn get_pricing_model(
        &self,
        platform_id: &str,
        options: &PricingOptions,
    ) -> Result<PricingModel> {
        let platform: Platform = platform_id.parse()?;
        Ok(self.model_for(platform, options))
    }
}

/// Build a pricing model from the built-in catalog
pub fn get_pricing_model(platform_id: &str, options: &PricingOptions) -> Result<PricingModel> {
    PricingCatalog::default().get_pricing_model(platform_id, options)
}

pub(crate) fn hours(window_seconds: Decimal) -> Decimal {
    window_seconds / Decimal::from(SECONDS_PER_HOUR)
}
