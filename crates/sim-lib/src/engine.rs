//! Cost engine
//!
//! Prices aggregated service usage under a [`PricingModel`]:
//!
//! 1. Capacity adjustment: scale-to-zero platforms bill only the share of the
//!    window in which an instance was running; platforms with a minimum
//!    instance count bill at least that many always-on baseline containers.
//! 2. Unit pricing of the billed vCPU-seconds and GB-seconds.
//! 3. Add-on fees (hourly fees accrue over the window, flat fees are added as-is).
//!
//! All intermediate values are [`Decimal`]; they only become floats when a
//! result document is serialized.

use crate::error::{checked_mul, checked_sum, Result, SimError};
use crate::models::{ActivityInterval, ServiceUsage};
use crate::pricing::{hours, Platform, PricingCatalog, PricingModel, PricingOptions};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// vCPUs held by one always-on baseline instance
pub const MIN_INSTANCE_VCPU: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Memory (GB) held by one always-on baseline instance
pub const MIN_INSTANCE_MEMORY_GB: Decimal = Decimal::ONE;

/// Cost of one service over the window on one platform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCostBreakdown {
    pub service: String,
    /// Billed vCPU-seconds after capacity adjustment
    #[serde(with = "rust_decimal::serde::float")]
    pub vcpu_seconds: Decimal,
    /// Billed memory GB-seconds after capacity adjustment
    #[serde(with = "rust_decimal::serde::float")]
    pub memory_gb_seconds: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub vcpu_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub memory_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub additional_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    pub replicas: Vec<ActivityInterval>,
}

/// Cost of every service on one platform variant over the window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformCostResult {
    #[serde(skip)]
    pub platform: Platform,
    /// Display name of the pricing model
    #[serde(rename = "platform")]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub duration_seconds: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub duration_hours: Decimal,
    pub service_costs: Vec<ServiceCostBreakdown>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub control_plane_cost: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_overhead_cost: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_per_hour: Decimal,
}

/// Apply scale-to-zero proration or the minimum-capacity floor
fn billed_usage(
    model: &PricingModel,
    usage: &ServiceUsage,
    active_seconds: Decimal,
    window_seconds: Decimal,
) -> Result<(Decimal, Decimal)> {
    let mut vcpu_seconds = usage.vcpu_seconds;
    let mut memory_gb_seconds = usage.memory_gb_seconds;

    if model.supports_scale_to_zero {
        if !window_seconds.is_zero() {
            let scale = active_seconds / window_seconds;
            vcpu_seconds = checked_mul(vcpu_seconds, scale, "billed vCPU-seconds")?;
            memory_gb_seconds = checked_mul(memory_gb_seconds, scale, "billed memory GB-seconds")?;
        }
    } else if model.minimum_instances > 0 {
        let instances = Decimal::from(model.minimum_instances);
        let floor_vcpu = checked_mul(instances * MIN_INSTANCE_VCPU, window_seconds, "capacity floor")?;
        let floor_memory =
            checked_mul(instances * MIN_INSTANCE_MEMORY_GB, window_seconds, "capacity floor")?;
        vcpu_seconds = vcpu_seconds.max(floor_vcpu);
        memory_gb_seconds = memory_gb_seconds.max(floor_memory);
    }

    Ok((vcpu_seconds, memory_gb_seconds))
}

/// Price one service's usage under a pricing model.
///
/// Fails with [`SimError::MalformedInput`] when the service's activity
/// intervals add up to more than the window, or when a cost leaves the
/// decimal range.
pub fn price_service(
    model: &PricingModel,
    service: &str,
    usage: &ServiceUsage,
    window_seconds: Decimal,
) -> Result<ServiceCostBreakdown> {
    let active_seconds = usage.active_seconds()?;
    if active_seconds > window_seconds {
        return Err(SimError::malformed(format!(
            "service '{}' is active for {} seconds, longer than the {} second window",
            service, active_seconds, window_seconds
        )));
    }

    let (vcpu_seconds, memory_gb_seconds) =
        billed_usage(model, usage, active_seconds, window_seconds)?;

    let vcpu_cost = checked_mul(vcpu_seconds, model.vcpu_per_second, "vCPU cost")?;
    let memory_cost = checked_mul(memory_gb_seconds, model.memory_per_gb_second, "memory cost")?;
    let additional_cost = checked_sum(
        model
            .additional_costs
            .values()
            .map(|fee| fee.cost_for(window_seconds))
            .collect::<Result<Vec<_>>>()?,
        "add-on fees",
    )?;

    let total_cost = checked_sum([vcpu_cost, memory_cost, additional_cost], "service cost")?;

    debug!(
        platform = %model.name,
        service = %service,
        billed_vcpu_seconds = %vcpu_seconds,
        billed_memory_gb_seconds = %memory_gb_seconds,
        total_cost = %total_cost,
        "Priced service"
    );

    Ok(ServiceCostBreakdown {
        service: service.to_string(),
        vcpu_seconds,
        memory_gb_seconds,
        vcpu_cost,
        memory_cost,
        additional_cost,
        total_cost,
        replicas: usage.replicas.clone(),
    })
}

/// Price every service under an already-built model for `platform`.
///
/// Fails with [`SimError::DivisionByZero`] when `window_seconds` is zero,
/// since the hourly rate is undefined.
pub fn price_with_model(
    platform: Platform,
    model: &PricingModel,
    usage: &BTreeMap<String, ServiceUsage>,
    window_seconds: Decimal,
) -> Result<PlatformCostResult> {
    let service_costs = usage
        .iter()
        .map(|(service, service_usage)| price_service(model, service, service_usage, window_seconds))
        .collect::<Result<Vec<_>>>()?;

    let mut total_cost = checked_sum(service_costs.iter().map(|c| c.total_cost), "platform cost")?;

    let (control_plane_cost, node_overhead_cost) = match &model.cluster_overhead {
        Some(overhead) => {
            let control_plane = overhead.control_plane_cost(window_seconds)?;
            let node_overhead = overhead.node_overhead_cost(window_seconds)?;
            total_cost = checked_sum([total_cost, control_plane, node_overhead], "platform cost")?;
            (Some(control_plane), Some(node_overhead))
        }
        None => (None, None),
    };

    let duration_hours = hours(window_seconds);
    if duration_hours.is_zero() {
        return Err(SimError::DivisionByZero {
            context: "cost per hour requested for a zero-length window",
        });
    }
    let cost_per_hour = total_cost
        .checked_div(duration_hours)
        .ok_or_else(|| SimError::overflow("cost per hour"))?;

    Ok(PlatformCostResult {
        platform,
        name: model.name.clone(),
        duration_seconds: window_seconds,
        duration_hours,
        service_costs,
        control_plane_cost,
        node_overhead_cost,
        total_cost,
        cost_per_hour,
    })
}

/// Price all services on a platform identified by `platform_id`
pub fn price_platform(
    catalog: &PricingCatalog,
    platform_id: &str,
    usage: &BTreeMap<String, ServiceUsage>,
    window_seconds: Decimal,
    options: &PricingOptions,
) -> Result<PlatformCostResult> {
    let platform: Platform = platform_id.parse()?;
    let model = catalog.model_for(platform, options);
    price_with_model(platform, &model, usage, window_seconds)
}
