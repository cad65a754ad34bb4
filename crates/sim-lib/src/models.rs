//! Core data models for the cost simulator

use crate::error::{checked_sum, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default sampling interval used by the metrics sampler (seconds)
pub const DEFAULT_INTERVAL_SECONDS: i64 = 10;

fn default_interval_seconds() -> Decimal {
    Decimal::from(DEFAULT_INTERVAL_SECONDS)
}

fn default_cpu_cores() -> Decimal {
    Decimal::new(5, 1)
}

fn default_memory_limit_gb() -> Decimal {
    Decimal::ONE
}

/// One utilization measurement for one service at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct UtilizationSample {
    /// Service the sample belongs to; samples without one are dropped
    pub service: Option<String>,
    pub timestamp: String,
    /// CPU utilization relative to the allocated cores (0-100)
    pub cpu_percent: Decimal,
    pub cpu_cores: Decimal,
    pub memory_used_gb: Decimal,
    pub memory_limit_gb: Decimal,
}

/// A span of time during which a service ran `count` instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityInterval {
    #[serde(default)]
    pub count: u32,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub duration_seconds: Decimal,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl ActivityInterval {
    pub fn is_active(&self) -> bool {
        self.count > 0
    }
}

/// Aggregated resource usage for one service over the test window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceUsage {
    #[serde(with = "rust_decimal::serde::float", default)]
    pub vcpu_seconds: Decimal,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub memory_gb_seconds: Decimal,
    #[serde(with = "rust_decimal::serde::float", default = "default_cpu_cores")]
    pub cpu_cores_allocated: Decimal,
    #[serde(with = "rust_decimal::serde::float", default = "default_memory_limit_gb")]
    pub memory_gb_allocated: Decimal,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub max_cpu_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub max_memory_gb: Decimal,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub avg_cpu_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub avg_memory_gb: Decimal,
    #[serde(default)]
    pub replicas: Vec<ActivityInterval>,
    #[serde(default)]
    pub num_samples: usize,
}

impl ServiceUsage {
    /// Seconds during which at least one instance was running
    pub fn active_seconds(&self) -> Result<Decimal> {
        checked_sum(
            self.replicas
                .iter()
                .filter(|r| r.is_active())
                .map(|r| r.duration_seconds),
            "active seconds",
        )
    }
}

/// Raw sample record as written by the metrics sampler
#[derive(Debug, Clone, Deserialize)]
pub struct RawSample {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub cpu_percent: Decimal,
    #[serde(default = "default_cpu_cores")]
    pub cpu_cores: Decimal,
    #[serde(default)]
    pub memory_used_gb: Decimal,
    #[serde(default = "default_memory_limit_gb")]
    pub memory_limit_gb: Decimal,
}

/// Raw time-series document produced by the metrics sampler
#[derive(Debug, Clone, Deserialize)]
pub struct RawMetricsDocument {
    #[serde(default)]
    pub duration_seconds: Decimal,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: Decimal,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Sample timestamp -> sample record
    pub collected_metrics: BTreeMap<String, RawSample>,
}

impl RawMetricsDocument {
    /// Flatten the timestamp-keyed records into samples, in timestamp order
    pub fn samples(&self) -> Vec<UtilizationSample> {
        self.collected_metrics
            .iter()
            .map(|(timestamp, raw)| UtilizationSample {
                service: raw.service.clone(),
                timestamp: timestamp.clone(),
                cpu_percent: raw.cpu_percent,
                cpu_cores: raw.cpu_cores,
                memory_used_gb: raw.memory_used_gb,
                memory_limit_gb: raw.memory_limit_gb,
            })
            .collect()
    }
}

/// Aggregator output document, consumed by the pricing stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedMetrics {
    #[serde(with = "rust_decimal::serde::float", default)]
    pub duration_seconds: Decimal,
    #[serde(with = "rust_decimal::serde::float", default = "default_interval_seconds")]
    pub interval_seconds: Decimal,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    pub services: BTreeMap<String, ServiceUsage>,
    /// Samples present in the raw document
    #[serde(skip)]
    pub total_samples: usize,
    /// Samples skipped because they carried no service id
    #[serde(skip)]
    pub dropped_samples: usize,
}
