//! Cost simulation library for containerized workloads
//!
//! This crate provides the core functionality for:
//! - Aggregating raw utilization samples into per-service usage totals
//! - Platform pricing models (serverless, per-container, cluster spot/on-demand)
//! - Pricing services and platforms over a test window
//! - Cross-platform comparison and monthly/annual projection
//! - Configuration loading and observability

pub mod aggregator;
pub mod compare;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod pricing;

pub use aggregator::{aggregate, parse_metrics};
pub use compare::{
    compare, project_monthly, ComparisonResult, CostSimulator, MonthlyProjection,
    PlatformComparison, PlatformDelta, ProjectionParams,
};
pub use config::SimulatorConfig;
pub use engine::{price_platform, price_service, PlatformCostResult, ServiceCostBreakdown};
pub use error::{Result, SimError};
pub use models::*;
pub use observability::{SimulationMetrics, StructuredLogger};
pub use pricing::{
    get_pricing_model, AddOnFee, ClusterOverhead, FeeBasis, Platform, PricingCatalog,
    PricingModel, PricingOptions,
};
