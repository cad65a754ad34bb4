//! Cross-platform comparison and monthly projection
//!
//! Prices the same usage map on every platform variant, picks the cheapest,
//! and extrapolates each platform's observed hourly rate into monthly and
//! annual figures with a peak/off-peak traffic weighting.

use crate::config::SimulatorConfig;
use crate::engine::{price_with_model, PlatformCostResult};
use crate::error::{checked_add, checked_mul, Result};
use crate::models::ServiceUsage;
use crate::pricing::{hours, Platform, PricingCatalog, PricingOptions};
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, info};

const HOURS_PER_DAY: u32 = 24;
const MONTHS_PER_YEAR: u32 = 12;
const PERCENT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Traffic model used to extrapolate an hourly cost to a month.
///
/// Precondition: `peak_hours_per_day + off_peak_hours_per_day <= 24`. This is
/// not validated; out-of-range values simply weight the day differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParams {
    pub peak_hours_per_day: u32,
    pub off_peak_hours_per_day: u32,
    /// Cost multiplier applied during peak hours
    pub peak_multiplier: Decimal,
    pub days_per_month: u32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            peak_hours_per_day: 8,
            off_peak_hours_per_day: 16,
            peak_multiplier: Decimal::from(2),
            days_per_month: 30,
        }
    }
}

/// Monthly and annual cost extrapolated from one hourly cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProjection {
    #[serde(with = "rust_decimal::serde::float")]
    pub hourly_cost_baseline: Decimal,
    pub peak_hours_per_day: u32,
    pub off_peak_hours_per_day: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub peak_multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_hourly_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub projected_monthly_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub projected_annual_cost: Decimal,
}

/// Project an hourly cost to monthly and annual cost.
///
/// Fails with [`SimError::MalformedInput`](crate::SimError::MalformedInput)
/// when a projected figure leaves the decimal range.
pub fn project_monthly(
    hourly_cost: Decimal,
    params: &ProjectionParams,
) -> Result<MonthlyProjection> {
    const QUANTITY: &str = "projected cost";

    let peak_rate = checked_mul(hourly_cost, params.peak_multiplier, QUANTITY)?;
    let peak = checked_mul(peak_rate, Decimal::from(params.peak_hours_per_day), QUANTITY)?;
    let off_peak = checked_mul(
        hourly_cost,
        Decimal::from(params.off_peak_hours_per_day),
        QUANTITY,
    )?;
    let average_hourly_cost =
        checked_add(peak, off_peak, QUANTITY)? / Decimal::from(HOURS_PER_DAY);

    let daily_cost = checked_mul(average_hourly_cost, Decimal::from(HOURS_PER_DAY), QUANTITY)?;
    let projected_monthly_cost =
        checked_mul(daily_cost, Decimal::from(params.days_per_month), QUANTITY)?;
    let projected_annual_cost =
        checked_mul(projected_monthly_cost, Decimal::from(MONTHS_PER_YEAR), QUANTITY)?;

    Ok(MonthlyProjection {
        hourly_cost_baseline: hourly_cost,
        peak_hours_per_day: params.peak_hours_per_day,
        off_peak_hours_per_day: params.off_peak_hours_per_day,
        peak_multiplier: params.peak_multiplier,
        average_hourly_cost,
        projected_monthly_cost,
        projected_annual_cost,
    })
}

/// One platform's window cost and its projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformComparison {
    #[serde(skip)]
    pub platform: Platform,
    #[serde(flatten)]
    pub result: PlatformCostResult,
    pub monthly_projection: MonthlyProjection,
}

/// Cost difference of one platform against the cheapest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformDelta {
    pub platform: Platform,
    pub total_cost: Decimal,
    /// `total_cost - cheapest_cost`
    pub delta: Decimal,
    /// `delta / total_cost * 100`, or zero when `total_cost` is zero
    pub delta_pct: Decimal,
}

/// Final comparison artifact handed to reporting
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub window_seconds: Decimal,
    /// Platforms in evaluation order
    pub platforms: Vec<PlatformComparison>,
    pub cheapest: Platform,
    pub cheapest_cost: Decimal,
    /// One entry per platform, in evaluation order
    pub deltas: Vec<PlatformDelta>,
    pub services: Vec<String>,
}

impl ComparisonResult {
    pub fn platform(&self, platform: Platform) -> Option<&PlatformComparison> {
        self.platforms.iter().find(|p| p.platform == platform)
    }

    pub fn delta(&self, platform: Platform) -> Option<&PlatformDelta> {
        self.deltas.iter().find(|d| d.platform == platform)
    }
}

/// Prices usage on every platform with one configuration
#[derive(Debug, Clone, Default)]
pub struct CostSimulator {
    catalog: PricingCatalog,
    projection: ProjectionParams,
    options: PricingOptions,
}

impl CostSimulator {
    pub fn new(catalog: PricingCatalog, projection: ProjectionParams) -> Self {
        Self {
            catalog,
            projection,
            options: PricingOptions::default(),
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self::new(config.pricing.clone(), config.projection.clone())
    }

    /// Options forwarded to the cluster variants.
    ///
    /// [`price_platform`](Self::price_platform) applies them as given.
    /// [`compare`](Self::compare) shares only the discount fraction, so each
    /// cluster variant is still priced at its own capacity type.
    pub fn with_options(mut self, options: PricingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    pub fn projection(&self) -> &ProjectionParams {
        &self.projection
    }

    /// Price one platform with the configured options
    pub fn price_platform(
        &self,
        platform: Platform,
        usage: &BTreeMap<String, ServiceUsage>,
        window_seconds: Decimal,
    ) -> Result<PlatformCostResult> {
        self.price_with_options(platform, usage, window_seconds, &self.options)
    }

    fn price_with_options(
        &self,
        platform: Platform,
        usage: &BTreeMap<String, ServiceUsage>,
        window_seconds: Decimal,
        options: &PricingOptions,
    ) -> Result<PlatformCostResult> {
        let model = self.catalog.model_for(platform, options);
        price_with_model(platform, &model, usage, window_seconds)
    }

    pub fn project_monthly(&self, hourly_cost: Decimal) -> Result<MonthlyProjection> {
        project_monthly(hourly_cost, &self.projection)
    }

    /// Price `usage` on every platform and rank the results
    pub fn compare(
        &self,
        usage: &BTreeMap<String, ServiceUsage>,
        window_seconds: Decimal,
    ) -> Result<ComparisonResult> {
        // Cluster variants keep their own capacity type; only the discount
        // fraction is shared between them.
        let shared = PricingOptions {
            use_discounted_capacity: None,
            discount: self.options.discount,
        };
        let mut platforms = Vec::with_capacity(Platform::ALL.len());

        for platform in Platform::ALL {
            let result = self.price_with_options(platform, usage, window_seconds, &shared)?;
            let monthly_projection = self.project_monthly(result.cost_per_hour)?;
            debug!(
                platform = %platform,
                total_cost = %result.total_cost,
                cost_per_hour = %result.cost_per_hour,
                "Priced platform"
            );
            platforms.push(PlatformComparison {
                platform,
                result,
                monthly_projection,
            });
        }

        // Strict comparison keeps the first-seen platform on ties.
        let mut cheapest = &platforms[0];
        for candidate in &platforms[1..] {
            if candidate.result.total_cost < cheapest.result.total_cost {
                cheapest = candidate;
            }
        }
        let cheapest_platform = cheapest.platform;
        let cheapest_cost = cheapest.result.total_cost;

        let deltas = platforms
            .iter()
            .map(|p| {
                let total_cost = p.result.total_cost;
                let delta = total_cost - cheapest_cost;
                let delta_pct = if total_cost.is_zero() {
                    Decimal::ZERO
                } else {
                    delta / total_cost * PERCENT
                };
                PlatformDelta {
                    platform: p.platform,
                    total_cost,
                    delta,
                    delta_pct,
                }
            })
            .collect();

        info!(
            cheapest_platform = %cheapest_platform,
            cheapest_cost = %cheapest_cost,
            services = usage.len(),
            "Compared platforms"
        );

        Ok(ComparisonResult {
            window_seconds,
            platforms,
            cheapest: cheapest_platform,
            cheapest_cost,
            deltas,
            services: usage.keys().cloned().collect(),
        })
    }
}

/// Compare all platforms with the built-in pricing catalog and traffic model
pub fn compare(
    usage: &BTreeMap<String, ServiceUsage>,
    window_seconds: Decimal,
) -> Result<ComparisonResult> {
    CostSimulator::default().compare(usage, window_seconds)
}

// Document layout for the reporting side: platforms keyed by report key,
// differences and savings keyed by platform label.

struct AsFloat(Decimal);

impl Serialize for AsFloat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

struct PlatformsView<'a>(&'a [PlatformComparison]);

impl Serialize for PlatformsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(entry.platform.report_key(), entry)?;
        }
        map.end()
    }
}

struct DifferencesView<'a>(&'a [PlatformDelta]);

impl Serialize for DifferencesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for delta in self.0 {
            map.serialize_entry(delta.platform.label(), &AsFloat(delta.delta))?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct SavingsEntry {
    #[serde(with = "rust_decimal::serde::float")]
    vs_cheapest: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    savings_percentage: Decimal,
}

struct SavingsView<'a>(&'a [PlatformDelta]);

impl Serialize for SavingsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for delta in self.0 {
            let entry = SavingsEntry {
                vs_cheapest: delta.delta,
                savings_percentage: delta.delta_pct,
            };
            map.serialize_entry(delta.platform.label(), &entry)?;
        }
        map.end()
    }
}

struct ComparisonView<'a>(&'a ComparisonResult);

impl Serialize for ComparisonView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let result = self.0;
        let mut section = serializer.serialize_struct("comparison", 4)?;
        section.serialize_field("cheapest_platform", result.cheapest.label())?;
        section.serialize_field("cheapest_cost", &AsFloat(result.cheapest_cost))?;
        section.serialize_field("cost_differences", &DifferencesView(&result.deltas))?;
        section.serialize_field("savings", &SavingsView(&result.deltas))?;
        section.end()
    }
}

#[derive(Serialize)]
struct SummaryView<'a> {
    total_services: usize,
    services_analyzed: &'a [String],
}

impl Serialize for ComparisonResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut doc = serializer.serialize_struct("ComparisonResult", 5)?;
        doc.serialize_field("test_duration_seconds", &AsFloat(self.window_seconds))?;
        doc.serialize_field("test_duration_hours", &AsFloat(hours(self.window_seconds)))?;
        doc.serialize_field("platforms", &PlatformsView(&self.platforms))?;
        doc.serialize_field("comparison", &ComparisonView(self))?;
        doc.serialize_field(
            "summary",
            &SummaryView {
                total_services: self.services.len(),
                services_analyzed: &self.services,
            },
        )?;
        doc.end()
    }
}
