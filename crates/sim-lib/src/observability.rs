//! Observability infrastructure for the simulator
//!
//! Provides:
//! - Prometheus metrics (samples aggregated/dropped, services, platform cost, pricing latency)
//! - Structured logging of stage events with tracing
//!
//! The calculation functions never record metrics themselves; the CLI records
//! them around each stage and can export them in the text exposition format.

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge, Encoder,
    GaugeVec, Histogram, IntCounter, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for pricing latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.00001, 0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SimulationMetricsInner> = OnceLock::new();

struct SimulationMetricsInner {
    samples_aggregated: IntCounter,
    samples_dropped: IntCounter,
    services_aggregated: IntGauge,
    platform_total_cost: GaugeVec,
    pricing_duration_seconds: Histogram,
}

impl SimulationMetricsInner {
    fn new() -> Self {
        Self {
            samples_aggregated: register_int_counter!(
                "costsim_samples_aggregated_total",
                "Utilization samples read from raw metrics documents"
            )
            .expect("Failed to register samples_aggregated"),

            samples_dropped: register_int_counter!(
                "costsim_samples_dropped_total",
                "Samples skipped because they carried no service id"
            )
            .expect("Failed to register samples_dropped"),

            services_aggregated: register_int_gauge!(
                "costsim_services_aggregated",
                "Number of services in the last aggregation"
            )
            .expect("Failed to register services_aggregated"),

            platform_total_cost: register_gauge_vec!(
                "costsim_platform_total_cost",
                "Total cost over the test window per platform",
                &["platform"]
            )
            .expect("Failed to register platform_total_cost"),

            pricing_duration_seconds: register_histogram!(
                "costsim_pricing_duration_seconds",
                "Time spent pricing a usage map",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register pricing_duration_seconds"),
        }
    }
}

/// Handle to the global simulation metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct SimulationMetrics {
    _private: (),
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SimulationMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SimulationMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record the outcome of one aggregation run
    pub fn record_aggregation(&self, total_samples: usize, dropped_samples: usize, services: usize) {
        let inner = self.inner();
        inner.samples_aggregated.inc_by(total_samples as u64);
        inner.samples_dropped.inc_by(dropped_samples as u64);
        inner.services_aggregated.set(services as i64);
    }

    /// Record a platform's total cost
    pub fn set_platform_cost(&self, platform: &str, total_cost: f64) {
        self.inner()
            .platform_total_cost
            .with_label_values(&[platform])
            .set(total_cost);
    }

    pub fn observe_pricing_duration(&self, duration_secs: f64) {
        self.inner().pricing_duration_seconds.observe(duration_secs);
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for simulation stage events
#[derive(Clone)]
pub struct StructuredLogger {
    run_id: String,
}

impl StructuredLogger {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    pub fn log_stage_started(&self, stage: &str, input: &str) {
        info!(
            event = "stage_started",
            run_id = %self.run_id,
            stage = %stage,
            input = %input,
            "Simulation stage started"
        );
    }

    pub fn log_metrics_aggregated(&self, services: usize, total_samples: usize, dropped_samples: usize) {
        if dropped_samples > 0 {
            warn!(
                event = "metrics_aggregated",
                run_id = %self.run_id,
                services = services,
                total_samples = total_samples,
                dropped_samples = dropped_samples,
                "Aggregated metrics, some samples had no service id"
            );
        } else {
            info!(
                event = "metrics_aggregated",
                run_id = %self.run_id,
                services = services,
                total_samples = total_samples,
                "Aggregated metrics"
            );
        }
    }

    pub fn log_platform_priced(&self, platform: &str, total_cost: f64, cost_per_hour: f64) {
        info!(
            event = "platform_priced",
            run_id = %self.run_id,
            platform = %platform,
            total_cost = total_cost,
            cost_per_hour = cost_per_hour,
            "Platform priced"
        );
    }

    pub fn log_comparison_completed(&self, cheapest_platform: &str, cheapest_cost: f64, services: usize) {
        info!(
            event = "comparison_completed",
            run_id = %self.run_id,
            cheapest_platform = %cheapest_platform,
            cheapest_cost = cheapest_cost,
            services = services,
            "Platform comparison completed"
        );
    }

    pub fn log_stage_completed(&self, stage: &str, output: Option<&str>) {
        info!(
            event = "stage_completed",
            run_id = %self.run_id,
            stage = %stage,
            output = ?output,
            "Simulation stage completed"
        );
    }
}
