//! Metrics aggregation
//!
//! Turns evenly spaced utilization samples into per-service resource totals
//! (vCPU-seconds and memory GB-seconds) plus descriptive statistics. Totals
//! are a Riemann sum over the sample schedule: every sample stands for one
//! `interval_seconds` slice of the window. Callers must guarantee the samples
//! really are evenly spaced; timestamps are never used to derive intervals.

#[cfg(test)]
mod tests;

use crate::error::{checked_add, checked_mul, Result};
use crate::models::{
    ActivityInterval, ParsedMetrics, RawMetricsDocument, ServiceUsage, UtilizationSample,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const PERCENT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Running totals for one service
#[derive(Debug)]
struct ServiceAccumulator {
    cpu_cores: Decimal,
    memory_limit_gb: Decimal,
    vcpu_seconds: Decimal,
    memory_gb_seconds: Decimal,
    max_cpu_percent: Decimal,
    max_memory_gb: Decimal,
    cpu_percent_sum: Decimal,
    memory_gb_sum: Decimal,
    first_timestamp: String,
    last_timestamp: String,
    num_samples: usize,
}

impl ServiceAccumulator {
    /// Allocation is taken from the first sample seen for the service
    fn new(first: &UtilizationSample) -> Self {
        Self {
            cpu_cores: first.cpu_cores,
            memory_limit_gb: first.memory_limit_gb,
            vcpu_seconds: Decimal::ZERO,
            memory_gb_seconds: Decimal::ZERO,
            max_cpu_percent: Decimal::ZERO,
            max_memory_gb: Decimal::ZERO,
            cpu_percent_sum: Decimal::ZERO,
            memory_gb_sum: Decimal::ZERO,
            first_timestamp: first.timestamp.clone(),
            last_timestamp: first.timestamp.clone(),
            num_samples: 0,
        }
    }

    fn add(&mut self, sample: &UtilizationSample, interval_seconds: Decimal) -> Result<()> {
        let vcpu_used = checked_mul(self.cpu_cores, sample.cpu_percent / PERCENT, "vCPU usage")?;
        let vcpu_slice = checked_mul(vcpu_used, interval_seconds, "vCPU-seconds")?;
        let memory_slice =
            checked_mul(sample.memory_used_gb, interval_seconds, "memory GB-seconds")?;

        // Update only once every quantity is known to fit.
        let vcpu_seconds = checked_add(self.vcpu_seconds, vcpu_slice, "vCPU-seconds")?;
        let memory_gb_seconds =
            checked_add(self.memory_gb_seconds, memory_slice, "memory GB-seconds")?;
        let cpu_percent_sum = checked_add(self.cpu_percent_sum, sample.cpu_percent, "CPU percent")?;
        let memory_gb_sum = checked_add(self.memory_gb_sum, sample.memory_used_gb, "memory GB")?;

        self.vcpu_seconds = vcpu_seconds;
        self.memory_gb_seconds = memory_gb_seconds;
        self.cpu_percent_sum = cpu_percent_sum;
        self.memory_gb_sum = memory_gb_sum;
        self.max_cpu_percent = self.max_cpu_percent.max(sample.cpu_percent);
        self.max_memory_gb = self.max_memory_gb.max(sample.memory_used_gb);

        self.last_timestamp = sample.timestamp.clone();
        self.num_samples += 1;
        Ok(())
    }

    fn finish(self, window_seconds: Decimal) -> ServiceUsage {
        let (avg_cpu_percent, avg_memory_gb) = if self.num_samples > 0 {
            let n = Decimal::from(self.num_samples);
            (self.cpu_percent_sum / n, self.memory_gb_sum / n)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        // Replica counts are not part of the sampled telemetry, so the service
        // is modeled as a single instance running for the whole window.
        let replicas = vec![ActivityInterval {
            count: 1,
            duration_seconds: window_seconds,
            start_time: Some(self.first_timestamp),
            end_time: Some(self.last_timestamp),
        }];

        ServiceUsage {
            vcpu_seconds: self.vcpu_seconds,
            memory_gb_seconds: self.memory_gb_seconds,
            cpu_cores_allocated: self.cpu_cores,
            memory_gb_allocated: self.memory_limit_gb,
            max_cpu_percent: self.max_cpu_percent,
            max_memory_gb: self.max_memory_gb,
            avg_cpu_percent,
            avg_memory_gb,
            replicas,
            num_samples: self.num_samples,
        }
    }
}

/// Aggregate samples into per-service usage totals.
///
/// Samples without a service id are skipped. Services only appear in the
/// result if at least one sample was recorded for them. Fails with
/// [`SimError::MalformedInput`](crate::SimError::MalformedInput) when a total
/// leaves the decimal range.
pub fn aggregate(
    samples: &[UtilizationSample],
    window_seconds: Decimal,
    interval_seconds: Decimal,
) -> Result<BTreeMap<String, ServiceUsage>> {
    let mut accumulators: BTreeMap<String, ServiceAccumulator> = BTreeMap::new();

    for sample in samples {
        let Some(service) = sample.service.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };

        accumulators
            .entry(service.to_string())
            .or_insert_with(|| ServiceAccumulator::new(sample))
            .add(sample, interval_seconds)?;
    }

    let services = accumulators
        .into_iter()
        .filter(|(_, acc)| acc.num_samples > 0)
        .map(|(service, acc)| {
            let usage = acc.finish(window_seconds);
            debug!(
                service = %service,
                vcpu_seconds = %usage.vcpu_seconds,
                memory_gb_seconds = %usage.memory_gb_seconds,
                num_samples = usage.num_samples,
                "Aggregated service usage"
            );
            (service, usage)
        })
        .collect();

    Ok(services)
}

/// Aggregate a raw sampler document into the parsed metrics document
pub fn parse_metrics(doc: &RawMetricsDocument) -> Result<ParsedMetrics> {
    let samples = doc.samples();
    let dropped_samples = samples
        .iter()
        .filter(|s| s.service.as_deref().map_or(true, str::is_empty))
        .count();

    if dropped_samples > 0 {
        warn!(
            dropped_samples,
            "Skipped samples without a service id"
        );
    }

    let services = aggregate(&samples, doc.duration_seconds, doc.interval_seconds)?;

    info!(
        services = services.len(),
        samples = samples.len(),
        duration_seconds = %doc.duration_seconds,
        interval_seconds = %doc.interval_seconds,
        "Parsed metrics document"
    );

    Ok(ParsedMetrics {
        duration_seconds: doc.duration_seconds,
        interval_seconds: doc.interval_seconds,
        start_time: doc.start_time.clone(),
        end_time: doc.end_time.clone(),
        services,
        total_samples: samples.len(),
        dropped_samples,
    })
}
