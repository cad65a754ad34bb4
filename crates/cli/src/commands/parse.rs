//! `parse-metrics`: raw utilization samples to per-service usage

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::Tabled;

use super::RunContext;
use crate::output::{
    format_duration, format_percent, format_timestamp, print_info, print_json, print_success,
    print_warning, OutputFormat,
};
use sim_lib::document::{load_raw_metrics, write_json};
use sim_lib::ParsedMetrics;

/// Row for the per-service usage table
#[derive(Tabled)]
struct ServiceUsageRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "vCPU-seconds")]
    vcpu_seconds: String,
    #[tabled(rename = "GB-seconds")]
    memory_gb_seconds: String,
    #[tabled(rename = "Avg CPU")]
    avg_cpu: String,
    #[tabled(rename = "Avg Memory")]
    avg_memory: String,
}

pub fn run(ctx: &RunContext, input: &Path, output: &Path) -> Result<()> {
    ctx.logger
        .log_stage_started("parse-metrics", &input.display().to_string());

    let raw = load_raw_metrics(input)
        .with_context(|| format!("Failed to load raw metrics from {}", input.display()))?;
    let parsed = sim_lib::parse_metrics(&raw)
        .with_context(|| format!("Failed to aggregate metrics from {}", input.display()))?;

    ctx.metrics.record_aggregation(
        parsed.total_samples,
        parsed.dropped_samples,
        parsed.services.len(),
    );
    ctx.logger.log_metrics_aggregated(
        parsed.services.len(),
        parsed.total_samples,
        parsed.dropped_samples,
    );

    write_json(output, &parsed)?;
    ctx.logger
        .log_stage_completed("parse-metrics", Some(&output.display().to_string()));

    match ctx.format {
        OutputFormat::Json => print_json(&parsed)?,
        OutputFormat::Table => print_summary(&parsed, output),
    }

    Ok(())
}

fn print_summary(parsed: &ParsedMetrics, output: &Path) {
    print_success(&format!("Exported metrics to: {}", output.display()));
    println!();
    println!("{}", "Metrics Summary".bold());
    println!("{}", "=".repeat(50));
    println!("Duration:   {}", format_duration(parsed.duration_seconds));
    if let (Some(start), Some(end)) = (&parsed.start_time, &parsed.end_time) {
        println!(
            "Window:     {} to {}",
            format_timestamp(start).dimmed(),
            format_timestamp(end).dimmed()
        );
    }
    println!("Services:   {}", parsed.services.len());

    if parsed.dropped_samples > 0 {
        print_warning(&format!(
            "{} of {} samples had no service id and were skipped",
            parsed.dropped_samples, parsed.total_samples
        ));
    }

    if parsed.services.is_empty() {
        print_info("No service samples found in the input");
        return;
    }

    let rows: Vec<ServiceUsageRow> = parsed
        .services
        .iter()
        .map(|(name, usage)| ServiceUsageRow {
            service: name.clone(),
            samples: usage.num_samples,
            vcpu_seconds: format!("{:.2}", usage.vcpu_seconds.round_dp(2)),
            memory_gb_seconds: format!("{:.2}", usage.memory_gb_seconds.round_dp(2)),
            avg_cpu: format_percent(usage.avg_cpu_percent),
            avg_memory: format!("{:.3} GB", usage.avg_memory_gb.round_dp(3)),
        })
        .collect();

    println!();
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}
