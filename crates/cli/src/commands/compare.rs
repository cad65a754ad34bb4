//! `compare`: price parsed usage on every platform and rank them

use anyhow::{Context, Result};
use colored::Colorize;
use rust_decimal::Decimal;
use std::path::Path;
use std::time::Instant;
use tabled::Tabled;

use super::{as_f64, RunContext};
use crate::output::{
    color_delta, format_currency, format_duration, format_percent, print_json, print_success,
    OutputFormat,
};
use sim_lib::document::{load_parsed_metrics, write_json};
use sim_lib::{ComparisonResult, CostSimulator};

/// Row for the platform ranking table
#[derive(Tabled)]
struct PlatformRow {
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Test Cost")]
    total_cost: String,
    #[tabled(rename = "Per Hour")]
    cost_per_hour: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Annual")]
    annual: String,
    #[tabled(rename = "vs Cheapest")]
    delta: String,
    #[tabled(rename = "Savings %")]
    delta_pct: String,
}

pub fn run(
    ctx: &RunContext,
    input: &Path,
    duration_seconds: Option<Decimal>,
    output: &Path,
) -> Result<()> {
    ctx.logger
        .log_stage_started("compare", &input.display().to_string());

    let parsed = load_parsed_metrics(input)
        .with_context(|| format!("Failed to load parsed metrics from {}", input.display()))?;
    let window = duration_seconds.unwrap_or(parsed.duration_seconds);

    let simulator = CostSimulator::from_config(&ctx.config);
    let started = Instant::now();
    let result = simulator
        .compare(&parsed.services, window)
        .with_context(|| format!("Failed to compare platforms over {} seconds", window))?;
    ctx.metrics
        .observe_pricing_duration(started.elapsed().as_secs_f64());

    for entry in &result.platforms {
        let key = entry.platform.report_key();
        ctx.metrics
            .set_platform_cost(key, as_f64(entry.result.total_cost));
        ctx.logger.log_platform_priced(
            key,
            as_f64(entry.result.total_cost),
            as_f64(entry.result.cost_per_hour),
        );
    }
    ctx.logger.log_comparison_completed(
        result.cheapest.report_key(),
        as_f64(result.cheapest_cost),
        result.services.len(),
    );

    write_json(output, &result)?;
    ctx.logger
        .log_stage_completed("compare", Some(&output.display().to_string()));

    match ctx.format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_comparison(&result, output),
    }

    Ok(())
}

fn print_comparison(result: &ComparisonResult, output: &Path) {
    print_success(&format!("Results exported to: {}", output.display()));
    println!();
    println!("{}", "Platform Cost Comparison".bold());
    println!("{}", "=".repeat(60));
    println!("Test Duration:     {}", format_duration(result.window_seconds));
    println!("Services:          {}", result.services.join(", "));
    println!();

    let rows: Vec<PlatformRow> = result
        .platforms
        .iter()
        .filter_map(|entry| {
            let delta = result.delta(entry.platform)?;
            Some(PlatformRow {
                platform: entry.platform.label().to_string(),
                total_cost: format_currency(entry.result.total_cost, 4),
                cost_per_hour: format_currency(entry.result.cost_per_hour, 4),
                monthly: format_currency(entry.monthly_projection.projected_monthly_cost, 2),
                annual: format_currency(entry.monthly_projection.projected_annual_cost, 2),
                delta: color_delta(delta.delta, format_currency(delta.delta, 4)),
                delta_pct: color_delta(delta.delta, format_percent(delta.delta_pct)),
            })
        })
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);

    println!();
    println!(
        "{} {} at {} for the test window",
        "Cheapest Platform:".bold(),
        result.cheapest.label().green().bold(),
        format_currency(result.cheapest_cost, 4).green()
    );
}
