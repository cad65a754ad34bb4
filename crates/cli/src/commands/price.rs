//! `price`: price parsed usage on a single platform

use anyhow::{Context, Result};
use colored::Colorize;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tabled::Tabled;

use super::{as_f64, RunContext};
use crate::output::{
    format_currency, format_duration, print_json, print_success, print_warning, OutputFormat,
};
use sim_lib::document::{load_parsed_metrics, write_json};
use sim_lib::{CostSimulator, Platform, PlatformComparison, PricingOptions};

/// Row for the per-service cost table
#[derive(Tabled)]
struct ServiceCostRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Billed vCPU-s")]
    vcpu_seconds: String,
    #[tabled(rename = "Billed GB-s")]
    memory_gb_seconds: String,
    #[tabled(rename = "vCPU")]
    vcpu_cost: String,
    #[tabled(rename = "Memory")]
    memory_cost: String,
    #[tabled(rename = "Add-ons")]
    additional_cost: String,
    #[tabled(rename = "Total")]
    total_cost: String,
}

pub fn run(
    ctx: &RunContext,
    input: &Path,
    platform_id: &str,
    duration_seconds: Option<Decimal>,
    output: Option<&Path>,
    discount: Option<Decimal>,
) -> Result<()> {
    ctx.logger.log_stage_started("price", &input.display().to_string());

    let platform: Platform = platform_id.parse()?;
    if let Some(message) = ignored_discount_warning(platform, discount) {
        print_warning(&message);
    }
    let parsed = load_parsed_metrics(input)
        .with_context(|| format!("Failed to load parsed metrics from {}", input.display()))?;
    let window = duration_seconds.unwrap_or(parsed.duration_seconds);

    let mut options = PricingOptions::default();
    if let Some(discount) = discount {
        options = options.with_discount(discount);
    }
    let simulator = CostSimulator::from_config(&ctx.config).with_options(options);

    let started = Instant::now();
    let result = simulator
        .price_platform(platform, &parsed.services, window)
        .with_context(|| format!("Failed to price {} over {} seconds", platform, window))?;
    ctx.metrics
        .observe_pricing_duration(started.elapsed().as_secs_f64());
    ctx.metrics
        .set_platform_cost(platform.report_key(), as_f64(result.total_cost));
    ctx.logger.log_platform_priced(
        platform.report_key(),
        as_f64(result.total_cost),
        as_f64(result.cost_per_hour),
    );

    let monthly_projection = simulator
        .project_monthly(result.cost_per_hour)
        .context("Failed to project monthly cost")?;
    let priced = PlatformComparison {
        platform,
        result,
        monthly_projection,
    };

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}-cost.json", platform.report_key())));
    write_json(&output, &priced)?;
    ctx.logger
        .log_stage_completed("price", Some(&output.display().to_string()));

    match ctx.format {
        OutputFormat::Json => print_json(&priced)?,
        OutputFormat::Table => print_breakdown(&priced, &output),
    }

    Ok(())
}

/// Discounts only apply to cluster capacity
fn ignored_discount_warning(platform: Platform, discount: Option<Decimal>) -> Option<String> {
    match discount {
        Some(discount) if !platform.is_cluster() => Some(format!(
            "--discount {} ignored: {} has no discounted capacity",
            discount,
            platform.label()
        )),
        _ => None,
    }
}

fn print_breakdown(priced: &PlatformComparison, output: &Path) {
    let result = &priced.result;

    print_success(&format!("Results exported to: {}", output.display()));
    println!();
    println!("{}", result.name.bold());
    println!("{}", "=".repeat(60));
    println!("Test Duration:     {}", format_duration(result.duration_seconds));
    println!();

    let rows: Vec<ServiceCostRow> = result
        .service_costs
        .iter()
        .map(|cost| ServiceCostRow {
            service: cost.service.clone(),
            vcpu_seconds: format!("{:.2}", cost.vcpu_seconds.round_dp(2)),
            memory_gb_seconds: format!("{:.2}", cost.memory_gb_seconds.round_dp(2)),
            vcpu_cost: format_currency(cost.vcpu_cost, 4),
            memory_cost: format_currency(cost.memory_cost, 4),
            additional_cost: format_currency(cost.additional_cost, 4),
            total_cost: format_currency(cost.total_cost, 4),
        })
        .collect();

    if !rows.is_empty() {
        let table = tabled::Table::new(rows)
            .with(tabled::settings::Style::rounded())
            .to_string();
        println!("{}", table);
        println!();
    }

    if let Some(control_plane) = result.control_plane_cost {
        println!("Control Plane:     {}", format_currency(control_plane, 4));
    }
    if let Some(node_overhead) = result.node_overhead_cost {
        println!("Node Overhead:     {}", format_currency(node_overhead, 4));
    }

    println!(
        "{} {}",
        "Total Cost:       ".bold(),
        format_currency(result.total_cost, 4).green().bold()
    );
    println!("Cost per Hour:     {}", format_currency(result.cost_per_hour, 4));
    println!(
        "Projected Monthly: {}",
        format_currency(priced.monthly_projection.projected_monthly_cost, 2)
    );
    println!(
        "Projected Annual:  {}",
        format_currency(priced.monthly_projection.projected_annual_cost, 2)
    );
}
