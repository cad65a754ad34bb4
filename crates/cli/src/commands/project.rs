//! `project`: extrapolate an hourly cost to a month and a year

use anyhow::{Context, Result};
use colored::Colorize;
use rust_decimal::Decimal;

use super::RunContext;
use crate::output::{format_currency, print_json, print_warning, OutputFormat};
use sim_lib::{project_monthly, MonthlyProjection, ProjectionParams};

/// Overrides for the configured traffic model
#[derive(Debug, Default, Clone)]
pub struct ProjectionOverrides {
    pub peak_hours: Option<u32>,
    pub off_peak_hours: Option<u32>,
    pub peak_multiplier: Option<Decimal>,
    pub days: Option<u32>,
}

impl ProjectionOverrides {
    fn apply(&self, base: &ProjectionParams) -> ProjectionParams {
        ProjectionParams {
            peak_hours_per_day: self.peak_hours.unwrap_or(base.peak_hours_per_day),
            off_peak_hours_per_day: self.off_peak_hours.unwrap_or(base.off_peak_hours_per_day),
            peak_multiplier: self.peak_multiplier.unwrap_or(base.peak_multiplier),
            days_per_month: self.days.unwrap_or(base.days_per_month),
        }
    }
}

pub fn run(ctx: &RunContext, hourly_cost: Decimal, overrides: &ProjectionOverrides) -> Result<()> {
    ctx.logger.log_stage_started("project", &hourly_cost.to_string());

    let params = overrides.apply(&ctx.config.projection);
    let projection = project_monthly(hourly_cost, &params)
        .with_context(|| format!("Failed to project an hourly cost of {}", hourly_cost))?;
    ctx.logger.log_stage_completed("project", None);

    match ctx.format {
        OutputFormat::Json => print_json(&projection)?,
        OutputFormat::Table => print_projection(&projection, params.days_per_month),
    }

    Ok(())
}

fn print_projection(projection: &MonthlyProjection, days_per_month: u32) {
    if projection.peak_hours_per_day + projection.off_peak_hours_per_day > 24 {
        print_warning("Peak and off-peak hours add up to more than 24 hours per day");
    }

    println!("{}", "Monthly Projection".bold());
    println!("{}", "=".repeat(50));
    println!(
        "Baseline:          {}/hour",
        format_currency(projection.hourly_cost_baseline, 4)
    );
    println!(
        "Traffic Model:     {}h peak at {}x, {}h off-peak, {} days",
        projection.peak_hours_per_day,
        projection.peak_multiplier.normalize(),
        projection.off_peak_hours_per_day,
        days_per_month
    );
    println!(
        "Average:           {}/hour",
        format_currency(projection.average_hourly_cost, 4)
    );
    println!();
    println!(
        "{} {}",
        "Monthly:          ".bold(),
        format_currency(projection.projected_monthly_cost, 2).green().bold()
    );
    println!(
        "{} {}",
        "Annual:           ".bold(),
        format_currency(projection.projected_annual_cost, 2).green()
    );
}
