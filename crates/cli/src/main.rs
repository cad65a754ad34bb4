//! Container Cost Simulator CLI
//!
//! A command-line tool for aggregating container utilization samples and
//! comparing what the same workload would cost on each hosting platform.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sim_lib::{SimulationMetrics, StructuredLogger};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::project::ProjectionOverrides;
use commands::RunContext;

/// Container Cost Simulator CLI
#[derive(Parser)]
#[command(name = "costsim")]
#[command(author, version, about = "Compare container hosting costs across platforms", long_about = None)]
pub struct Cli {
    /// Configuration file (can also be set via COSTSIM_CONFIG env var)
    #[arg(long, env = "COSTSIM_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Write Prometheus metrics to this file when the command finishes
    #[arg(long, global = true)]
    pub metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate raw utilization samples into per-service usage
    ParseMetrics {
        /// Raw metrics document written by the sampler
        input: PathBuf,

        /// Parsed metrics output file
        #[arg(default_value = "parsed-metrics.json")]
        output: PathBuf,
    },

    /// Price parsed usage on every platform and rank the results
    Compare {
        /// Parsed metrics document
        input: PathBuf,

        /// Test window in seconds (defaults to the document's duration)
        duration_seconds: Option<Decimal>,

        /// Comparison output file
        #[arg(default_value = "comparison-results.json")]
        output: PathBuf,
    },

    /// Price parsed usage on a single platform
    Price {
        /// Parsed metrics document
        input: PathBuf,

        /// Platform id (aca, aci, aks-spot, aks-ondemand)
        platform: String,

        /// Test window in seconds (defaults to the document's duration)
        duration_seconds: Option<Decimal>,

        /// Cost output file (defaults to <platform>-cost.json)
        output: Option<PathBuf>,

        /// Spot discount fraction for cluster platforms, e.g. 0.7
        #[arg(long)]
        discount: Option<Decimal>,
    },

    /// Project an hourly cost to monthly and annual cost
    Project {
        /// Baseline cost per hour
        hourly_cost: Decimal,

        /// Peak traffic hours per day
        #[arg(long)]
        peak_hours: Option<u32>,

        /// Off-peak traffic hours per day
        #[arg(long)]
        off_peak_hours: Option<u32>,

        /// Cost multiplier during peak hours
        #[arg(long)]
        peak_multiplier: Option<Decimal>,

        /// Days per month
        #[arg(long)]
        days: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    if let Err(e) = run(cli) {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for `--format json`
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = RunContext {
        config: config::load(cli.config.as_deref())?,
        format: cli.format,
        metrics: SimulationMetrics::new(),
        logger: StructuredLogger::new(format!(
            "costsim-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f")
        )),
    };

    match cli.command {
        Commands::ParseMetrics { input, output } => commands::parse::run(&ctx, &input, &output)?,
        Commands::Compare {
            input,
            duration_seconds,
            output,
        } => commands::compare::run(&ctx, &input, duration_seconds, &output)?,
        Commands::Price {
            input,
            platform,
            duration_seconds,
            output,
            discount,
        } => commands::price::run(
            &ctx,
            &input,
            &platform,
            duration_seconds,
            output.as_deref(),
            discount,
        )?,
        Commands::Project {
            hourly_cost,
            peak_hours,
            off_peak_hours,
            peak_multiplier,
            days,
        } => {
            let overrides = ProjectionOverrides {
                peak_hours,
                off_peak_hours,
                peak_multiplier,
                days,
            };
            commands::project::run(&ctx, hourly_cost, &overrides)?
        }
    }

    if let Some(path) = &cli.metrics_file {
        write_metrics(&ctx.metrics, path)?;
    }

    Ok(())
}

fn write_metrics(metrics: &SimulationMetrics, path: &Path) -> Result<()> {
    std::fs::write(path, metrics.render())
        .with_context(|| format!("Failed to write metrics to {}", path.display()))
}
