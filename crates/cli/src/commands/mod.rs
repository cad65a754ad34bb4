//! Subcommand implementations

pub mod compare;
pub mod parse;
pub mod price;
pub mod project;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sim_lib::{SimulationMetrics, SimulatorConfig, StructuredLogger};

use crate::output::OutputFormat;

/// State shared by every subcommand of one invocation
pub struct RunContext {
    pub config: SimulatorConfig,
    pub format: OutputFormat,
    pub metrics: SimulationMetrics,
    pub logger: StructuredLogger,
}

/// Lossy conversion for metric gauges and log fields
pub(crate) fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
