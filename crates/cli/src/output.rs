//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    #[default]
    Table,
    /// JSON document on stdout
    Json,
}

/// Print a document as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message on stderr so JSON output stays parseable
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a dollar amount with `decimals` fractional digits
pub fn format_currency(amount: Decimal, decimals: usize) -> String {
    format!("${:.*}", decimals, amount.round_dp(decimals as u32))
}

/// Format a duration in seconds with its hour equivalent
pub fn format_duration(seconds: Decimal) -> String {
    let hours = seconds / Decimal::from(3600);
    format!("{} seconds ({:.2} hours)", seconds.normalize(), hours.round_dp(2))
}

/// Format a percentage with one fractional digit
pub fn format_percent(value: Decimal) -> String {
    format!("{:.1}%", value.round_dp(1))
}

/// Color a cost difference: zero is the cheapest option
pub fn color_delta(delta: Decimal, formatted: String) -> String {
    if delta.is_zero() {
        formatted.green().to_string()
    } else {
        formatted.yellow().to_string()
    }
}

/// Format a sample timestamp for display
pub fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.to_string()
    }
}
