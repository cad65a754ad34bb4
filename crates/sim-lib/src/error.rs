//! Error types for the cost simulator
//!
//! Aggregation and pricing errors are input or programming errors: they are
//! never retried and no partial result is produced when one is returned.

use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias used throughout the simulator
pub type Result<T> = std::result::Result<T, SimError>;

/// Error conditions raised by the simulation stages
#[derive(Error, Debug)]
pub enum SimError {
    /// Input document is missing a required field or is not valid JSON.
    ///
    /// Per-sample problems (such as a missing service id) never produce this
    /// error; those samples are skipped during aggregation.
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    /// Platform identifier not present in the pricing registry
    #[error(
        "Unknown platform '{platform}'. Supported: consumption-serverless, per-container, cluster-spot, cluster-on-demand"
    )]
    UnknownPlatform { platform: String },

    /// A per-hour figure was requested for a zero-length window
    #[error("Division by zero: {context}")]
    DivisionByZero { context: &'static str },

    /// Input file could not be read or output file could not be written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl SimError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// A computed quantity left the representable decimal range
    pub fn overflow(quantity: &str) -> Self {
        Self::malformed(format!("{} exceeds the supported numeric range", quantity))
    }
}

pub(crate) fn checked_mul(lhs: Decimal, rhs: Decimal, quantity: &str) -> Result<Decimal> {
    lhs.checked_mul(rhs).ok_or_else(|| SimError::overflow(quantity))
}

pub(crate) fn checked_add(lhs: Decimal, rhs: Decimal, quantity: &str) -> Result<Decimal> {
    lhs.checked_add(rhs).ok_or_else(|| SimError::overflow(quantity))
}

pub(crate) fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    quantity: &str,
) -> Result<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| checked_add(acc, value, quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_platform_message_lists_supported_ids() {
        let err = SimError::UnknownPlatform {
            platform: "gke".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'gke'"));
        assert!(message.contains("cluster-on-demand"));
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = SimError::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("/tmp/missing.json"));
    }

    #[test]
    fn test_checked_helpers_report_overflow() {
        let err = checked_mul(Decimal::MAX, Decimal::from(2), "vCPU-seconds").unwrap_err();
        match err {
            SimError::MalformedInput { message } => assert!(message.contains("vCPU-seconds")),
            other => panic!("unexpected error: {other}"),
        }

        assert!(checked_add(Decimal::MAX, Decimal::ONE, "total cost").is_err());
        assert_eq!(
            checked_sum([Decimal::ONE, Decimal::new(5, 1)], "total cost").unwrap(),
            Decimal::new(15, 1)
        );
    }
}
