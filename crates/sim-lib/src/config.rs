//! Simulator configuration
//!
//! Built-in pricing and projection defaults, optionally overridden by a
//! config file (YAML, JSON or TOML, by extension) and then by environment
//! variables prefixed with `COSTSIM_`, using `__` between nested keys:
//!
//! ```text
//! COSTSIM_PRICING__CLUSTER__ASSUMED_NODE_COUNT=3
//! COSTSIM_PROJECTION__PEAK_HOURS_PER_DAY=10
//! ```

use crate::compare::ProjectionParams;
use crate::error::Result;
use crate::pricing::PricingCatalog;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "COSTSIM";

/// Complete simulator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub pricing: PricingCatalog,
    #[serde(default)]
    pub projection: ProjectionParams,
}

impl SimulatorConfig {
    /// Load configuration from defaults, an optional file, and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&SimulatorConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
