//! Configuration file discovery for the CLI

use anyhow::{Context, Result};
use sim_lib::SimulatorConfig;
use std::path::{Path, PathBuf};

/// Resolve which config file to load, if any.
///
/// An explicit path always wins; otherwise the per-user file is used when it
/// exists.
pub fn config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path.to_path_buf());
    }

    let default = default_config_path()?;
    default.exists().then_some(default)
}

/// Per-user configuration file location
fn default_config_path() -> Option<PathBuf> {
    let home = dirs_next::home_dir()?;
    Some(home.join(".config").join("costsim").join("config.yaml"))
}

/// Load simulator configuration from file and environment
pub fn load(override_path: Option<&Path>) -> Result<SimulatorConfig> {
    let path = config_path(override_path);
    SimulatorConfig::load(path.as_deref()).with_context(|| match &path {
        Some(p) => format!("Failed to load configuration from {}", p.display()),
        None => "Failed to load configuration from environment".to_string(),
    })
}
