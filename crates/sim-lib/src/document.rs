//! JSON document input/output for the simulation stages

use crate::error::{Result, SimError};
use crate::models::{ParsedMetrics, RawMetricsDocument};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Read and deserialize a JSON document
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| SimError::malformed(format!("{}: {}", path.display(), e)))
}

/// Serialize a document as pretty-printed JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| SimError::malformed(format!("failed to serialize document: {}", e)))?;
    std::fs::write(path, content).map_err(|e| SimError::io(path, e))?;
    debug!(path = %path.display(), "Wrote document");
    Ok(())
}

/// Load a raw sampler document
pub fn load_raw_metrics(path: &Path) -> Result<RawMetricsDocument> {
    read_json(path)
}

/// Load an aggregator output document
pub fn load_parsed_metrics(path: &Path) -> Result<ParsedMetrics> {
    read_json(path)
}
