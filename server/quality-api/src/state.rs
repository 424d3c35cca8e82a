//! Shared service state.

use std::path::Path;

use pr_quality_engine::{Config, EngineError};

/// Defaults applied to requests that carry no `config` of their own.
#[derive(Debug, Clone, Default)]
pub struct AppState {
  pub defaults: Config,
}

impl AppState {
  /// Load defaults from a JSON config file; omitted fields keep engine defaults.
  pub fn from_file(path: &Path) -> Result<Self, EngineError> {
    let raw = std::fs::read_to_string(path)?;
    let defaults: Config = serde_json::from_str(&raw)?;
    defaults.validate()?;
    Ok(Self { defaults })
  }
}
