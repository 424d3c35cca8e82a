//! Structured error types for the quality engine.

use serde::Serialize;
use thiserror::Error;

/// Request-level failures. These abort a run.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("config: {0}")]
  Config(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::Config(msg.into())
  }
}

/// A single PR could not be turned into metrics. Never aborts a run; collected
/// alongside the partial result set.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("pr #{pr_number}: {field}: {reason}")]
pub struct ExtractionError {
  pub pr_number: u64,
  pub field: String,
  pub reason: String,
}

impl ExtractionError {
  pub fn new(pr_number: u64, field: &str, reason: impl Into<String>) -> Self {
    Self {
      pr_number,
      field: field.to_string(),
      reason: reason.into(),
    }
  }
}
