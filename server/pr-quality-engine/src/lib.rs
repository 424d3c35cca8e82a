//! PR Quality Scoring Engine — deterministic, rule-based.
//!
//! Turns raw pull-request activity (metadata, reviews, commits, CI evidence)
//! into per-PR quality scores, weekly trend stats, and a before/after
//! adoption comparison, emitted as one dashboard payload.
//!
//! No DB, no network, no wall clock; the caller injects "now".

pub mod config;
pub mod delta;
pub mod engine;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod score;
pub mod stats;
pub mod types;
pub mod weekly;

use chrono::{DateTime, Utc};

pub use config::{ChurnFallback, Config, Fallbacks, RiskWeights};
pub use engine::Engine;
pub use error::{EngineError, ExtractionError};
pub use score::Scorer;
pub use types::{DashboardPayload, InboundPullRequest, ReportOutcome, ReportRequest};

/// Run a full request with its embedded config (no I/O).
///
/// `default_now` is used only when the request carries no `now` of its own.
pub fn run(request: &ReportRequest, default_now: DateTime<Utc>) -> Result<ReportOutcome, EngineError> {
  let engine = Engine::new(request.config.clone().unwrap_or_default())?;
  let now = match &request.now {
    Some(s) => normalize::parse_rfc3339(s).map_err(|e| EngineError::validation("now", &e))?,
    None => default_now,
  };
  engine.run(request, now)
}
