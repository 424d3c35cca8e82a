//! Binary entrypoint: read one ReportRequest JSON from stdin, write one JSON
//! object to stdout.
//!
//! Output is either:
//! - A ReportOutcome (`{"payload": ..., "failures": [...]}`)
//! - An ErrorOutput (when the request itself is invalid), with exit code 1
//!
//! Logs go to stderr; set RUST_LOG to adjust verbosity.

use chrono::Utc;
use pr_quality_engine::types::ErrorOutput;
use pr_quality_engine::{run, EngineError, ReportRequest};
use std::io::{self, Read, Write};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
  init_logging();

  if let Err(e) = run_binary() {
    error!("request rejected: {}", e);
    let err = match &e {
      EngineError::Validation { field, reason } => {
        ErrorOutput::new(reason.clone()).with_field(field.clone())
      }
      _ => ErrorOutput::new(e.to_string()),
    };
    let mut out = io::stdout().lock();
    let _ = serde_json::to_writer(&mut out, &err);
    let _ = writeln!(out);
    std::process::exit(1);
  }
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .init();
}

fn run_binary() -> Result<(), EngineError> {
  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;
  let request: ReportRequest = serde_json::from_str(&raw)?;

  let outcome = run(&request, Utc::now())?;
  info!(
    repo = %outcome.payload.repo,
    scored = outcome.payload.prs.len(),
    failed = outcome.failures.len(),
    weeks = outcome.payload.weekly.len(),
    "report built"
  );

  let json = serde_json::to_vec(&outcome)?;
  let mut out = io::stdout().lock();
  out.write_all(&json)?;
  writeln!(out)?;
  Ok(())
}
