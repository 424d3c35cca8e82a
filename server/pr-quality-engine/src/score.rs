//! Composite score: normalized risk components, weighted, mapped to 0–100.

use crate::config::{Config, Fallbacks, RiskWeights};
use crate::types::{CiOutcome, PrMetrics, RiskComponents};

/// Lines changed at which size risk saturates.
const SIZE_SATURATION: f64 = 2000.0;
const FILES_SATURATION: f64 = 50.0;
const ROUNDS_SATURATION: f64 = 3.0;
const CHURN_SATURATION: f64 = 0.5;
const FIRST_REVIEW_SATURATION_HOURS: f64 = 72.0;
const MERGE_SATURATION_HOURS: f64 = 240.0;

/// Stateless scorer over a validated weight table.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
  weights: RiskWeights,
  fallbacks: Fallbacks,
}

impl Scorer {
  pub fn new(weights: RiskWeights, fallbacks: Fallbacks) -> Self {
    Self { weights, fallbacks }
  }

  pub fn from_config(config: &Config) -> Self {
    Self::new(config.weights, config.fallbacks)
  }

  /// Normalize each signal to [0,1]; higher is worse.
  pub fn components(&self, m: &PrMetrics) -> RiskComponents {
    let fb = &self.fallbacks;
    RiskComponents {
      size_risk: ratio((m.size() as f64).ln_1p(), SIZE_SATURATION.ln_1p()),
      files_risk: ratio(m.files_changed as f64, FILES_SATURATION),
      review_rounds_risk: ratio(m.review_rounds as f64, ROUNDS_SATURATION),
      churn_risk: m
        .churn_ratio
        .map(|c| ratio(c, CHURN_SATURATION))
        .unwrap_or_else(|| fb.missing_churn.risk()),
      time_to_first_review_risk: m
        .time_to_first_review_hours
        .map(|h| ratio(h, FIRST_REVIEW_SATURATION_HOURS))
        .unwrap_or(fb.missing_first_review_risk),
      time_to_merge_risk: m
        .time_to_merge_hours
        .map(|h| ratio(h, MERGE_SATURATION_HOURS))
        .unwrap_or(fb.missing_merge_risk),
      ci_risk: match m.ci {
        CiOutcome::Failed => 1.0,
        CiOutcome::Passed => 0.0,
        CiOutcome::Unknown => fb.unknown_ci_risk,
      },
    }
  }

  /// Weighted risk in [0,1].
  pub fn risk(&self, c: &RiskComponents) -> f64 {
    let w = &self.weights;
    c.size_risk * w.size()
      + c.files_risk * w.files()
      + c.review_rounds_risk * w.review_rounds()
      + c.churn_risk * w.churn()
      + c.time_to_first_review_risk * w.time_to_first_review()
      + c.time_to_merge_risk * w.time_to_merge()
      + c.ci_risk * w.ci()
  }

  /// Score 0–100 (higher is healthier) plus the component breakdown.
  pub fn score(&self, m: &PrMetrics) -> (f64, RiskComponents) {
    let components = self.components(m);
    let score = (100.0 * (1.0 - self.risk(&components))).clamp(0.0, 100.0);
    (score, components)
  }
}

impl Default for Scorer {
  fn default() -> Self {
    Self::new(RiskWeights::default(), Fallbacks::default())
  }
}

/// `value / saturation`, clamped to [0,1].
fn ratio(value: f64, saturation: f64) -> f64 {
  (value / saturation).clamp(0.0, 1.0)
}
