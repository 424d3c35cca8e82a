//! Engine configuration with sane defaults.
//!
//! Every field can be overridden from the request's `config` object; omitted
//! fields keep their defaults. Weights are validated whenever they are built,
//! including on deserialization, so an invalid table never reaches scoring.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Tolerance when checking that the weight table sums to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Longest accepted lookback, in 30-day months (100 years).
pub const MAX_MONTHS: u32 = 1200;

/// Tunable knobs for extraction, aggregation, and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Max scored PRs kept in the payload (most recently merged first).
  #[serde(default = "default_max_prs")]
  pub max_prs: usize,
  /// Lookback window for weekly trends, in 30-day months.
  #[serde(default = "default_months")]
  pub months: u32,
  /// Scores strictly below this count toward `pct_below_threshold`.
  #[serde(default = "default_score_threshold")]
  pub score_threshold: u32,
  /// Commits examined per PR for churn and CI evidence (API order).
  #[serde(default = "default_max_commits_check")]
  pub max_commits_check: usize,
  #[serde(default)]
  pub weights: RiskWeights,
  #[serde(default)]
  pub fallbacks: Fallbacks,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      max_prs: default_max_prs(),
      months: default_months(),
      score_threshold: default_score_threshold(),
      max_commits_check: default_max_commits_check(),
      weights: RiskWeights::default(),
      fallbacks: Fallbacks::default(),
    }
  }
}

fn default_max_prs() -> usize {
  50
}

fn default_months() -> u32 {
  12
}

fn default_score_threshold() -> u32 {
  70
}

fn default_max_commits_check() -> usize {
  20
}

impl Config {
  /// Reject configurations that would produce out-of-range scores.
  pub fn validate(&self) -> Result<(), EngineError> {
    if self.score_threshold > 100 {
      return Err(EngineError::config(format!(
        "score_threshold must be within 0..=100, got {}",
        self.score_threshold
      )));
    }
    if self.months > MAX_MONTHS {
      return Err(EngineError::config(format!(
        "months must be at most {}, got {}",
        MAX_MONTHS, self.months
      )));
    }
    self.fallbacks.validate()
  }
}

// ---------------------------------------------------------------------------
// Risk weights
// ---------------------------------------------------------------------------

/// Immutable, validated weight table. Each weight is in [0,1] and the table
/// sums to 1.0. Fields are private so the only way in is through validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeightTable", into = "WeightTable")]
pub struct RiskWeights {
  size: f64,
  files: f64,
  review_rounds: f64,
  churn: f64,
  time_to_first_review: f64,
  time_to_merge: f64,
  ci: f64,
}

/// Wire form of [`RiskWeights`]; every field is required.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightTable {
  pub size: f64,
  pub files: f64,
  pub review_rounds: f64,
  pub churn: f64,
  pub time_to_first_review: f64,
  pub time_to_merge: f64,
  pub ci: f64,
}

impl Default for RiskWeights {
  fn default() -> Self {
    Self {
      size: 0.20,
      files: 0.10,
      review_rounds: 0.20,
      churn: 0.15,
      time_to_first_review: 0.10,
      time_to_merge: 0.15,
      ci: 0.10,
    }
  }
}

impl RiskWeights {
  pub fn new(table: WeightTable) -> Result<Self, EngineError> {
    Self::try_from(table)
  }

  pub fn size(&self) -> f64 {
    self.size
  }

  pub fn files(&self) -> f64 {
    self.files
  }

  pub fn review_rounds(&self) -> f64 {
    self.review_rounds
  }

  pub fn churn(&self) -> f64 {
    self.churn
  }

  pub fn time_to_first_review(&self) -> f64 {
    self.time_to_first_review
  }

  pub fn time_to_merge(&self) -> f64 {
    self.time_to_merge
  }

  pub fn ci(&self) -> f64 {
    self.ci
  }

  pub fn sum(&self) -> f64 {
    self.size
      + self.files
      + self.review_rounds
      + self.churn
      + self.time_to_first_review
      + self.time_to_merge
      + self.ci
  }
}

impl TryFrom<WeightTable> for RiskWeights {
  type Error = EngineError;

  fn try_from(t: WeightTable) -> Result<Self, Self::Error> {
    let named = [
      ("size", t.size),
      ("files", t.files),
      ("review_rounds", t.review_rounds),
      ("churn", t.churn),
      ("time_to_first_review", t.time_to_first_review),
      ("time_to_merge", t.time_to_merge),
      ("ci", t.ci),
    ];
    for (name, w) in named {
      if !w.is_finite() || !(0.0..=1.0).contains(&w) {
        return Err(EngineError::config(format!(
          "weight {} must be within [0,1], got {}",
          name, w
        )));
      }
    }
    let sum: f64 = named.iter().map(|(_, w)| w).sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
      return Err(EngineError::config(format!(
        "weights must sum to 1.0, got {}",
        sum
      )));
    }
    Ok(Self {
      size: t.size,
      files: t.files,
      review_rounds: t.review_rounds,
      churn: t.churn,
      time_to_first_review: t.time_to_first_review,
      time_to_merge: t.time_to_merge,
      ci: t.ci,
    })
  }
}

impl From<RiskWeights> for WeightTable {
  fn from(w: RiskWeights) -> Self {
    Self {
      size: w.size,
      files: w.files,
      review_rounds: w.review_rounds,
      churn: w.churn,
      time_to_first_review: w.time_to_first_review,
      time_to_merge: w.time_to_merge,
      ci: w.ci,
    }
  }
}

// ---------------------------------------------------------------------------
// Fallbacks for absent signals
// ---------------------------------------------------------------------------

/// The one place that says what an absent signal costs.
///
/// - No qualifying review: `missing_first_review_risk`.
/// - Not merged: `missing_merge_risk`.
/// - No commits to examine: `missing_churn`.
/// - CI evidence could not be fetched: `unknown_ci_risk`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fallbacks {
  #[serde(default = "default_neutral_risk")]
  pub missing_first_review_risk: f64,
  #[serde(default = "default_neutral_risk")]
  pub missing_merge_risk: f64,
  #[serde(default)]
  pub missing_churn: ChurnFallback,
  #[serde(default)]
  pub unknown_ci_risk: f64,
}

fn default_neutral_risk() -> f64 {
  0.5
}

impl Default for Fallbacks {
  fn default() -> Self {
    Self {
      missing_first_review_risk: default_neutral_risk(),
      missing_merge_risk: default_neutral_risk(),
      missing_churn: ChurnFallback::default(),
      unknown_ci_risk: 0.0,
    }
  }
}

impl Fallbacks {
  fn validate(&self) -> Result<(), EngineError> {
    let named = [
      ("missing_first_review_risk", self.missing_first_review_risk),
      ("missing_merge_risk", self.missing_merge_risk),
      ("unknown_ci_risk", self.unknown_ci_risk),
    ];
    for (name, r) in named {
      if !r.is_finite() || !(0.0..=1.0).contains(&r) {
        return Err(EngineError::config(format!(
          "fallback {} must be within [0,1], got {}",
          name, r
        )));
      }
    }
    Ok(())
  }
}

/// Churn risk charged when a PR has no commits to examine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnFallback {
  /// Treat as zero churn.
  #[default]
  Lenient,
  /// Treat as 0.5 risk, like the other unknown signals.
  Neutral,
}

impl ChurnFallback {
  pub fn risk(self) -> f64 {
    match self {
      Self::Lenient => 0.0,
      Self::Neutral => 0.5,
    }
  }
}
