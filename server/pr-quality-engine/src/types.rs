//! Core types for the quality engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ExtractionError;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the data source sends)
// ---------------------------------------------------------------------------

/// One report request. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
  pub repo: String,
  /// `YYYY-MM-DD` (midnight UTC) or RFC3339.
  #[serde(default)]
  pub adoption_date: Option<String>,
  /// Reference time for the lookback window and `generated_at`.
  #[serde(default)]
  pub now: Option<String>,
  #[serde(default)]
  pub config: Option<Config>,
  #[serde(default)]
  pub pull_requests: Vec<InboundPullRequest>,
}

/// Counts are signed on the wire so negative values can be rejected with a
/// proper error instead of a serde failure that loses the PR number.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundPullRequest {
  pub number: u64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub additions: i64,
  #[serde(default)]
  pub deletions: i64,
  #[serde(default)]
  pub files_changed: i64,
  pub created_at: String,
  #[serde(default)]
  pub merged_at: Option<String>,
  #[serde(default)]
  pub reviews: Vec<InboundReview>,
  /// API return order; only the first `max_commits_check` are examined.
  #[serde(default)]
  pub commits: Vec<InboundCommit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundReview {
  pub state: String,
  /// `None` for reviews left by deleted accounts.
  #[serde(default)]
  pub author: Option<String>,
  /// `None` for pending (unsubmitted) reviews.
  #[serde(default)]
  pub submitted_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundCommit {
  pub sha: String,
  #[serde(default)]
  pub additions: i64,
  #[serde(default)]
  pub deletions: i64,
  #[serde(default)]
  pub committed_at: Option<String>,
  #[serde(default)]
  pub ci: InboundCiEvidence,
}

/// CI evidence gathered by the data source for one commit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundCiEvidence {
  #[serde(default)]
  pub check_runs: Vec<InboundCheckRun>,
  #[serde(default)]
  pub status_state: Option<String>,
  /// Fetch failures for this commit's check runs or status.
  #[serde(default)]
  pub errors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundCheckRun {
  #[serde(default)]
  pub name: String,
  /// `None` while the run is still in progress.
  #[serde(default)]
  pub conclusion: Option<String>,
}

// ---------------------------------------------------------------------------
// Enums (normalized)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewState {
  Approved,
  ChangesRequested,
  Commented,
  Dismissed,
  Pending,
}

impl ReviewState {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "approved" => Some(Self::Approved),
      "changes_requested" => Some(Self::ChangesRequested),
      "commented" => Some(Self::Commented),
      "dismissed" => Some(Self::Dismissed),
      "pending" => Some(Self::Pending),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckConclusion {
  Success,
  Failure,
  Neutral,
  Cancelled,
  Skipped,
  TimedOut,
  ActionRequired,
  Stale,
}

impl CheckConclusion {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "success" => Some(Self::Success),
      "failure" => Some(Self::Failure),
      "neutral" => Some(Self::Neutral),
      "cancelled" => Some(Self::Cancelled),
      "skipped" => Some(Self::Skipped),
      "timed_out" => Some(Self::TimedOut),
      "action_required" => Some(Self::ActionRequired),
      "stale" => Some(Self::Stale),
      _ => None,
    }
  }

  pub fn is_failure(self) -> bool {
    matches!(
      self,
      Self::Failure | Self::Cancelled | Self::TimedOut | Self::ActionRequired
    )
  }
}

/// Legacy combined commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusState {
  Error,
  Failure,
  Pending,
  Success,
}

impl StatusState {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "error" => Some(Self::Error),
      "failure" => Some(Self::Failure),
      "pending" => Some(Self::Pending),
      "success" => Some(Self::Success),
      _ => None,
    }
  }

  pub fn is_failure(self) -> bool {
    matches!(self, Self::Error | Self::Failure)
  }
}

/// CI verdict for a commit or a whole PR. `Unknown` means evidence could not
/// be fetched (or there was nothing to examine) and no failure was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CiOutcome {
  Passed,
  Failed,
  Unknown,
}

impl CiOutcome {
  pub fn is_failed(self) -> bool {
    self == Self::Failed
  }
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

/// Canonical PR after normalization + validation.
#[derive(Debug, Clone)]
pub struct PullRequest {
  pub number: u64,
  pub title: String,
  pub url: String,
  pub author: String,
  pub additions: u64,
  pub deletions: u64,
  pub files_changed: u64,
  pub created_at: DateTime<Utc>,
  pub merged_at: Option<DateTime<Utc>>,
  pub reviews: Vec<Review>,
  pub commits: Vec<Commit>,
}

#[derive(Debug, Clone)]
pub struct Review {
  pub state: ReviewState,
  pub author: Option<String>,
  pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Commit {
  pub sha: String,
  pub additions: u64,
  pub deletions: u64,
  pub committed_at: Option<DateTime<Utc>>,
  pub ci: CiEvidence,
}

impl Commit {
  /// Lines touched, widened so sums over many commits cannot overflow.
  pub fn changes(&self) -> u128 {
    u128::from(self.additions) + u128::from(self.deletions)
  }
}

#[derive(Debug, Clone, Default)]
pub struct CiEvidence {
  /// Completed check-run conclusions (in-progress runs are dropped).
  pub conclusions: Vec<CheckConclusion>,
  pub status: Option<StatusState>,
  pub fetch_errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Metrics + scoring
// ---------------------------------------------------------------------------

/// Normalized per-PR signals. Absent signals stay `None`; what they cost is
/// decided once, in [`crate::config::Fallbacks`].
#[derive(Debug, Clone, PartialEq)]
pub struct PrMetrics {
  pub additions: u64,
  pub deletions: u64,
  pub files_changed: u64,
  pub review_rounds: u32,
  /// In [0,1]; `None` only when there were no commits to examine.
  pub churn_ratio: Option<f64>,
  pub time_to_first_review_hours: Option<f64>,
  pub time_to_merge_hours: Option<f64>,
  pub ci: CiOutcome,
  pub commits_examined: usize,
  /// More commits existed than the examination cap allowed.
  pub commits_truncated: bool,
}

impl PrMetrics {
  pub fn size(&self) -> u64 {
    self.additions.saturating_add(self.deletions)
  }

  pub fn ci_failed(&self) -> bool {
    self.ci.is_failed()
  }
}

/// Normalized [0,1] risk per dimension, before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskComponents {
  pub size_risk: f64,
  pub files_risk: f64,
  pub review_rounds_risk: f64,
  pub churn_risk: f64,
  pub time_to_first_review_risk: f64,
  pub time_to_merge_risk: f64,
  pub ci_risk: f64,
}

impl RiskComponents {
  /// Components as (name, value) pairs in a fixed order.
  pub fn named(&self) -> [(&'static str, f64); 7] {
    [
      ("size_risk", self.size_risk),
      ("files_risk", self.files_risk),
      ("review_rounds_risk", self.review_rounds_risk),
      ("churn_risk", self.churn_risk),
      ("time_to_first_review_risk", self.time_to_first_review_risk),
      ("time_to_merge_risk", self.time_to_merge_risk),
      ("ci_risk", self.ci_risk),
    ]
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPr {
  pub number: u64,
  pub title: String,
  pub url: String,
  pub author: String,
  pub merged_at: Option<DateTime<Utc>>,
  pub metrics: PrMetrics,
  /// In [0,100]; higher is healthier.
  pub score: f64,
  pub components: RiskComponents,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// PRs merged in one ISO week. Only built for weeks with at least one PR.
#[derive(Debug, Clone)]
pub struct WeeklyBucket<'a> {
  pub week: String,
  pub prs: Vec<&'a ScoredPr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyStats {
  pub week: String,
  pub median_score: Option<f64>,
  pub p25_score: Option<f64>,
  pub p75_score: Option<f64>,
  pub pct_below_threshold: f64,
  pub ci_fail_rate: f64,
  pub median_churn: Option<f64>,
  pub median_size: Option<f64>,
  pub median_review_rounds: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaFormat {
  /// One decimal place: `82.5`.
  Fixed1,
  /// Fraction shown as a percentage with one decimal: `12.5%`.
  Percent1,
}

/// Numeric before/after comparison; formatting happens in [`DeltaRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaValue {
  pub label: &'static str,
  pub before: Option<f64>,
  pub after: Option<f64>,
  pub delta: Option<f64>,
  pub format: DeltaFormat,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what the renderer consumes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaRecord {
  pub label: String,
  pub before: Option<String>,
  pub after: Option<String>,
  pub delta: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrRecord {
  pub number: u64,
  pub title: String,
  pub url: String,
  pub author: String,
  pub score: f64,
  pub ci_failed: bool,
  pub additions: u64,
  pub deletions: u64,
  pub files_changed: u64,
  pub review_rounds: u32,
  pub churn_ratio: Option<f64>,
  pub time_to_first_review_hours: Option<f64>,
  pub time_to_merge_hours: Option<f64>,
  pub merged_at: Option<String>,
  pub size: u64,
}

/// The renderer's sole input. Field names and nesting are a compatibility
/// surface; do not rename.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPayload {
  pub repo: String,
  pub generated_at: String,
  pub adoption_date: Option<String>,
  pub prs: Vec<PrRecord>,
  pub weekly: Vec<WeeklyStats>,
  pub score_threshold: u32,
  pub deltas: Vec<DeltaRecord>,
}

/// Payload plus the PRs that could not be extracted.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
  pub payload: DashboardPayload,
  pub failures: Vec<ExtractionError>,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for rejected requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
