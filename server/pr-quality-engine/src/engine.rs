//! Core engine: normalizes, extracts, scores, and aggregates one report.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::Config;
use crate::delta;
use crate::error::{EngineError, ExtractionError};
use crate::extract;
use crate::normalize;
use crate::score::Scorer;
use crate::types::*;
use crate::weekly;

/// Display format for `generated_at`.
const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// The PR quality pipeline. Stateless between runs.
pub struct Engine {
  config: Config,
  scorer: Scorer,
}

impl Engine {
  pub fn new(config: Config) -> Result<Self, EngineError> {
    config.validate()?;
    let scorer = Scorer::from_config(&config);
    Ok(Self { config, scorer })
  }

  pub fn with_defaults() -> Self {
    let config = Config::default();
    let scorer = Scorer::from_config(&config);
    Self { config, scorer }
  }

  /// Extract and score one inbound PR.
  pub fn score_pr(&self, raw: &InboundPullRequest) -> Result<ScoredPr, ExtractionError> {
    let pr = normalize::normalize(raw)?;
    let metrics = extract::extract(&pr, self.config.max_commits_check)?;
    if metrics.commits_truncated {
      warn!(
        pr = pr.number,
        examined = metrics.commits_examined,
        total = pr.commits.len(),
        "commit window truncated; churn and CI may be undercounted"
      );
    }
    let (score, components) = self.scorer.score(&metrics);
    debug!(pr = pr.number, score, ci = ?metrics.ci, "scored");

    Ok(ScoredPr {
      number: pr.number,
      title: pr.title,
      url: pr.url,
      author: pr.author,
      merged_at: pr.merged_at,
      metrics,
      score,
      components,
    })
  }

  /// Score every PR, keeping going past bad records.
  pub fn score_all(&self, raws: &[InboundPullRequest]) -> (Vec<ScoredPr>, Vec<ExtractionError>) {
    let mut scored = Vec::with_capacity(raws.len());
    let mut failures = Vec::new();
    for raw in raws {
      match self.score_pr(raw) {
        Ok(pr) => scored.push(pr),
        Err(e) => {
          warn!(pr = e.pr_number, field = %e.field, reason = %e.reason, "extraction failed");
          failures.push(e);
        }
      }
    }
    (scored, failures)
  }

  /// Build the dashboard payload for a request. `now` is the only clock.
  ///
  /// Returns `Err` only for request-level problems; per-PR failures are
  /// reported in `ReportOutcome::failures`.
  pub fn run(&self, request: &ReportRequest, now: DateTime<Utc>) -> Result<ReportOutcome, EngineError> {
    if request.repo.trim().is_empty() {
      return Err(EngineError::validation("repo", "must not be empty"));
    }
    let adoption = match &request.adoption_date {
      Some(s) => Some(normalize::parse_adoption_date(s)?),
      None => None,
    };

    let (mut scored, failures) = self.score_all(&request.pull_requests);
    order_for_display(&mut scored);
    scored.truncate(self.config.max_prs);

    let weekly = weekly::build_weekly(
      &scored,
      now,
      self.config.months,
      self.config.score_threshold,
    );
    let deltas = delta::render(&delta::build_deltas(&scored, adoption));

    let payload = DashboardPayload {
      repo: request.repo.clone(),
      generated_at: now.format(GENERATED_AT_FORMAT).to_string(),
      adoption_date: request.adoption_date.clone(),
      prs: scored.iter().map(pr_record).collect(),
      weekly,
      score_threshold: self.config.score_threshold,
      deltas,
    };
    Ok(ReportOutcome { payload, failures })
  }
}

/// Most recently merged first; unmerged PRs trail in input order.
fn order_for_display(prs: &mut [ScoredPr]) {
  prs.sort_by(|a, b| b.merged_at.cmp(&a.merged_at));
}

fn pr_record(pr: &ScoredPr) -> PrRecord {
  let m = &pr.metrics;
  PrRecord {
    number: pr.number,
    title: pr.title.clone(),
    url: pr.url.clone(),
    author: pr.author.clone(),
    score: pr.score,
    ci_failed: m.ci_failed(),
    additions: m.additions,
    deletions: m.deletions,
    files_changed: m.files_changed,
    review_rounds: m.review_rounds,
    churn_ratio: m.churn_ratio,
    time_to_first_review_hours: m.time_to_first_review_hours,
    time_to_merge_hours: m.time_to_merge_hours,
    merged_at: pr.merged_at.map(|t| t.to_rfc3339()),
    size: m.size(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn make_inbound(number: u64, merged_at: Option<&str>) -> InboundPullRequest {
    InboundPullRequest {
      number,
      title: format!("Change {}", number),
      url: format!("https://github.com/acme/api/pull/{}", number),
      author: Some("alice".into()),
      additions: 40,
      deletions: 10,
      files_changed: 2,
      created_at: "2024-03-01T09:00:00Z".into(),
      merged_at: merged_at.map(String::from),
      reviews: vec![InboundReview {
        state: "APPROVED".into(),
        author: Some("bob".into()),
        submitted_at: Some("2024-03-01T11:00:00Z".into()),
      }],
      commits: vec![InboundCommit {
        sha: "abc".into(),
        additions: 40,
        deletions: 10,
        committed_at: Some("2024-03-01T08:00:00Z".into()),
        ci: InboundCiEvidence::default(),
      }],
    }
  }

  fn request(prs: Vec<InboundPullRequest>) -> ReportRequest {
    ReportRequest {
      repo: "acme/api".into(),
      adoption_date: None,
      now: None,
      config: None,
      pull_requests: prs,
    }
  }

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 8, 30, 0).unwrap()
  }

  #[test]
  fn bad_pr_does_not_abort_run() {
    let mut bad = make_inbound(2, Some("2024-03-02T09:00:00Z"));
    bad.additions = -1;
    let req = request(vec![make_inbound(1, Some("2024-03-02T09:00:00Z")), bad]);
    let outcome = Engine::with_defaults().run(&req, now()).unwrap();
    assert_eq!(outcome.payload.prs.len(), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].pr_number, 2);
  }

  #[test]
  fn prs_ordered_by_merge_desc_then_unmerged() {
    let req = request(vec![
      make_inbound(1, Some("2024-03-02T09:00:00Z")),
      make_inbound(2, None),
      make_inbound(3, Some("2024-03-20T09:00:00Z")),
      make_inbound(4, None),
    ]);
    let outcome = Engine::with_defaults().run(&req, now()).unwrap();
    let numbers: Vec<u64> = outcome.payload.prs.iter().map(|p| p.number).collect();
    assert_eq!(numbers, [3, 1, 2, 4]);
  }

  #[test]
  fn max_prs_truncates_oldest() {
    let engine = Engine::new(Config {
      max_prs: 1,
      ..Config::default()
    })
    .unwrap();
    let req = request(vec![
      make_inbound(1, Some("2024-03-02T09:00:00Z")),
      make_inbound(3, Some("2024-03-20T09:00:00Z")),
    ]);
    let outcome = engine.run(&req, now()).unwrap();
    assert_eq!(outcome.payload.prs.len(), 1);
    assert_eq!(outcome.payload.prs[0].number, 3);
    assert_eq!(outcome.payload.weekly.len(), 1);
  }

  #[test]
  fn generated_at_uses_injected_now() {
    let outcome = Engine::with_defaults().run(&request(vec![]), now()).unwrap();
    assert_eq!(outcome.payload.generated_at, "2024-04-01 08:30 UTC");
    assert_eq!(outcome.payload.score_threshold, 70);
    assert_eq!(outcome.payload.deltas.len(), 4);
    assert!(outcome.payload.weekly.is_empty());
  }

  #[test]
  fn empty_repo_is_rejected() {
    let mut req = request(vec![]);
    req.repo = "  ".into();
    let err = Engine::with_defaults().run(&req, now()).unwrap_err();
    assert!(err.to_string().contains("repo"));
  }

  #[test]
  fn bad_adoption_date_is_rejected() {
    let mut req = request(vec![]);
    req.adoption_date = Some("last spring".into());
    let err = Engine::with_defaults().run(&req, now()).unwrap_err();
    assert!(err.to_string().contains("adoption_date"));
  }

  #[test]
  fn invalid_config_is_rejected_at_construction() {
    let cfg = Config {
      score_threshold: 250,
      ..Config::default()
    };
    assert!(Engine::new(cfg).is_err());
  }

  #[test]
  fn unmerged_pr_stays_out_of_aggregates() {
    let req = ReportRequest {
      adoption_date: Some("2024-03-10".into()),
      ..request(vec![make_inbound(1, None)])
    };
    let outcome = Engine::with_defaults().run(&req, now()).unwrap();
    assert_eq!(outcome.payload.prs.len(), 1);
    assert!(outcome.payload.weekly.is_empty());
    assert!(outcome.payload.deltas.iter().all(|d| d.before.is_none()));
  }
}
