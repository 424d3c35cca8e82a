//! Per-PR metric extraction: review rounds, first review, churn after review,
//! CI outcome, and latencies.

use chrono::{DateTime, Utc};

use crate::error::ExtractionError;
use crate::types::{CiOutcome, Commit, PrMetrics, PullRequest, Review, ReviewState};

/// Derive a metrics record from a normalized PR.
///
/// Only the first `max_commits_check` commits (API order) feed churn and CI.
pub fn extract(pr: &PullRequest, max_commits_check: usize) -> Result<PrMetrics, ExtractionError> {
  let first_review = first_review_time(&pr.reviews, &pr.author);
  let window = commit_window(&pr.commits, max_commits_check);

  let time_to_first_review_hours = match first_review {
    Some(t) if t < pr.created_at => {
      return Err(ExtractionError::new(
        pr.number,
        "reviews",
        "first review precedes created_at",
      ));
    }
    Some(t) => Some(hours_between(pr.created_at, t)),
    None => None,
  };
  let time_to_merge_hours = pr.merged_at.map(|m| hours_between(pr.created_at, m));

  Ok(PrMetrics {
    additions: pr.additions,
    deletions: pr.deletions,
    files_changed: pr.files_changed,
    review_rounds: review_rounds(&pr.reviews),
    churn_ratio: churn_ratio(window, first_review),
    time_to_first_review_hours,
    time_to_merge_hours,
    ci: ci_outcome(window),
    commits_examined: window.len(),
    commits_truncated: pr.commits.len() > window.len(),
  })
}

/// Each "changes requested" review is one round, whatever its position.
pub fn review_rounds(reviews: &[Review]) -> u32 {
  reviews
    .iter()
    .filter(|r| r.state == ReviewState::ChangesRequested)
    .count() as u32
}

/// Earliest submitted review by someone other than the PR author.
pub fn first_review_time(reviews: &[Review], author: &str) -> Option<DateTime<Utc>> {
  reviews
    .iter()
    .filter(|r| r.author.as_deref() != Some(author))
    .filter_map(|r| r.submitted_at)
    .min()
}

/// The examined prefix of the commit list.
pub fn commit_window(commits: &[Commit], max_commits_check: usize) -> &[Commit] {
  &commits[..commits.len().min(max_commits_check)]
}

/// Share of examined line changes committed strictly after the first review.
///
/// `None` when there are no commits; `Some(0.0)` when they changed no lines.
pub fn churn_ratio(window: &[Commit], first_review: Option<DateTime<Utc>>) -> Option<f64> {
  if window.is_empty() {
    return None;
  }

  let mut total: u128 = 0;
  let mut after_review: u128 = 0;
  for commit in window {
    let changes = commit.changes();
    total += changes;
    if let (Some(reviewed), Some(committed)) = (first_review, commit.committed_at) {
      if committed > reviewed {
        after_review += changes;
      }
    }
  }

  if total == 0 {
    return Some(0.0);
  }
  Some(after_review as f64 / total as f64)
}

/// Verdict for one commit's evidence.
pub fn commit_ci_outcome(commit: &Commit) -> CiOutcome {
  let ci = &commit.ci;
  let failed = ci.conclusions.iter().any(|c| c.is_failure())
    || ci.status.is_some_and(|s| s.is_failure());
  if failed {
    CiOutcome::Failed
  } else if !ci.fetch_errors.is_empty() {
    CiOutcome::Unknown
  } else {
    CiOutcome::Passed
  }
}

/// Verdict across the examined commits: the first failure wins; otherwise any
/// gap in evidence (or no commits at all) leaves the PR unknown.
pub fn ci_outcome(window: &[Commit]) -> CiOutcome {
  if window.is_empty() {
    return CiOutcome::Unknown;
  }
  let mut outcome = CiOutcome::Passed;
  for commit in window {
    match commit_ci_outcome(commit) {
      CiOutcome::Failed => return CiOutcome::Failed,
      CiOutcome::Unknown => outcome = CiOutcome::Unknown,
      CiOutcome::Passed => {}
    }
  }
  outcome
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
  (to - from).num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{CheckConclusion, CiEvidence, StatusState};
  use chrono::TimeZone;

  fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
  }

  fn review(state: ReviewState, author: &str, at: Option<DateTime<Utc>>) -> Review {
    Review {
      state,
      author: Some(author.into()),
      submitted_at: at,
    }
  }

  fn commit(changes: u64, at: Option<DateTime<Utc>>) -> Commit {
    Commit {
      sha: format!("c{}", changes),
      additions: changes,
      deletions: 0,
      committed_at: at,
      ci: CiEvidence::default(),
    }
  }

  fn pr(reviews: Vec<Review>, commits: Vec<Commit>) -> PullRequest {
    PullRequest {
      number: 42,
      title: "Tidy scheduler".into(),
      url: "https://github.com/acme/api/pull/42".into(),
      author: "alice".into(),
      additions: 90,
      deletions: 10,
      files_changed: 3,
      created_at: ts(4, 9),
      merged_at: Some(ts(6, 9)),
      reviews,
      commits,
    }
  }

  #[test]
  fn review_rounds_count_changes_requested_only() {
    let reviews = vec![
      review(ReviewState::ChangesRequested, "bob", Some(ts(4, 10))),
      review(ReviewState::Approved, "bob", Some(ts(5, 10))),
      review(ReviewState::ChangesRequested, "carol", Some(ts(4, 11))),
      review(ReviewState::Commented, "bob", Some(ts(4, 12))),
    ];
    assert_eq!(review_rounds(&reviews), 2);
  }

  #[test]
  fn first_review_ignores_author_and_pending() {
    let reviews = vec![
      review(ReviewState::Commented, "alice", Some(ts(4, 10))),
      review(ReviewState::Pending, "dave", None),
      review(ReviewState::Approved, "bob", Some(ts(5, 8))),
      review(ReviewState::Commented, "carol", Some(ts(4, 20))),
    ];
    assert_eq!(first_review_time(&reviews, "alice"), Some(ts(4, 20)));
    assert_eq!(first_review_time(&reviews[..2], "alice"), None);
  }

  #[test]
  fn churn_counts_only_commits_strictly_after_review() {
    let window = vec![
      commit(60, Some(ts(4, 9))),
      commit(20, Some(ts(4, 12))), // same instant as review: not after
      commit(20, Some(ts(4, 15))),
    ];
    let ratio = churn_ratio(&window, Some(ts(4, 12))).unwrap();
    assert!((ratio - 0.2).abs() < 1e-12);
  }

  #[test]
  fn churn_zero_when_no_lines_changed() {
    let window = vec![commit(0, Some(ts(5, 9)))];
    assert_eq!(churn_ratio(&window, Some(ts(4, 9))), Some(0.0));
  }

  #[test]
  fn churn_absent_without_commits() {
    assert_eq!(churn_ratio(&[], Some(ts(4, 9))), None);
  }

  #[test]
  fn churn_stays_a_fraction_for_huge_commits() {
    let window = vec![commit(u64::MAX, Some(ts(4, 9))), commit(u64::MAX, Some(ts(4, 15)))];
    assert_eq!(churn_ratio(&window, Some(ts(4, 12))), Some(0.5));
  }

  #[test]
  fn churn_zero_without_review() {
    let window = vec![commit(10, Some(ts(5, 9)))];
    assert_eq!(churn_ratio(&window, None), Some(0.0));
  }

  #[test]
  fn commits_beyond_cap_are_ignored() {
    let mut commits = vec![commit(10, Some(ts(4, 8)))];
    commits.push(commit(90, Some(ts(5, 9))));
    let p = pr(
      vec![review(ReviewState::Approved, "bob", Some(ts(4, 12)))],
      commits,
    );
    let m = extract(&p, 1).unwrap();
    assert_eq!(m.churn_ratio, Some(0.0));
    assert_eq!(m.commits_examined, 1);
    assert!(m.commits_truncated);
  }

  #[test]
  fn ci_failure_from_check_run() {
    let mut c = commit(5, None);
    c.ci.conclusions = vec![CheckConclusion::Success, CheckConclusion::TimedOut];
    assert_eq!(commit_ci_outcome(&c), CiOutcome::Failed);
  }

  #[test]
  fn ci_failure_from_legacy_status() {
    let mut c = commit(5, None);
    c.ci.status = Some(StatusState::Error);
    assert_eq!(commit_ci_outcome(&c), CiOutcome::Failed);
  }

  #[test]
  fn neutral_and_skipped_are_not_failures() {
    let mut c = commit(5, None);
    c.ci.conclusions = vec![CheckConclusion::Neutral, CheckConclusion::Skipped];
    c.ci.status = Some(StatusState::Pending);
    assert_eq!(commit_ci_outcome(&c), CiOutcome::Passed);
  }

  #[test]
  fn fetch_error_is_unknown_not_passed() {
    let mut c = commit(5, None);
    c.ci.fetch_errors = vec!["check-runs: 502".into()];
    assert_eq!(ci_outcome(&[commit(1, None), c]), CiOutcome::Unknown);
  }

  #[test]
  fn failure_wins_over_unknown() {
    let mut unknown = commit(5, None);
    unknown.ci.fetch_errors = vec!["status: 404".into()];
    let mut failed = commit(6, None);
    failed.ci.status = Some(StatusState::Failure);
    assert_eq!(ci_outcome(&[unknown, failed]), CiOutcome::Failed);
  }

  #[test]
  fn ci_outside_window_is_not_examined() {
    let mut failed = commit(6, None);
    failed.ci.status = Some(StatusState::Failure);
    let p = pr(vec![], vec![commit(1, None), failed]);
    assert_eq!(extract(&p, 1).unwrap().ci, CiOutcome::Passed);
    assert_eq!(extract(&p, 2).unwrap().ci, CiOutcome::Failed);
  }

  #[test]
  fn no_commits_means_unknown_ci_and_absent_churn() {
    let m = extract(&pr(vec![], vec![]), 20).unwrap();
    assert_eq!(m.ci, CiOutcome::Unknown);
    assert!(!m.ci_failed());
    assert_eq!(m.churn_ratio, None);
  }

  #[test]
  fn latencies_in_hours() {
    let p = pr(
      vec![review(ReviewState::Approved, "bob", Some(ts(4, 15)))],
      vec![commit(100, Some(ts(4, 8)))],
    );
    let m = extract(&p, 20).unwrap();
    assert_eq!(m.time_to_first_review_hours, Some(6.0));
    assert_eq!(m.time_to_merge_hours, Some(48.0));
    assert_eq!(m.size(), 100);
  }

  #[test]
  fn unmerged_and_unreviewed_are_absent() {
    let mut p = pr(vec![], vec![commit(1, None)]);
    p.merged_at = None;
    let m = extract(&p, 20).unwrap();
    assert_eq!(m.time_to_first_review_hours, None);
    assert_eq!(m.time_to_merge_hours, None);
  }

  #[test]
  fn review_before_creation_is_an_error() {
    let p = pr(
      vec![review(ReviewState::Approved, "bob", Some(ts(3, 9)))],
      vec![],
    );
    let err = extract(&p, 20).unwrap_err();
    assert_eq!(err.pr_number, 42);
  }
}
