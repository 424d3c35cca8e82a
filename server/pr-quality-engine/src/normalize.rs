//! Normalize inbound PR bundles into canonical internal PullRequest models.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{EngineError, ExtractionError};
use crate::types::*;

/// Parse and validate an InboundPullRequest. The first offending field wins.
pub fn normalize(raw: &InboundPullRequest) -> Result<PullRequest, ExtractionError> {
  let number = raw.number;
  let err = |field: &str, reason: String| ExtractionError::new(number, field, reason);

  let additions = non_negative(raw.additions).ok_or_else(|| err("additions", negative(raw.additions)))?;
  let deletions = non_negative(raw.deletions).ok_or_else(|| err("deletions", negative(raw.deletions)))?;
  let files_changed =
    non_negative(raw.files_changed).ok_or_else(|| err("files_changed", negative(raw.files_changed)))?;

  let created_at = parse_rfc3339(&raw.created_at).map_err(|e| err("created_at", e))?;
  let merged_at = match &raw.merged_at {
    Some(s) => Some(parse_rfc3339(s).map_err(|e| err("merged_at", e))?),
    None => None,
  };
  if let Some(merged) = merged_at {
    if merged < created_at {
      return Err(err("merged_at", "precedes created_at".to_string()));
    }
  }

  let reviews = raw
    .reviews
    .iter()
    .enumerate()
    .map(|(i, r)| {
      let state = ReviewState::from_str_loose(&r.state).ok_or_else(|| {
        err(
          &format!("reviews[{}].state", i),
          format!("unknown review state {:?}", r.state),
        )
      })?;
      let submitted_at = match &r.submitted_at {
        Some(s) => Some(parse_rfc3339(s).map_err(|e| err(&format!("reviews[{}].submitted_at", i), e))?),
        None => None,
      };
      Ok(Review {
        state,
        author: r.author.clone(),
        submitted_at,
      })
    })
    .collect::<Result<Vec<_>, ExtractionError>>()?;

  let commits = raw
    .commits
    .iter()
    .enumerate()
    .map(|(i, c)| normalize_commit(number, i, c))
    .collect::<Result<Vec<_>, ExtractionError>>()?;

  Ok(PullRequest {
    number,
    title: raw.title.clone(),
    url: raw.url.clone(),
    author: raw.author.clone().unwrap_or_else(|| "unknown".to_string()),
    additions,
    deletions,
    files_changed,
    created_at,
    merged_at,
    reviews,
    commits,
  })
}

fn normalize_commit(number: u64, i: usize, c: &InboundCommit) -> Result<Commit, ExtractionError> {
  let err = |field: &str, reason: String| {
    ExtractionError::new(number, &format!("commits[{}].{}", i, field), reason)
  };

  let additions = non_negative(c.additions).ok_or_else(|| err("additions", negative(c.additions)))?;
  let deletions = non_negative(c.deletions).ok_or_else(|| err("deletions", negative(c.deletions)))?;
  let committed_at = match &c.committed_at {
    Some(s) => Some(parse_rfc3339(s).map_err(|e| err("committed_at", e))?),
    None => None,
  };

  let mut conclusions = Vec::with_capacity(c.ci.check_runs.len());
  for (j, run) in c.ci.check_runs.iter().enumerate() {
    // In-progress runs have no conclusion yet.
    let Some(raw_conclusion) = &run.conclusion else {
      continue;
    };
    let conclusion = CheckConclusion::from_str_loose(raw_conclusion).ok_or_else(|| {
      err(
        &format!("ci.check_runs[{}].conclusion", j),
        format!("unknown conclusion {:?}", raw_conclusion),
      )
    })?;
    conclusions.push(conclusion);
  }

  let status = match &c.ci.status_state {
    Some(s) => Some(
      StatusState::from_str_loose(s)
        .ok_or_else(|| err("ci.status_state", format!("unknown status state {:?}", s)))?,
    ),
    None => None,
  };

  Ok(Commit {
    sha: c.sha.clone(),
    additions,
    deletions,
    committed_at,
    ci: CiEvidence {
      conclusions,
      status,
      fetch_errors: c.ci.errors.clone(),
    },
  })
}

/// Parse an adoption date: plain `YYYY-MM-DD` means midnight UTC.
pub fn parse_adoption_date(s: &str) -> Result<DateTime<Utc>, EngineError> {
  if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
    if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
      return Ok(midnight.and_utc());
    }
  }
  parse_rfc3339(s).map_err(|e| EngineError::validation("adoption_date", &e))
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, String> {
  DateTime::parse_from_rfc3339(s.trim())
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| format!("invalid RFC3339 {:?}: {}", s, e))
}

fn non_negative(v: i64) -> Option<u64> {
  u64::try_from(v).ok()
}

fn negative(v: i64) -> String {
  format!("must not be negative, got {}", v)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn make_inbound() -> InboundPullRequest {
    InboundPullRequest {
      number: 7,
      title: "Add retry budget".into(),
      url: "https://github.com/acme/api/pull/7".into(),
      author: Some("alice".into()),
      additions: 120,
      deletions: 30,
      files_changed: 4,
      created_at: "2024-03-04T09:00:00Z".into(),
      merged_at: Some("2024-03-05T15:30:00Z".into()),
      reviews: vec![InboundReview {
        state: "CHANGES_REQUESTED".into(),
        author: Some("bob".into()),
        submitted_at: Some("2024-03-04T12:00:00Z".into()),
      }],
      commits: vec![InboundCommit {
        sha: "a1".into(),
        additions: 100,
        deletions: 20,
        committed_at: Some("2024-03-04T08:55:00Z".into()),
        ci: InboundCiEvidence {
          check_runs: vec![
            InboundCheckRun {
              name: "build".into(),
              conclusion: Some("success".into()),
            },
            InboundCheckRun {
              name: "lint".into(),
              conclusion: None,
            },
          ],
          status_state: Some("pending".into()),
          errors: vec![],
        },
      }],
    }
  }

  #[test]
  fn normalize_valid_pr() {
    let pr = normalize(&make_inbound()).unwrap();
    assert_eq!(pr.number, 7);
    assert_eq!(pr.author, "alice");
    assert_eq!(pr.reviews[0].state, ReviewState::ChangesRequested);
    assert_eq!(pr.commits[0].ci.conclusions, vec![CheckConclusion::Success]);
    assert_eq!(pr.commits[0].ci.status, Some(StatusState::Pending));
    assert!(pr.merged_at.is_some());
  }

  #[test]
  fn missing_author_becomes_unknown() {
    let mut raw = make_inbound();
    raw.author = None;
    assert_eq!(normalize(&raw).unwrap().author, "unknown");
  }

  #[test]
  fn negative_count_names_pr_and_field() {
    let mut raw = make_inbound();
    raw.deletions = -3;
    let err = normalize(&raw).unwrap_err();
    assert_eq!(err.pr_number, 7);
    assert_eq!(err.field, "deletions");
  }

  #[test]
  fn bad_timestamp_is_rejected() {
    let mut raw = make_inbound();
    raw.created_at = "yesterday".into();
    let err = normalize(&raw).unwrap_err();
    assert_eq!(err.field, "created_at");
    assert!(err.to_string().contains("pr #7"));
  }

  #[test]
  fn merge_before_creation_is_rejected() {
    let mut raw = make_inbound();
    raw.merged_at = Some("2024-03-01T00:00:00Z".into());
    assert_eq!(normalize(&raw).unwrap_err().field, "merged_at");
  }

  #[test]
  fn unknown_conclusion_is_rejected() {
    let mut raw = make_inbound();
    raw.commits[0].ci.check_runs[0].conclusion = Some("exploded".into());
    let err = normalize(&raw).unwrap_err();
    assert_eq!(err.field, "commits[0].ci.check_runs[0].conclusion");
  }

  #[test]
  fn adoption_date_accepts_plain_date_and_rfc3339() {
    let d = parse_adoption_date("2024-02-01").unwrap();
    assert_eq!(d.to_rfc3339(), "2024-02-01T00:00:00+00:00");
    let t = parse_adoption_date("2024-02-01T12:00:00+02:00").unwrap();
    assert_eq!(t.to_rfc3339(), "2024-02-01T10:00:00+00:00");
    assert!(parse_adoption_date("Feb 1st").is_err());
  }
}
