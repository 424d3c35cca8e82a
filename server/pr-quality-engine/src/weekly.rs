//! Weekly trend aggregation: bucket merged PRs by ISO week inside the lookback
//! window and summarize each bucket's score distribution and signals.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::stats;
use crate::types::{ScoredPr, WeeklyBucket, WeeklyStats};

/// Start of the lookback window: `months` 30-day months before `now`.
///
/// Saturates at the earliest representable instant.
pub fn lookback_start(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
  Duration::try_days(30 * i64::from(months))
    .and_then(|span| now.checked_sub_signed(span))
    .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Group merged PRs at or after `since` by ISO week, ascending by key.
///
/// Unmerged PRs are skipped. Weeks without PRs never appear.
pub fn bucket_by_week(prs: &[ScoredPr], since: DateTime<Utc>) -> Vec<WeeklyBucket<'_>> {
  let mut buckets: BTreeMap<String, Vec<&ScoredPr>> = BTreeMap::new();
  for pr in prs {
    let Some(merged) = pr.merged_at else {
      continue;
    };
    if merged < since {
      continue;
    }
    buckets.entry(stats::iso_week_key(&merged)).or_default().push(pr);
  }
  buckets
    .into_iter()
    .map(|(week, prs)| WeeklyBucket { week, prs })
    .collect()
}

/// Distribution stats for one bucket.
pub fn summarize(bucket: &WeeklyBucket<'_>, score_threshold: u32) -> WeeklyStats {
  let prs = &bucket.prs;
  let scores: Vec<f64> = prs.iter().map(|p| p.score).collect();
  let churns: Vec<f64> = prs.iter().filter_map(|p| p.metrics.churn_ratio).collect();
  let sizes: Vec<f64> = prs.iter().map(|p| p.metrics.size() as f64).collect();
  let rounds: Vec<f64> = prs.iter().map(|p| p.metrics.review_rounds as f64).collect();
  let threshold = f64::from(score_threshold);

  WeeklyStats {
    week: bucket.week.clone(),
    median_score: stats::median(&scores),
    p25_score: stats::percentile(&scores, 25.0),
    p75_score: stats::percentile(&scores, 75.0),
    pct_below_threshold: stats::rate(prs, |p| p.score < threshold).unwrap_or(0.0),
    ci_fail_rate: stats::rate(prs, |p| p.metrics.ci_failed()).unwrap_or(0.0),
    median_churn: stats::median(&churns),
    median_size: stats::median(&sizes),
    median_review_rounds: stats::median(&rounds),
  }
}

/// Weekly stats over the lookback window, ascending by week.
pub fn build_weekly(
  prs: &[ScoredPr],
  now: DateTime<Utc>,
  months: u32,
  score_threshold: u32,
) -> Vec<WeeklyStats> {
  bucket_by_week(prs, lookback_start(now, months))
    .iter()
    .map(|b| summarize(b, score_threshold))
    .collect()
}
