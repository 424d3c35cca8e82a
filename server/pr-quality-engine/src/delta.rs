//! Before/after adoption comparison over merged PRs.
//!
//! The numeric comparison ([`build_deltas`]) and its display strings
//! ([`render`]) are kept apart so either can change without the other.

use chrono::{DateTime, Utc};

use crate::stats;
use crate::types::{DeltaFormat, DeltaRecord, DeltaValue, ScoredPr};

pub const MEDIAN_SCORE: &str = "Median Score";
pub const CI_FAIL_RATE: &str = "CI Fail Rate";
pub const MEDIAN_CHURN: &str = "Median Churn";
pub const MEDIAN_SIZE: &str = "Median Size";

/// One tracked metric: label, display format, and how to aggregate a side.
struct Tracked {
  label: &'static str,
  format: DeltaFormat,
  aggregate: fn(&[&ScoredPr]) -> Option<f64>,
}

const TRACKED: [Tracked; 4] = [
  Tracked {
    label: MEDIAN_SCORE,
    format: DeltaFormat::Fixed1,
    aggregate: median_score,
  },
  Tracked {
    label: CI_FAIL_RATE,
    format: DeltaFormat::Percent1,
    aggregate: ci_fail_rate,
  },
  Tracked {
    label: MEDIAN_CHURN,
    format: DeltaFormat::Percent1,
    aggregate: median_churn,
  },
  Tracked {
    label: MEDIAN_SIZE,
    format: DeltaFormat::Fixed1,
    aggregate: median_size,
  },
];

fn median_score(prs: &[&ScoredPr]) -> Option<f64> {
  let v: Vec<f64> = prs.iter().map(|p| p.score).collect();
  stats::median(&v)
}

fn ci_fail_rate(prs: &[&ScoredPr]) -> Option<f64> {
  stats::rate(prs, |p| p.metrics.ci_failed())
}

fn median_churn(prs: &[&ScoredPr]) -> Option<f64> {
  let v: Vec<f64> = prs.iter().filter_map(|p| p.metrics.churn_ratio).collect();
  stats::median(&v)
}

fn median_size(prs: &[&ScoredPr]) -> Option<f64> {
  let v: Vec<f64> = prs.iter().map(|p| p.metrics.size() as f64).collect();
  stats::median(&v)
}

/// Split merged PRs at `adoption`: strictly earlier is "before", the rest "after".
pub fn partition(
  prs: &[ScoredPr],
  adoption: DateTime<Utc>,
) -> (Vec<&ScoredPr>, Vec<&ScoredPr>) {
  let mut before = Vec::new();
  let mut after = Vec::new();
  for pr in prs {
    match pr.merged_at {
      Some(m) if m < adoption => before.push(pr),
      Some(_) => after.push(pr),
      None => {}
    }
  }
  (before, after)
}

/// The four tracked comparisons, in display order.
///
/// If either side of a metric has no qualifying values, that metric's
/// before, after, and delta are all absent.
pub fn build_deltas(prs: &[ScoredPr], adoption: Option<DateTime<Utc>>) -> Vec<DeltaValue> {
  let Some(adoption) = adoption else {
    return TRACKED
      .iter()
      .map(|t| DeltaValue {
        label: t.label,
        before: None,
        after: None,
        delta: None,
        format: t.format,
      })
      .collect();
  };

  let (before_prs, after_prs) = partition(prs, adoption);
  TRACKED
    .iter()
    .map(|t| {
      let (before, after) = match ((t.aggregate)(&before_prs), (t.aggregate)(&after_prs)) {
        (Some(b), Some(a)) => (Some(b), Some(a)),
        _ => (None, None),
      };
      DeltaValue {
        label: t.label,
        before,
        after,
        delta: before.zip(after).map(|(b, a)| a - b),
        format: t.format,
      }
    })
    .collect()
}

/// Display a numeric value in the given format.
pub fn format_value(value: f64, format: DeltaFormat) -> String {
  match format {
    DeltaFormat::Fixed1 => format!("{:.1}", value),
    DeltaFormat::Percent1 => format!("{:.1}%", value * 100.0),
  }
}

/// Presentation layer: numeric deltas to the payload's string records.
pub fn render(values: &[DeltaValue]) -> Vec<DeltaRecord> {
  values
    .iter()
    .map(|v| DeltaRecord {
      label: v.label.to_string(),
      before: v.before.map(|x| format_value(x, v.format)),
      after: v.after.map(|x| format_value(x, v.format)),
      delta: v.delta.map(|x| format_value(x, v.format)),
    })
    .collect()
}
