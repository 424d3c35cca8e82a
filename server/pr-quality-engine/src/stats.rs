//! Distribution helpers: median, linear-interpolation percentile, rates, and
//! ISO-week bucket keys. None of them fail on empty input.

use chrono::{DateTime, Datelike, Utc};

/// Format a timestamp into an ISO-week bucket key: "YYYY-Www".
///
/// Uses the ISO week-numbering year, so 2024-12-30 is "2025-W01".
pub fn iso_week_key(ts: &DateTime<Utc>) -> String {
  let week = ts.iso_week();
  format!("{}-W{:02}", week.year(), week.week())
}

/// Sorted copy; the caller's order is left untouched.
fn sorted(values: &[f64]) -> Vec<f64> {
  let mut v = values.to_vec();
  v.sort_by(f64::total_cmp);
  v
}

/// Percentile `pct` (0–100) by linear interpolation between closest ranks.
///
/// For n sorted values, k = (n-1)·pct/100; integral k returns that rank,
/// otherwise the floor and ceiling ranks are blended.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
  match values.len() {
    0 => None,
    1 => Some(values[0]),
    n => {
      let v = sorted(values);
      let k = (n - 1) as f64 * (pct / 100.0);
      let f = k.floor();
      let c = k.ceil();
      if f == c {
        return Some(v[k as usize]);
      }
      Some(v[f as usize] * (c - k) + v[c as usize] * (k - f))
    }
  }
}

/// Standard median: middle value, or mean of the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
  if values.is_empty() {
    return None;
  }
  let v = sorted(values);
  let mid = v.len() / 2;
  if v.len() % 2 == 1 {
    Some(v[mid])
  } else {
    Some((v[mid - 1] + v[mid]) / 2.0)
  }
}

/// Fraction of items matching `pred`; `None` for an empty slice.
pub fn rate<T>(items: &[T], pred: impl Fn(&T) -> bool) -> Option<f64> {
  if items.is_empty() {
    return None;
  }
  let hits = items.iter().filter(|i| pred(*i)).count();
  Some(hits as f64 / items.len() as f64)
}
