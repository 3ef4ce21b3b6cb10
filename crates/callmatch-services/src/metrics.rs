//! Per-pair call metrics
//!
//! Aggregates the calls of one (caller, receiver) pair into counts by
//! disposition and answered talk time.

use callmatch_core::models::{CallEvent, Disposition};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Aggregated metrics for one (caller, receiver) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallMetrics {
    pub count: i64,
    pub answered: i64,
    pub no_answer: i64,
    pub busy: i64,
    pub total_answered_seconds: i64,
    pub latest_disposition: Option<Disposition>,
    pub latest_call_at: Option<NaiveDateTime>,
    pub formatted_duration: String,
}

impl CallMetrics {
    /// Metrics of an empty call set
    pub fn zero() -> Self {
        Self {
            count: 0,
            answered: 0,
            no_answer: 0,
            busy: 0,
            total_answered_seconds: 0,
            latest_disposition: None,
            latest_call_at: None,
            formatted_duration: format_duration(0),
        }
    }

    /// Calls whose disposition is none of the tracked three
    pub fn untracked(&self) -> i64 {
        self.count - self.answered - self.no_answer - self.busy
    }
}

/// Aggregate calls already filtered to one pair and sorted latest first
pub fn aggregate(calls: &[&CallEvent]) -> CallMetrics {
    let Some(latest) = calls.first() else {
        return CallMetrics::zero();
    };

    let mut metrics = CallMetrics {
        count: calls.len() as i64,
        latest_disposition: Some(latest.disposition.clone()),
        latest_call_at: Some(latest.calldate),
        ..CallMetrics::zero()
    };

    for call in calls {
        match call.disposition {
            Disposition::Answered => {
                metrics.answered += 1;
                metrics.total_answered_seconds += call.talk_seconds().max(0);
            }
            Disposition::NoAnswer => metrics.no_answer += 1,
            Disposition::Busy => metrics.busy += 1,
            Disposition::Other(_) => {}
        }
    }

    metrics.formatted_duration = format_duration(metrics.total_answered_seconds);
    metrics
}

/// Format seconds as zero-padded `HH:MM:SS`; hours are not capped at 24.
///
/// ```
/// use callmatch_services::metrics::format_duration;
///
/// assert_eq!(format_duration(75), "00:01:15");
/// assert_eq!(format_duration(0), "00:00:00");
/// assert_eq!(format_duration(360_000), "100:00:00");
/// ```
pub fn format_duration(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Parse an `HH:MM:SS` string back to seconds
pub fn parse_duration(s: &str) -> Option<i64> {
    let mut parts = s.trim().split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&seconds)
    {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}
