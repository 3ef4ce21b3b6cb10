//! Merge reconciliation results onto contact rows
//!
//! User-entered data is never overwritten silently: the primary call date is
//! only backfilled when it was empty, and the call-log date always goes to
//! its own field. A backfilled date is flagged so a later run over another
//! window replaces or clears it instead of mistaking it for user input.

use callmatch_core::models::contact::RECEIVER_NOT_FOUND;
use callmatch_core::models::{ContactRow, ReconciliationStatus};
use chrono::NaiveDateTime;

use crate::metrics::CallMetrics;
use crate::receiver::ResolvedReceiver;

const CALL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write metrics of the resolved pair onto `row`
pub fn merge_matched(row: &mut ContactRow, receiver: &ResolvedReceiver, metrics: &CallMetrics) {
    row.receiver_number = Some(receiver.number.clone());
    if let Some(person) = receiver.contact_person.as_ref().filter(|p| !p.trim().is_empty()) {
        row.receiver_name = Some(person.clone());
    }

    apply_metrics(row, metrics);
    row.call_status = metrics
        .latest_disposition
        .as_ref()
        .map(|d| d.as_str().to_string());
    row.cdr_call_date = metrics.latest_call_at;
    if let Some(observed) = metrics.latest_call_at {
        backfill_call_date(row, observed);
    }
    row.reconciliation = ReconciliationStatus::Matched;
}

/// Mark `row` as having no attributable calls, with explicit zero metrics
pub fn merge_unmatched(row: &mut ContactRow, status: ReconciliationStatus) {
    row.receiver_number = Some(RECEIVER_NOT_FOUND.to_string());
    row.receiver_name = None;
    apply_metrics(row, &CallMetrics::zero());
    row.call_status = None;
    row.cdr_call_date = None;
    if row.call_date_backfilled {
        row.call_date = None;
        row.call_date_backfilled = false;
    }
    row.reconciliation = status;
}

/// Fill the primary call date from the call log only if the user left it empty
pub fn backfill_call_date(row: &mut ContactRow, observed: NaiveDateTime) -> bool {
    if row.has_call_date() {
        return false;
    }
    row.call_date = Some(observed.format(CALL_DATE_FORMAT).to_string());
    row.call_date_backfilled = true;
    true
}

fn apply_metrics(row: &mut ContactRow, metrics: &CallMetrics) {
    row.call_count = Some(metrics.count);
    row.answered_calls = Some(metrics.answered);
    row.no_answer_calls = Some(metrics.no_answer);
    row.busy_calls = Some(metrics.busy);
    row.call_duration = Some(metrics.formatted_duration.clone());
}
