//! CDR reconciliation engine
//!
//! Matches a batch of contact rows against the call log: one query for all
//! callers in the batch, calls grouped by caller, a receiver resolved per row
//! among its contact phones, and metrics merged back onto the row.
//!
//! A failing call log query fails the whole batch before any row is touched.
//! Problems confined to a single row are recorded as diagnostics and the row
//! is passed through unchanged.

use callmatch_core::models::{
    AuthContext, CallEvent, ContactRow, DateWindow, Permission, ReconciliationStatus,
};
use callmatch_core::traits::CallRecordStore;
use callmatch_core::{AppError, AppResult, NormalizedNumber, PhoneNormalizer};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::merger::{merge_matched, merge_unmatched};
use crate::metrics::aggregate;
use crate::receiver::{calls_to, candidates, distinct_destinations, resolve_receiver};
use crate::window::resolve_window;

/// Failure confined to one row
#[derive(Debug, Error)]
pub enum RowError {
    #[error("caller number '{0}' contains no digits")]
    UnparseableCallerNumber(String),
}

/// Kind of a per-row diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Row passed through unchanged
    UnparseableCallerNumber,
    /// Contact phone ignored as a receiver candidate; row still processed
    UnparseableContactPhone,
}

/// Problem recorded for a row instead of failing the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDiagnostic {
    pub row_index: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl RowDiagnostic {
    fn from_error(row_index: usize, err: &RowError) -> Self {
        let kind = match err {
            RowError::UnparseableCallerNumber(_) => DiagnosticKind::UnparseableCallerNumber,
        };
        Self {
            row_index,
            kind,
            message: err.to_string(),
        }
    }
}

/// Counts per outcome for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub rows_total: usize,
    pub matched: usize,
    pub no_calls: usize,
    pub no_receiver_match: usize,
    pub skipped: usize,
    pub calls_scanned: usize,
    pub callers_with_calls: usize,
}

impl ReconciliationSummary {
    fn record(&mut self, status: ReconciliationStatus) {
        match status {
            ReconciliationStatus::Matched => self.matched += 1,
            ReconciliationStatus::NoCalls => self.no_calls += 1,
            ReconciliationStatus::NoReceiverMatch => self.no_receiver_match += 1,
            ReconciliationStatus::Skipped | ReconciliationStatus::Pending => self.skipped += 1,
        }
    }
}

/// Result of reconciling one batch
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub run_id: Uuid,
    pub window: DateWindow,
    /// Same length and order as the input batch
    pub rows: Vec<ContactRow>,
    pub diagnostics: Vec<RowDiagnostic>,
    pub summary: ReconciliationSummary,
}

/// Calls grouped by caller digits, reachable from any equivalent form
///
/// A call carrying both a plain source and a caller ID number is filed under
/// each of them.
struct CallerIndex<'a> {
    groups: HashMap<String, Vec<(usize, &'a CallEvent)>>,
    by_variant: HashMap<String, Vec<String>>,
}

impl<'a> CallerIndex<'a> {
    fn build(calls: &'a [CallEvent], normalizer: &PhoneNormalizer) -> Self {
        let mut groups: HashMap<String, Vec<(usize, &'a CallEvent)>> = HashMap::new();
        for (position, call) in calls.iter().enumerate() {
            for digits in call.caller_numbers() {
                groups.entry(digits).or_default().push((position, call));
            }
        }

        let mut by_variant: HashMap<String, Vec<String>> = HashMap::new();
        for digits in groups.keys() {
            for variant in normalizer.expand(digits) {
                by_variant.entry(variant).or_default().push(digits.clone());
            }
        }

        Self { groups, by_variant }
    }

    fn callers(&self) -> usize {
        self.groups.len()
    }

    /// Calls of every caller equivalent to `caller`, in call log order
    fn calls_for(&self, caller: &NormalizedNumber) -> Vec<&'a CallEvent> {
        let keys: BTreeSet<&str> = caller
            .variants()
            .iter()
            .filter_map(|v| self.by_variant.get(v))
            .flatten()
            .map(String::as_str)
            .collect();

        let calls: BTreeMap<usize, &'a CallEvent> = keys
            .into_iter()
            .filter_map(|k| self.groups.get(k))
            .flatten()
            .copied()
            .collect();
        calls.into_values().collect()
    }
}

/// Reconciliation engine
///
/// Holds no per-batch state; concurrent batches share only the store.
pub struct ReconciliationEngine<S: CallRecordStore + ?Sized> {
    store: Arc<S>,
    normalizer: PhoneNormalizer,
}

impl<S: CallRecordStore + ?Sized> ReconciliationEngine<S> {
    /// Create a new engine over `store`
    pub fn new(store: Arc<S>, normalizer: PhoneNormalizer) -> Self {
        Self { store, normalizer }
    }

    pub fn normalizer(&self) -> &PhoneNormalizer {
        &self.normalizer
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Union of every representation of the batch's caller numbers
    pub fn caller_filter(&self, rows: &[ContactRow]) -> BTreeSet<String> {
        self.normalizer
            .expand_all(rows.iter().map(|row| row.caller_str()))
    }

    /// Resolve the date window from the batch, then reconcile
    pub async fn reconcile_batch(
        &self,
        ctx: &AuthContext,
        rows: Vec<ContactRow>,
        requested: Option<DateWindow>,
    ) -> AppResult<ReconciliationReport> {
        let window = resolve_window(&rows, requested)?;
        self.reconcile(ctx, rows, window).await
    }

    /// Reconcile `rows` against calls in `window`
    #[instrument(skip(self, ctx, rows), fields(user = %ctx.username, rows = rows.len(), window = %window))]
    pub async fn reconcile(
        &self,
        ctx: &AuthContext,
        mut rows: Vec<ContactRow>,
        window: DateWindow,
    ) -> AppResult<ReconciliationReport> {
        ctx.require(Permission::Reconcile)?;

        let run_id = Uuid::now_v7();
        let filter = self.caller_filter(&rows);
        debug!(%run_id, filter_size = filter.len(), "Querying call log");

        let calls = if filter.is_empty() {
            Vec::new()
        } else {
            self.store.query(&filter, &window).await.map_err(|e| {
                error!(%run_id, error = %e, "Call log query failed, batch aborted");
                match e {
                    AppError::CallStore(_) => e,
                    other => AppError::CallStore(other.to_string()),
                }
            })?
        };

        let index = CallerIndex::build(&calls, &self.normalizer);
        let mut summary = ReconciliationSummary {
            rows_total: rows.len(),
            calls_scanned: calls.len(),
            callers_with_calls: index.callers(),
            ..Default::default()
        };
        let mut diagnostics = Vec::new();

        for (row_index, row) in rows.iter_mut().enumerate() {
            diagnostics.extend(self.contact_phone_diagnostics(row_index, row));

            let mut working = row.clone();
            match self.reconcile_row(&mut working, &index) {
                Ok(status) => {
                    *row = working;
                    summary.record(status);
                }
                Err(err) => {
                    warn!(%run_id, row = row_index, error = %err, "Row passed through unchanged");
                    diagnostics.push(RowDiagnostic::from_error(row_index, &err));
                    summary.skipped += 1;
                }
            }
        }

        info!(
            %run_id,
            matched = summary.matched,
            no_calls = summary.no_calls,
            no_receiver_match = summary.no_receiver_match,
            skipped = summary.skipped,
            calls = summary.calls_scanned,
            "Reconciliation finished"
        );

        Ok(ReconciliationReport {
            run_id,
            window,
            rows,
            diagnostics,
            summary,
        })
    }

    fn reconcile_row(
        &self,
        row: &mut ContactRow,
        index: &CallerIndex<'_>,
    ) -> Result<ReconciliationStatus, RowError> {
        let raw = row.caller_str().trim().to_string();
        if raw.is_empty() {
            row.reconciliation = ReconciliationStatus::Skipped;
            return Ok(ReconciliationStatus::Skipped);
        }

        let caller = self.normalizer.normalized(&raw);
        if caller.is_empty() {
            return Err(RowError::UnparseableCallerNumber(raw));
        }

        let calls = index.calls_for(&caller);
        if calls.is_empty() {
            merge_unmatched(row, ReconciliationStatus::NoCalls);
            return Ok(ReconciliationStatus::NoCalls);
        }

        let destinations = distinct_destinations(&calls, &self.normalizer);
        let candidates = candidates(row, &self.normalizer);

        let Some(receiver) = resolve_receiver(&destinations, &candidates) else {
            debug!(caller = caller.digits(), calls = calls.len(), "No destination matches a contact phone");
            merge_unmatched(row, ReconciliationStatus::NoReceiverMatch);
            return Ok(ReconciliationStatus::NoReceiverMatch);
        };

        let pair_calls = calls_to(&calls, &receiver, &self.normalizer);
        let metrics = aggregate(&pair_calls);
        debug!(
            caller = caller.digits(),
            receiver = %receiver.number,
            caller_calls = calls.len(),
            pair_calls = metrics.count,
            "Receiver resolved"
        );
        merge_matched(row, &receiver, &metrics);
        Ok(ReconciliationStatus::Matched)
    }

    fn contact_phone_diagnostics(&self, row_index: usize, row: &ContactRow) -> Vec<RowDiagnostic> {
        row.contacts
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.phone_str().trim().is_empty())
            .filter(|(_, c)| self.normalizer.normalized(c.phone_str()).is_empty())
            .map(|(i, c)| RowDiagnostic {
                row_index,
                kind: DiagnosticKind::UnparseableContactPhone,
                message: format!("contact phone {} '{}' contains no digits", i + 1, c.phone_str()),
            })
            .collect()
    }
}
