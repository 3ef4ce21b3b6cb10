//! Reconciliation DTOs

use super::contact::{AliasedRow, ContactRowDto};
use callmatch_services::{ReconciliationReport, ReconciliationSummary, RowDiagnostic};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Reconcile an uploaded batch
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReconcileRequest {
    /// Rows to reconcile
    #[validate(length(min = 1, max = 20000))]
    pub rows: Vec<ContactRowDto>,

    /// Window start (`YYYY-MM-DD`), required unless a row carries a range
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,

    /// Window end (`YYYY-MM-DD`), inclusive
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
}

/// Reconcile the stored batch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredReconcileRequest {
    /// Window start (`YYYY-MM-DD`)
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,

    /// Window end (`YYYY-MM-DD`), inclusive
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
}

/// Reconciliation result
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResponse {
    /// Identifier of this run, also present in the logs
    pub run_id: Uuid,
    /// Window start actually used
    pub start_date: NaiveDate,
    /// Window end actually used
    pub end_date: NaiveDate,
    /// Rows in input order
    pub rows: Vec<AliasedRow>,
    /// Per-row problems
    pub diagnostics: Vec<RowDiagnostic>,
    /// Outcome counts
    pub summary: ReconciliationSummary,
    /// Rows written back to storage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<usize>,
}

impl ReconcileResponse {
    /// Build the response for `report`
    pub fn from_report(report: ReconciliationReport, saved: Option<usize>) -> Self {
        Self {
            run_id: report.run_id,
            start_date: report.window.start,
            end_date: report.window.end,
            rows: report.rows.into_iter().map(AliasedRow::from).collect(),
            diagnostics: report.diagnostics,
            summary: report.summary,
            saved,
        }
    }
}
