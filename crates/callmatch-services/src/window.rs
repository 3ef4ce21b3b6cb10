//! Date window resolution
//!
//! A row whose call date cell holds a range (`2024-01-01 - 2024-01-31`)
//! overrides the window requested by the caller. The first such row wins.

use callmatch_core::models::{ContactRow, DateWindow};
use callmatch_core::{AppError, AppResult};
use tracing::debug;

/// First date range embedded in a row's call date, if any
pub fn embedded_window(rows: &[ContactRow]) -> Option<(usize, DateWindow)> {
    rows.iter().enumerate().find_map(|(index, row)| {
        row.call_date
            .as_deref()
            .and_then(DateWindow::parse_range)
            .map(|window| (index, window))
    })
}

/// Window to reconcile: an embedded range takes precedence over `requested`
pub fn resolve_window(rows: &[ContactRow], requested: Option<DateWindow>) -> AppResult<DateWindow> {
    if let Some((index, window)) = embedded_window(rows) {
        debug!(row = index, %window, "Using date range embedded in contact row");
        return Ok(window);
    }

    requested.ok_or_else(|| {
        AppError::MissingField("start_date and end_date (no row carries a date range)".to_string())
    })
}
