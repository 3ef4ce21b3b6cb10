//! Reconciliation of a batch posted by the client

use super::SharedEngine;
use crate::dto::{parse_optional_window, ApiResponse, ReconcileRequest, ReconcileResponse};
use actix_web::{
    web::{Data, Json},
    Result,
};
use callmatch_auth::AuthenticatedUser;
use callmatch_core::{error::AppError, models::ContactRow};
use tracing::{info, instrument, warn};
use validator::Validate;

/// Reconcile the posted rows against the call log
///
/// # Errors
///
/// Returns 400 on an invalid body or window, 403 for read-only users and
/// 502 when the call log cannot be queried.
///
/// # Examples
///
/// ```text
/// POST /api/v1/reconcile
/// {"rows": [{"callerNumber": "555123456", "tel1": "995555987654"}],
///  "start_date": "2024-01-01", "end_date": "2024-01-31"}
/// ```
#[instrument(skip(engine, user, body), fields(user = %user.username))]
pub async fn reconcile_rows(
    engine: Data<SharedEngine>,
    user: AuthenticatedUser,
    body: Json<ReconcileRequest>,
) -> Result<Json<ApiResponse<ReconcileResponse>>> {
    let request = body.into_inner();
    request.validate().map_err(|e| {
        warn!("Invalid reconcile request: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let requested = parse_optional_window(request.start_date.as_deref(), request.end_date.as_deref())?;
    let rows: Vec<ContactRow> = request.rows.into_iter().map(ContactRow::from).collect();

    let report = engine.reconcile_batch(&user.context(), rows, requested).await?;

    info!(
        run_id = %report.run_id,
        matched = report.summary.matched,
        rows = report.summary.rows_total,
        "Batch reconciled"
    );

    Ok(Json(ApiResponse::success(ReconcileResponse::from_report(
        report, None,
    ))))
}
