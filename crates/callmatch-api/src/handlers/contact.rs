//! Contact batch handlers

use super::{SharedContacts, SharedEngine};
use crate::dto::{
    parse_optional_window, AliasedRow, ApiResponse, ContactListParams, ReconcileResponse,
    StoredReconcileRequest, UploadRequest, UploadResponse,
};
use actix_web::{
    web::{Data, Json, Query},
    Result,
};
use callmatch_auth::AuthenticatedUser;
use callmatch_core::{
    error::AppError,
    models::{ContactRow, Permission},
    traits::PaginatedResponse,
};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Store an uploaded batch
///
/// # Examples
///
/// ```text
/// POST /api/v1/contacts/upload
/// {"rows": [...], "policy": "append"}
/// ```
#[instrument(skip(repo, user, body), fields(user = %user.username))]
pub async fn upload_contacts(
    repo: Data<SharedContacts>,
    user: AuthenticatedUser,
    body: Json<UploadRequest>,
) -> Result<Json<ApiResponse<UploadResponse>>> {
    let request = body.into_inner();
    request.validate().map_err(|e| {
        warn!("Invalid upload: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let policy = request.policy;
    let rows: Vec<ContactRow> = request.rows.into_iter().map(ContactRow::from).collect();
    let stored = repo.replace_batch(&user.context(), &rows, policy).await?;

    info!("Uploaded {} rows", stored);
    Ok(Json(ApiResponse::with_message(
        UploadResponse { stored, policy },
        format!("{} rows stored", stored),
    )))
}

/// List stored rows
///
/// # Examples
///
/// ```text
/// GET /api/v1/contacts?page=1&per_page=50&search=acme
/// ```
#[instrument(skip(repo, user, query), fields(user = %user.username))]
pub async fn list_contacts(
    repo: Data<SharedContacts>,
    user: AuthenticatedUser,
    query: Query<ContactListParams>,
) -> Result<Json<PaginatedResponse<AliasedRow>>> {
    user.context().require(Permission::ViewContacts)?;
    query.validate().map_err(|e| {
        warn!("Invalid query parameters: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(
        "Listing contacts: page={}, per_page={}, search={:?}",
        query.pagination.page, query.pagination.per_page, query.search
    );

    let (rows, total) = repo
        .list(
            query.search.as_deref(),
            query.pagination.limit(),
            query.pagination.offset(),
        )
        .await?;

    let data = rows.into_iter().map(AliasedRow::from).collect();
    Ok(Json(query.pagination.paginate(data, total)))
}

/// Reconcile the stored batch and write the results back
#[instrument(skip(repo, engine, user, body), fields(user = %user.username))]
pub async fn reconcile_stored(
    repo: Data<SharedContacts>,
    engine: Data<SharedEngine>,
    user: AuthenticatedUser,
    body: Option<Json<StoredReconcileRequest>>,
) -> Result<Json<ApiResponse<ReconcileResponse>>> {
    let request = body.map(Json::into_inner).unwrap_or_default();
    let requested = parse_optional_window(request.start_date.as_deref(), request.end_date.as_deref())?;

    let rows = repo.find_all().await?;
    if rows.is_empty() {
        return Err(AppError::NotFound("No stored contact rows to reconcile".to_string()).into());
    }

    let report = engine.reconcile_batch(&user.context(), rows, requested).await?;
    let saved = repo.save_reconciled(&report.rows).await?;

    info!(run_id = %report.run_id, saved, "Stored batch reconciled");
    Ok(Json(ApiResponse::success(ReconcileResponse::from_report(
        report,
        Some(saved),
    ))))
}
