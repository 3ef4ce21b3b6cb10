//! Call log browsing

use super::SharedEngine;
use crate::dto::{ApiResponse, CallEventResponse, CallLogParams};
use actix_web::{
    web::{Data, Json, Query},
    Result,
};
use callmatch_auth::AuthenticatedUser;
use callmatch_core::{
    error::AppError,
    models::{DateWindow, Permission},
};
use tracing::{info, instrument, warn};
use validator::Validate;

/// Calls from or to a number in a window, latest first
///
/// # Examples
///
/// ```text
/// GET /api/v1/cdrs?number=555123456&start_date=2024-01-01&end_date=2024-01-31&limit=100
/// ```
#[instrument(skip(engine, user, query), fields(user = %user.username))]
pub async fn list_calls(
    engine: Data<SharedEngine>,
    user: AuthenticatedUser,
    query: Query<CallLogParams>,
) -> Result<Json<ApiResponse<Vec<CallEventResponse>>>> {
    user.context().require(Permission::ViewCallLog)?;
    query.validate().map_err(|e| {
        warn!("Invalid query parameters: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let number = engine.normalizer().normalized(&query.number);
    if number.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "'{}' contains no digits",
            query.number
        ))
        .into());
    }
    let window = DateWindow::parse(&query.start_date, &query.end_date)?;

    let calls = engine
        .store()
        .list_for_number(&number, &window, query.limit)
        .await?;

    info!("Retrieved {} calls for {}", calls.len(), number.digits());
    Ok(Json(ApiResponse::success(
        calls.into_iter().map(CallEventResponse::from).collect(),
    )))
}
