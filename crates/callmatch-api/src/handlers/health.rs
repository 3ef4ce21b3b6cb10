//! Health check

use actix_web::HttpResponse;

/// Liveness check, unauthenticated
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "callmatch",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
