//! HTTP request handlers

pub mod cdr;
pub mod contact;
pub mod health;
pub mod reconcile;

use actix_web::web;
use callmatch_core::traits::{CallRecordStore, ContactRepository};
use callmatch_services::ReconciliationEngine;

/// Engine type registered as app data
pub type SharedEngine = ReconciliationEngine<dyn CallRecordStore>;

/// Contact repository type registered as app data
pub type SharedContacts = dyn ContactRepository;

/// Register all routes under the caller's scope
///
/// Expects `Data<SharedEngine>`, `Data<SharedContacts>` and the
/// `JwtService` as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/reconcile", web::post().to(reconcile::reconcile_rows))
        .service(
            web::scope("/contacts")
                .route("", web::get().to(contact::list_contacts))
                .route("/upload", web::post().to(contact::upload_contacts))
                .route("/reconcile", web::post().to(contact::reconcile_stored)),
        )
        .route("/cdrs", web::get().to(cdr::list_calls));
}
