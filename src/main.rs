//! Callmatch server
//!
//! Reconciles uploaded caller/contact batches against the telephony call
//! log and serves the results to the business-ops dashboard.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use callmatch_api::{configure, SharedContacts, SharedEngine};
use callmatch_auth::JwtService;
use callmatch_core::traits::CallRecordStore;
use callmatch_core::{AppConfig, PhoneNormalizer};
use callmatch_db::{create_pool, run_migrations, PgCallRecordStore, PgContactRepository};
use callmatch_services::ReconciliationEngine;
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "callmatch={lvl},callmatch_api={lvl},callmatch_services={lvl},callmatch_db={lvl},callmatch_auth={lvl},actix_web=info,sqlx=warn",
            lvl = log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Callmatch v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Connecting to application database...");
    let pool = create_pool(&config.database.url, Some(config.database.max_connections)).await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let cdr_pool = match &config.cdr.url {
        Some(url) => {
            info!("Connecting to call record database...");
            create_pool(url, Some(config.cdr.max_connections)).await?
        }
        None => pool.clone(),
    };
    let store: Arc<dyn CallRecordStore> =
        Arc::new(PgCallRecordStore::new(cdr_pool, &config.cdr.table)?);
    info!("Reading call records from table '{}'", config.cdr.table);

    let normalizer = PhoneNormalizer::new(&config.reconciliation.country_prefix);
    let engine: web::Data<SharedEngine> =
        web::Data::new(ReconciliationEngine::new(store, normalizer));
    let contacts: Arc<SharedContacts> = Arc::new(PgContactRepository::new(pool));
    let contacts = web::Data::from(contacts);

    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));
    info!(
        "JWT validation configured, {} second token lifetime",
        config.auth.jwt_expiration_secs
    );

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    let payload_limit = config.server.payload_limit_bytes;
    let cors_origins = config.cors.origin_list();
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                origin
                    .to_str()
                    .map(|o| origins.iter().any(|allowed| allowed == o))
                    .unwrap_or(false)
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::COOKIE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(engine.clone())
            .app_data(contacts.clone())
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::JsonConfig::default().limit(payload_limit).error_handler(
                |err, _req| {
                    let error_message = err.to_string();
                    actix_web::error::InternalError::from_response(
                        err,
                        HttpResponse::BadRequest().json(serde_json::json!({
                            "error": "invalid_body",
                            "message": error_message,
                            "status": 400
                        })),
                    )
                    .into()
                },
            ))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_query",
                        "message": error_message,
                        "status": 400
                    })),
                )
                .into()
            }))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .service(web::scope("/api/v1").configure(configure))
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
