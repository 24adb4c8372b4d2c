//! ApoloBilling Attribute Engine Server
//!
//! Serves `AttributeSv1` over JSON-RPC on top of an in-memory or Redis
//! profile store.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use apolo_api::configure_routes;
use apolo_attributes::AttributeService;
use apolo_cache::{DataManager, InternalDataDb, RedisDataDb};
use apolo_core::config::StoreBackend;
use apolo_core::traits::AttributeProfileStore;
use apolo_core::AppConfig;
use apolo_filters::{FilterS, TenantIndexer};
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
            "apolo_attrs={lvl},apolo_api={lvl},apolo_attributes={lvl},apolo_cache={lvl},apolo_filters={lvl},actix_web=info",
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

/// Build the profile store selected in the configuration
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn AttributeProfileStore>> {
    match config.store.backend {
        StoreBackend::Internal => {
            info!("Using in-memory profile store");
            Ok(Arc::new(InternalDataDb::new()))
        }
        StoreBackend::Redis => {
            info!("Connecting to Redis at {}", config.store.redis_url);
            let db = RedisDataDb::new(&config.store.redis_url)
                .await
                .context("failed to connect to Redis")?;
            db.ping().await.context("Redis ping failed")?;
            Ok(Arc::new(db))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    init_tracing();

    info!(
        "Starting ApoloBilling Attribute Engine v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = AppConfig::load().context("failed to load configuration")?;

    let store = open_store(&config).await?;
    let dm = Arc::new(DataManager::new(store, config.store.cache_enabled));
    if let Some(path) = &config.store.profiles_file {
        let count = dm
            .load_profiles_file(path)
            .await
            .with_context(|| format!("failed to load profiles from {}", path))?;
        info!("Loaded {} attribute profiles from {}", count, path);
    }

    let filters = Arc::new(FilterS::new());
    if let Some(path) = &config.store.filters_file {
        let count = filters
            .load_filters_file(path)
            .await
            .with_context(|| format!("failed to load filters from {}", path))?;
        info!("Loaded {} filters from {}", count, path);
    }

    let indexer = Arc::new(TenantIndexer::new(dm.clone()));
    let service = web::Data::new(
        AttributeService::new(dm, filters, indexer, &config)
            .context("failed to build attribute service")?,
    );

    // CORS configuration
    let cors_origins = env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let bind_addr = config.server_addr();
    let workers = config.server.workers.max(1);
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origins: Vec<&str> = cors_origins_inner.split(',').collect();
                if let Ok(origin_str) = origin.to_str() {
                    origins.iter().any(|o| o.trim() == origin_str)
                } else {
                    false
                }
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .app_data(service.clone())
            .app_data(web::PayloadConfig::new(1024 * 1024))
            // Middleware
            .wrap(cors)
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
            // Root redirect to health
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
    .client_request_timeout(std::time::Duration::from_secs(config.server.timeout_secs))
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
