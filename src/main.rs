use std::sync::Arc;

use axum::{routing::get, Router};
use http::HeaderValue;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing::{info, warn};

use supplierhub_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await?;
    }

    api::metrics::init_metrics();

    let db = Arc::new(db_pool);
    let logger = api::logging::setup_logger(api::logging::LoggerConfig::default());
    let services = api::handlers::AppServices::new(db.clone(), logger);

    let state = api::AppState {
        db: db.clone(),
        config: cfg.clone(),
        services,
    };

    let cors = cors_layer(&cfg)?;

    let app = Router::<api::AppState>::new()
        .route("/", get(|| async { "supplierhub-api up" }))
        .route("/health", get(api::health_check))
        .route("/metrics", get(api::metrics::metrics_handler))
        .route("/metrics/json", get(serve_metrics_json))
        .nest("/api/v1", api::api_v1_routes())
        .merge(api::openapi::swagger_ui())
        .layer(api::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Outermost so every response carries an id, error responses included
        .layer(axum::middleware::from_fn(
            api::tracing::request_id_middleware,
        ))
        .with_state(state);

    let addr = format!("{}:{}", cfg.host, cfg.port);
    info!("🚀 supplierhub-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing database pool");
    match Arc::try_unwrap(db) {
        Ok(pool) => api::db::close_pool(pool).await?,
        Err(_) => warn!("Database pool still referenced at shutdown; skipping explicit close"),
    }

    Ok(())
}

async fn serve_metrics_json() -> axum::Json<serde_json::Value> {
    axum::Json(api::metrics::metrics_json_handler().await)
}

/// Builds the CORS layer from the configured allowlist. `load_config` has
/// already refused configs that leave CORS unset outside development.
fn cors_layer(cfg: &api::config::AppConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if trimmed.is_empty() {
                None
            } else {
                HeaderValue::from_str(trimmed).ok()
            }
        })
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials));
    }

    if cfg.should_allow_permissive_cors() {
        info!("No CORS allowlist configured; serving with a permissive policy");
        return Ok(CorsLayer::permissive());
    }

    // Origins were configured but none parsed as a header value
    Err("No usable CORS origins; check APP__CORS_ALLOWED_ORIGINS".into())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
