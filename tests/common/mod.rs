use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use supplierhub_api::{config::AppConfig, db, handlers::AppServices, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper harness for spinning up an application state backed by a temporary
/// SQLite database. Each instance gets its own file, so tests stay isolated
/// under parallel execution.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: TempDir,
}

impl TestApp {
    /// Boots the API against a throwaway SQLite file.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir for the test database");
        let db_path = db_dir.path().join("suppliers.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            0,
            "development".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("test database should connect");

        db::run_migrations(&pool)
            .await
            .expect("migrations should apply cleanly");

        let db_arc = Arc::new(pool);
        let base_logger = supplierhub_api::logging::setup_logger(
            supplierhub_api::logging::LoggerConfig::default(),
        );
        let services = AppServices::new(db_arc.clone(), base_logger);

        let state = AppState {
            db: db_arc,
            config: cfg,
            services,
        };

        // Mirror the production router, minus compression and CORS.
        let router = Router::new()
            .route("/health", get(supplierhub_api::health_check))
            .route("/metrics", get(supplierhub_api::metrics::metrics_handler))
            .route(
                "/metrics/json",
                get(|| async {
                    axum::Json(supplierhub_api::metrics::metrics_json_handler().await)
                }),
            )
            .nest("/api/v1", supplierhub_api::api_v1_routes())
            .merge(supplierhub_api::openapi::swagger_ui())
            .layer(axum::middleware::from_fn(
                supplierhub_api::tracing::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
        }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    /// Send a request with extra headers, for exercising request id echo and
    /// content negotiation paths.
    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("request should build");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router should respond")
    }

    /// Create a supplier through the API and return its response `data`.
    pub async fn seed_supplier(&self, name: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/v1/suppliers",
                Some(json!({
                    "name": name,
                    "telephone": "+1-555-0100",
                    "social_media": "@supplierhub",
                })),
            )
            .await;
        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "failed to seed supplier {}",
            name
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read seed response");
        let body: Value = serde_json::from_slice(&bytes).expect("seed response is json");
        body["data"].clone()
    }
}
