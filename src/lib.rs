//! Library crate for the SupplierHub API.
//!
//! Message dispatch lives in [`commands`], [`queries`] and [`events`].
//! HTTP handlers sit on top of [`services`], which reach the database
//! through [`repositories`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod queries;
pub mod repositories;
pub mod search;
pub mod services;
pub mod tracing;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

/// Envelope wrapped around every JSON body the API returns.
///
/// `data` is populated on success, `message` on failure. `meta` carries the
/// request id so a body can be matched to its log lines.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl<T> ApiResponse<T> {
    fn stamped(success: bool) -> Self {
        Self {
            success,
            data: None,
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::stamped(true)
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::stamped(false)
        }
    }
}

/// Request-scoped metadata stamped onto each envelope.
#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        let request_id = crate::tracing::current_request_id();
        Self {
            request_id: request_id.map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Result alias used by handlers that answer with a JSON envelope.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .merge(handlers::suppliers::supplier_routes())
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let status = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "git": option_env!("GIT_HASH").unwrap_or("unknown"),
        "build_time": option_env!("BUILD_TIME").unwrap_or("unknown"),
        "service": "supplierhub-api",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.environment,
    });

    Ok(Json(ApiResponse::success(status)))
}

/// Liveness probe. Reports per-dependency checks next to an overall verdict.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let database = if state.db.ping().await.is_ok() {
        "healthy"
    } else {
        "unhealthy"
    };

    Ok(Json(ApiResponse::success(json!({
        "status": database,
        "checks": {
            "database": database,
        },
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}
