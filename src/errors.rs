use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Wire format for every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Bad Request",
    "message": "Supplier name must be at least 3 characters",
    "details": null,
    "request_id": "req-7f3a2c",
    "timestamp": "2026-08-21T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Canonical reason for the HTTP status
    #[schema(example = "Bad Request")]
    pub error: String,
    /// What went wrong, safe to show to callers
    #[schema(example = "Supplier name must be at least 3 characters")]
    pub message: String,
    /// Field-level hints, when validation produced any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Identifier correlating this response with the server logs
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-7f3a2c")]
    pub request_id: Option<String>,
    /// RFC 3339 moment the error was produced
    #[schema(example = "2026-08-21T10:30:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No handler registered for identifier {0}")]
    HandlerNotFound(String),

    #[error("No handler registered for query {0}")]
    QueryHandlerNotFound(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Database failure with a caller-provided description.
    pub fn db_error(message: impl Into<String>) -> Self {
        ServiceError::DatabaseError(DbErr::Custom(message.into()))
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::DatabaseError(_)
            | Self::HandlerNotFound(_)
            | Self::QueryHandlerNotFound(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::MigrationError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message carried in HTTP responses. Server-side failures collapse to a
    /// generic message so driver and dispatch details stay out of responses.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::HandlerNotFound(_)
            | Self::QueryHandlerNotFound(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::MigrationError(_)
            | Self::Other(_) => "Internal server error".to_string(),
            Self::NotFound(_) | Self::ValidationError(_) => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let reason = status.canonical_reason().unwrap_or("Error");
        let request_id = crate::tracing::current_request_id();

        let body = ErrorResponse {
            error: reason.to_string(),
            message: self.response_message(),
            details: None,
            request_id: request_id.map(|rid| rid.as_str().to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracing::{scope_request_id, RequestId};
    use axum::{body::to_bytes, http::StatusCode};

    async fn respond_within_scope(err: ServiceError, rid: &str) -> (StatusCode, ErrorResponse) {
        let response = scope_request_id(RequestId::new(rid), async { err.into_response() }).await;
        let status = response.status();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn not_found_responses_carry_the_request_id() {
        let err = ServiceError::NotFound("Supplier not found".into());
        let (status, payload) = respond_within_scope(err, "req-123").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
        assert_eq!(payload.message, "Not found: Supplier not found");
    }

    #[tokio::test]
    async fn rejected_input_responses_carry_the_request_id() {
        let err = ServiceError::ValidationError("bad input".into());
        let (status, payload) = respond_within_scope(err, "req-api-42").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload.request_id.as_deref(), Some("req-api-42"));
    }

    #[test]
    fn each_variant_maps_to_its_status() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::HandlerNotFound("suppliers.create".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::db_error("Error saving supplier").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn handler_not_found_names_the_identifier() {
        let err = ServiceError::HandlerNotFound("suppliers.create".into());
        assert_eq!(
            err.to_string(),
            "No handler registered for identifier suppliers.create"
        );

        let err = ServiceError::QueryHandlerNotFound("suppliers.detail".into());
        assert_eq!(
            err.to_string(),
            "No handler registered for query suppliers.detail"
        );
    }

    #[test]
    fn database_errors_mask_details_in_responses() {
        let err = ServiceError::db_error("Error saving supplier");
        assert!(err.to_string().contains("Error saving supplier"));
        assert_eq!(err.response_message(), "Database error");
    }
}
