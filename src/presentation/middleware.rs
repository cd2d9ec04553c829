//! HTTP middleware for the web server

use axum::{
    extract::rejection::JsonRejection,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::time::Instant;
use uuid::Uuid;

use crate::application::errors::{ApplicationError, IngestionError};
use crate::presentation::models::ErrorResponse;

/// Error handling middleware
impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApplicationError::Domain(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                "Request failed validation",
            ),
            ApplicationError::InvalidRequest { .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
                "Request body could not be decoded",
            ),
            ApplicationError::Ingestion(IngestionError::InvalidReference { .. }) => (
                StatusCode::BAD_REQUEST,
                "INVALID_REFERENCE",
                "Repository reference could not be resolved",
            ),
            ApplicationError::Ingestion(IngestionError::RemoteUnavailable { .. }) => (
                StatusCode::BAD_GATEWAY,
                "REMOTE_UNAVAILABLE",
                "Remote repository is unavailable",
            ),
            ApplicationError::Ingestion(IngestionError::MalformedResponse { .. }) => (
                StatusCode::BAD_GATEWAY,
                "MALFORMED_RESPONSE",
                "Remote repository returned an unexpected response",
            ),
            ApplicationError::Ingestion(IngestionError::Interrupted { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INGESTION_INTERRUPTED",
                "Ingestion did not complete",
            ),
            ApplicationError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Failed to store scan records",
            ),
            ApplicationError::Configuration { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                "Service configuration error",
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, error_type = self.error_type(), "request failed");
        } else {
            tracing::debug!(error = %self, error_type = self.error_type(), "request rejected");
        }

        let error_response = ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            details: Some(serde_json::json!({ "error": self.to_string() })),
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<JsonRejection> for ApplicationError {
    fn from(rejection: JsonRejection) -> Self {
        ApplicationError::InvalidRequest {
            message: rejection.body_text(),
        }
    }
}

/// Request logging middleware with timing and request ID
pub async fn logging_middleware(request: Request<axum::body::Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let response = next.run(request).await;
    let duration = start_time.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
