//! Health check controller

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::json;
use std::time::Instant;

use crate::presentation::controllers::AppState;
use crate::presentation::models::HealthResponse;

/// Service health with database status and build information
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(
    State(app_state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let start_time = Instant::now();
    let database = match app_state.scan_repository.ping().await {
        Ok(()) => json!({ "status": "healthy" }),
        Err(e) => json!({ "status": "unhealthy", "message": e.to_string() }),
    };
    let healthy = database["status"] == "healthy";

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        details: Some(json!({
            "dependencies": { "database": database },
            "check_duration_ms": start_time.elapsed().as_millis() as u64,
            "build_info": {
                "version": env!("CARGO_PKG_VERSION"),
                "build_date": option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown")
            }
        })),
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Kubernetes liveness probe endpoint
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive")
    )
)]
pub async fn liveness_probe() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe endpoint
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready to accept traffic"),
        (status = 503, description = "Service is not ready")
    )
)]
pub async fn readiness_probe(State(app_state): State<AppState>) -> StatusCode {
    match app_state.scan_repository.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
