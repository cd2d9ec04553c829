//! Route definitions and server setup

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    response::Json,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::Config;
use crate::presentation::{
    controllers::{
        AppState,
        health::{health_check, liveness_probe, readiness_probe},
        scan::{query_vulnerabilities, scan_repository},
    },
    middleware::logging_middleware,
    models::*,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::scan::scan_repository,
        crate::presentation::controllers::scan::query_vulnerabilities,
        crate::presentation::controllers::health::health_check,
        crate::presentation::controllers::health::liveness_probe,
        crate::presentation::controllers::health::readiness_probe
    ),
    components(
        schemas(
            ScanRequestDto,
            ScanRecordDto,
            QueryRequestDto,
            QueryFiltersDto,
            VulnerabilityDto,
            ErrorResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "scan", description = "Ingest vulnerability scan files from a repository"),
        (name = "query", description = "Query stored vulnerabilities"),
        (name = "health", description = "Service health endpoints")
    ),
    info(
        title = "Scan Ingest API",
        version = "0.1.0",
        description = "Ingests vulnerability scan result files from a remote repository and serves severity queries over them.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

/// Create the application router with its middleware stack
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    let server = &config.server;
    let api_routes = Router::new()
        .route("/scan", post(scan_repository))
        .route("/query", post(query_vulnerabilities));

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe));

    let mut router = Router::new().merge(api_routes).merge(health_routes);
    if server.enable_docs {
        router = router.route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    router
        .layer(
            ServiceBuilder::new()
                // HTTP tracing
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&server.allowed_origins))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    server.request_timeout_seconds,
                )))
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(app_state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::HeaderName::from_static(
            crate::presentation::controllers::scan::FAILED_FILES_HEADER,
        )])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    // Unparseable origins are dropped; an empty list admits no external origin
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
