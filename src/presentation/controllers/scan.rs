//! Scan ingestion and severity query endpoints

use axum::{
    extract::{State, rejection::JsonRejection},
    http::HeaderValue,
    response::{IntoResponse, Json, Response},
};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::application::{QueryVulnerabilities, ScanRepository, errors::ApplicationError};
use crate::domain::ScanRequest;
use crate::presentation::controllers::AppState;
use crate::presentation::models::{
    ErrorResponse, QueryRequestDto, ScanRecordDto, ScanRequestDto, VulnerabilityDto,
};

/// Response header listing files that failed during a scan. Names are
/// percent-encoded and comma separated.
pub const FAILED_FILES_HEADER: &str = "x-failed-files";

/// Escaped in failed file names so the comma stays an unambiguous separator
const FILE_NAME_ESCAPES: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'%').add(b',');

/// Header value for the failed-files manifest, `None` when nothing failed
pub fn failed_files_header(files: &[&str]) -> Option<HeaderValue> {
    if files.is_empty() {
        return None;
    }
    let encoded = files
        .iter()
        .map(|name| utf8_percent_encode(name, FILE_NAME_ESCAPES).to_string())
        .collect::<Vec<_>>()
        .join(",");
    match HeaderValue::from_str(&encoded) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(files = %encoded, "failed file names not sent: {}", e);
            None
        }
    }
}

/// Ingest every eligible scan file of a repository
#[utoipa::path(
    post,
    path = "/scan",
    tag = "scan",
    request_body = ScanRequestDto,
    responses(
        (status = 200, description = "Records ingested and stored", body = Vec<ScanRecordDto>,
            headers(("x-failed-files" = String, description = "Percent-encoded, comma separated names of files skipped because they failed"))),
        (status = 400, description = "Invalid request or repository reference", body = ErrorResponse),
        (status = 502, description = "Repository listing failed", body = ErrorResponse),
        (status = 500, description = "Storing records failed", body = ErrorResponse)
    )
)]
pub async fn scan_repository(
    State(app_state): State<AppState>,
    payload: Result<Json<ScanRequestDto>, JsonRejection>,
) -> Result<Response, ApplicationError> {
    let Json(request) = payload?;
    let request: ScanRequest = request.into();

    let use_case = ScanRepository::new(
        app_state.ingestion_service.clone(),
        app_state.scan_repository.clone(),
    );
    let outcome = use_case.execute(&request).await?;

    let failed = failed_files_header(&outcome.failed_files());
    let records: Vec<ScanRecordDto> = outcome.records.into_iter().map(Into::into).collect();

    let mut response = Json(records).into_response();
    if let Some(value) = failed {
        response.headers_mut().insert(FAILED_FILES_HEADER, value);
    }
    Ok(response)
}

/// Find stored vulnerabilities with an exact severity
#[utoipa::path(
    post,
    path = "/query",
    tag = "query",
    request_body = QueryRequestDto,
    responses(
        (status = 200, description = "Matching vulnerabilities", body = Vec<VulnerabilityDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Reading stored records failed", body = ErrorResponse)
    )
)]
pub async fn query_vulnerabilities(
    State(app_state): State<AppState>,
    payload: Result<Json<QueryRequestDto>, JsonRejection>,
) -> Result<Json<Vec<VulnerabilityDto>>, ApplicationError> {
    let Json(request) = payload?;

    let entries = QueryVulnerabilities::new(app_state.scan_repository.clone())
        .execute(&request.filters.severity)
        .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
