//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{ScanRecord, ScanRequest, VulnerabilityEntry};

/// Request model for ingesting a repository of scan files
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequestDto {
    /// Repository reference: a GitHub URL, `owner/repo`, or a listing endpoint URL
    #[schema(example = "https://github.com/velancio/vulnerability_scans")]
    pub repo: String,

    /// Optional allowlist of file names to ingest
    #[schema(example = r#"["vulnscan15.json", "vulnscan1011.json"]"#)]
    pub files: Option<Vec<String>>,
}

impl From<ScanRequestDto> for ScanRequest {
    fn from(dto: ScanRequestDto) -> Self {
        ScanRequest::new(dto.repo).with_files(dto.files.unwrap_or_default())
    }
}

/// One stored scan record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanRecordDto {
    /// Vulnerability collection extracted from the file, or null
    #[serde(rename = "scanResults")]
    #[schema(example = r#"[{"id": "CVE-2024-1234", "severity": "HIGH"}]"#)]
    pub scan_results: Option<serde_json::Value>,

    /// Name of the file the record was read from
    #[serde(rename = "sourceFile")]
    #[schema(example = "vulnscan15.json")]
    pub source_file: String,

    /// Ingestion time
    #[serde(rename = "scanTime")]
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub scan_time: DateTime<Utc>,
}

impl From<ScanRecord> for ScanRecordDto {
    fn from(record: ScanRecord) -> Self {
        Self {
            scan_results: record.payload,
            source_file: record.source_file,
            scan_time: record.scan_time,
        }
    }
}

/// Request model for severity queries. Missing filters query the empty
/// severity.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct QueryRequestDto {
    #[serde(default)]
    pub filters: QueryFiltersDto,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct QueryFiltersDto {
    /// Exact, case-sensitive severity to match
    #[serde(default)]
    #[schema(example = "HIGH")]
    pub severity: String,
}

/// A vulnerability finding matched by a query
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VulnerabilityDto {
    #[schema(example = "CVE-2024-1234")]
    pub id: String,
    #[schema(example = "HIGH")]
    pub severity: String,
    #[schema(example = 8.5)]
    pub cvss: f64,
    #[schema(example = "fixed")]
    pub status: String,
    #[schema(example = "openssl")]
    pub package_name: String,
    #[schema(example = "1.1.1t-r0")]
    pub current_version: String,
    #[schema(example = "1.1.1u-r0")]
    pub fixed_version: String,
    #[schema(example = "Buffer overflow vulnerability in OpenSSL")]
    pub description: String,
    #[schema(example = "2024-01-24T00:00:00Z")]
    pub published_date: String,
    #[schema(example = "https://nvd.nist.gov/vuln/detail/CVE-2024-1234")]
    pub link: String,
    #[schema(example = r#"["Remote Code Execution", "High CVSS Score"]"#)]
    pub risk_factors: Vec<String>,
}

impl From<VulnerabilityEntry> for VulnerabilityDto {
    fn from(entry: VulnerabilityEntry) -> Self {
        Self {
            id: entry.id,
            severity: entry.severity,
            cvss: entry.cvss,
            status: entry.status,
            package_name: entry.package_name,
            current_version: entry.current_version,
            fixed_version: entry.fixed_version,
            description: entry.description,
            published_date: entry.published_date,
            link: entry.link,
            risk_factors: entry.risk_factors,
        }
    }
}

/// Error response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "REMOTE_UNAVAILABLE")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "Remote repository is unavailable")]
    pub message: String,

    /// Additional error context
    #[schema(example = r#"{"error": "remote unavailable: https://api.github.com/repos/o/r/contents: 404 Not Found"}"#)]
    pub details: Option<serde_json::Value>,

    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: Uuid,

    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service health status
    #[schema(example = "healthy")]
    pub status: String,

    /// Current service version
    #[schema(example = "0.1.0")]
    pub version: String,

    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,

    /// Dependency status and build information
    #[schema(example = r#"{"database": {"status": "healthy"}}"#)]
    pub details: Option<serde_json::Value>,
}
