//! Application layer error types

use crate::domain::DomainError;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Failures of the remote listing and file download steps
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestionError {
    /// Transport failure, or a non-success status once retries are exhausted
    #[error("remote unavailable: {url}: {message}")]
    RemoteUnavailable {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// A body arrived but matches no recognized shape
    #[error("malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("invalid repository reference: {reference}")]
    InvalidReference { reference: String },

    /// A fetch or coordinator task panicked before producing a result
    #[error("ingestion task interrupted: {message}")]
    Interrupted { message: String },
}

impl IngestionError {
    pub fn status(&self) -> Option<u16> {
        match self {
            IngestionError::RemoteUnavailable { status, .. } => *status,
            _ => None,
        }
    }

    pub(crate) fn transport(url: &str, error: &reqwest::Error) -> Self {
        IngestionError::RemoteUnavailable {
            url: url.to_string(),
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }

    pub(crate) fn interrupted(error: &tokio::task::JoinError) -> Self {
        IngestionError::Interrupted {
            message: error.to_string(),
        }
    }

    pub(crate) fn http_status(url: &str, status: reqwest::StatusCode) -> Self {
        IngestionError::RemoteUnavailable {
            url: url.to_string(),
            status: Some(status.as_u16()),
            message: status.to_string(),
        }
    }
}

/// Persistence sink failures, opaque to the ingestion core
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid stored value in column {column}: {message}")]
    Corrupt { column: String, message: String },
}

impl ApplicationError {
    /// Get the error type as a string for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ApplicationError::Domain(_) => "domain_error",
            ApplicationError::Ingestion(IngestionError::InvalidReference { .. }) => {
                "invalid_reference"
            }
            ApplicationError::Ingestion(IngestionError::RemoteUnavailable { .. }) => {
                "remote_unavailable"
            }
            ApplicationError::Ingestion(IngestionError::MalformedResponse { .. }) => {
                "malformed_response"
            }
            ApplicationError::Ingestion(IngestionError::Interrupted { .. }) => {
                "ingestion_interrupted"
            }
            ApplicationError::Storage(_) => "storage_error",
            ApplicationError::InvalidRequest { .. } => "invalid_request",
            ApplicationError::Configuration { .. } => "configuration_error",
        }
    }
}
