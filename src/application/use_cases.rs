//! Use cases representing application workflows

use std::sync::Arc;
use tracing::{debug, info};

use super::errors::{ApplicationError, IngestionError};
use super::services::{IngestionOutcome, IngestionService};
use crate::domain::{DomainError, ScanRequest, VulnerabilityEntry};
use crate::infrastructure::ScanRecordRepository;

/// Ingest a repository and persist every record it yields
pub struct ScanRepository {
    ingestion: Arc<dyn IngestionService>,
    repository: Arc<dyn ScanRecordRepository>,
}

impl ScanRepository {
    pub fn new(
        ingestion: Arc<dyn IngestionService>,
        repository: Arc<dyn ScanRecordRepository>,
    ) -> Self {
        Self {
            ingestion,
            repository,
        }
    }

    /// Records are stored one at a time in outcome order. The first storage
    /// error ends the call; records already stored stay stored.
    ///
    /// The run and its stores happen on a spawned task, so a caller that
    /// gives up (timeout, client disconnect) leaves them to finish.
    pub async fn execute(
        &self,
        request: &ScanRequest,
    ) -> Result<IngestionOutcome, ApplicationError> {
        if request.repository.trim().is_empty() {
            return Err(DomainError::InvalidInput {
                field: "repo".to_string(),
                message: "repository reference must not be empty".to_string(),
            }
            .into());
        }

        let ingestion = self.ingestion.clone();
        let repository = self.repository.clone();
        let request = request.clone();
        let run = tokio::spawn(ingest_and_store(ingestion, repository, request));

        run.await.map_err(|e| IngestionError::interrupted(&e))?
    }
}

async fn ingest_and_store(
    ingestion: Arc<dyn IngestionService>,
    repository: Arc<dyn ScanRecordRepository>,
    request: ScanRequest,
) -> Result<IngestionOutcome, ApplicationError> {
    let outcome = ingestion.run(&request).await?;

    for (stored, record) in outcome.records.iter().enumerate() {
        repository.store(record).await.inspect_err(|e| {
            debug!(stored, file = %record.source_file, "storage stopped: {}", e);
        })?;
    }

    info!(
        repository = %request.repository,
        stored = outcome.records.len(),
        "scan records stored"
    );
    Ok(outcome)
}

/// Look up stored vulnerabilities by exact severity
pub struct QueryVulnerabilities {
    repository: Arc<dyn ScanRecordRepository>,
}

impl QueryVulnerabilities {
    pub fn new(repository: Arc<dyn ScanRecordRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        severity: &str,
    ) -> Result<Vec<VulnerabilityEntry>, ApplicationError> {
        Ok(self.repository.find_by_severity(severity).await?)
    }
}
