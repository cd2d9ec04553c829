//! Application services for orchestrating business logic

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};

use super::errors::IngestionError;
use crate::domain::{EligibleFile, FileEligibility, IngestionPhase, ScanRecord, ScanRequest};
use crate::infrastructure::{RepositoryListingClient, ScanFileFetcher};

/// A file whose download or decode failed during a run
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub file: String,
    pub error: IngestionError,
}

/// Result of one ingestion run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionOutcome {
    /// Records from every file that succeeded, in completion order
    pub records: Vec<ScanRecord>,
    /// Files that were isolated from the result
    pub failures: Vec<FileFailure>,
}

impl IngestionOutcome {
    pub fn failed_files(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.file.as_str()).collect()
    }
}

/// Lists a repository and fetches its eligible scan files concurrently
#[async_trait]
pub trait IngestionService: Send + Sync {
    /// Run one ingestion. Only a listing failure fails the run; per-file
    /// failures are reported in [`IngestionOutcome::failures`].
    async fn run(&self, request: &ScanRequest) -> Result<IngestionOutcome, IngestionError>;
}

/// Fan-out coordinator over a listing client and a file fetcher
pub struct IngestionServiceImpl {
    listing: Arc<dyn RepositoryListingClient>,
    fetcher: Arc<dyn ScanFileFetcher>,
    file_suffix: String,
    max_concurrent: Option<usize>,
}

impl IngestionServiceImpl {
    pub fn new(
        listing: Arc<dyn RepositoryListingClient>,
        fetcher: Arc<dyn ScanFileFetcher>,
        file_suffix: impl Into<String>,
        max_concurrent: Option<usize>,
    ) -> Self {
        Self {
            listing,
            fetcher,
            file_suffix: file_suffix.into(),
            max_concurrent,
        }
    }
}

/// Spawn one fetch task per eligible file and wait for all of them.
///
/// Owns everything it touches so it can run detached from the caller: once
/// fan-out begins, dropping the caller's future does not abort any fetch.
async fn fan_out(
    fetcher: Arc<dyn ScanFileFetcher>,
    max_concurrent: Option<usize>,
    files: Vec<EligibleFile>,
    mut phase: IngestionPhase,
) -> (IngestionPhase, IngestionOutcome) {
    let semaphore = max_concurrent.map(|limit| Arc::new(Semaphore::new(limit.max(1))));
    let mut join_set: JoinSet<Result<Vec<ScanRecord>, IngestionError>> = JoinSet::new();
    let mut names: HashMap<task::Id, String> = HashMap::with_capacity(files.len());

    for file in files {
        let permit = match &semaphore {
            Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
            None => None,
        };
        let fetcher = fetcher.clone();
        let name = file.name.clone();

        let handle = join_set.spawn(async move {
            let _permit = permit;
            fetcher.fetch(&file.name, &file.download_url).await
        });
        names.insert(handle.id(), name);
    }

    advance(&mut phase, IngestionPhase::Draining);

    let mut outcome = IngestionOutcome::default();
    while let Some(joined) = join_set.join_next_with_id().await {
        let (id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(join_error) => {
                error!(error = %join_error, "fetch task aborted");
                (join_error.id(), Err(IngestionError::interrupted(&join_error)))
            }
        };
        let file = names.remove(&id).unwrap_or_default();
        match result {
            Ok(records) => outcome.records.extend(records),
            Err(error) => {
                warn!(file = %file, error = %error, "scan file skipped");
                outcome.failures.push(FileFailure { file, error });
            }
        }
    }
    (phase, outcome)
}

#[async_trait]
impl IngestionService for IngestionServiceImpl {
    async fn run(&self, request: &ScanRequest) -> Result<IngestionOutcome, IngestionError> {
        let started = Instant::now();
        let mut phase = IngestionPhase::Idle;

        advance(&mut phase, IngestionPhase::Listing);
        let listing = match self.listing.list(&request.repository).await {
            Ok(listing) => listing,
            Err(e) => {
                advance(&mut phase, IngestionPhase::Failed);
                error!(repository = %request.repository, error = %e, "repository listing failed");
                return Err(e);
            }
        };

        let listed = listing.len();
        let eligible =
            FileEligibility::new(&self.file_suffix, &request.file_allowlist).select(listing);
        debug!(listed, eligible = eligible.len(), "selected scan files");

        advance(&mut phase, IngestionPhase::FanningOut);
        let coordinator = tokio::spawn(fan_out(
            self.fetcher.clone(),
            self.max_concurrent,
            eligible,
            phase,
        ));
        let (drained, outcome) = coordinator.await.map_err(|e| {
            error!(repository = %request.repository, error = %e, "ingestion coordinator aborted");
            IngestionError::interrupted(&e)
        })?;
        phase = drained;
        advance(&mut phase, IngestionPhase::Done);

        info!(
            repository = %request.repository,
            records = outcome.records.len(),
            failed_files = outcome.failures.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "ingestion run complete"
        );
        Ok(outcome)
    }
}

fn advance(phase: &mut IngestionPhase, next: IngestionPhase) {
    debug_assert!(phase.can_advance_to(next), "{} -> {}", phase, next);
    debug!(from = %phase, to = %next, "ingestion phase");
    *phase = next;
}
