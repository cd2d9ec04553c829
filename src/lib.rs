//! Scan Ingest - concurrent ingestion of vulnerability scan result files
//!
//! Lists a remote repository, fetches its JSON scan files concurrently,
//! normalizes them into canonical records, stores them in SQLite and answers
//! severity queries over the stored findings. The crate follows a
//! Domain-Driven Design (DDD) layering.

use std::sync::Arc;

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use config::Config;
pub use logging::init_tracing;

use application::{ApplicationError, IngestionServiceImpl};
use infrastructure::{
    GitHubContentsClient, HttpScanFileFetcher, RemoteHttp, RetryPolicy, ScanRecordRepository,
    SqliteScanRecordRepository,
};
use presentation::{AppState, create_router};

/// Wire the ingestion pipeline over the given persistence sink
pub fn build_app_state(
    config: &Config,
    scan_repository: Arc<dyn ScanRecordRepository>,
) -> Result<AppState, ApplicationError> {
    let http = RemoteHttp::new(&config.github)?;
    let listing = Arc::new(GitHubContentsClient::new(
        http.clone(),
        config.github.api_base_url.clone(),
    ));
    let fetcher = Arc::new(HttpScanFileFetcher::new(
        http,
        RetryPolicy::with_delay(config.ingestion.retry_delay()),
    ));
    let ingestion_service = Arc::new(IngestionServiceImpl::new(
        listing,
        fetcher,
        config.ingestion.file_suffix.clone(),
        config.ingestion.max_concurrent_fetches,
    ));

    Ok(AppState {
        ingestion_service,
        scan_repository,
    })
}

/// Build the full HTTP application backed by the configured SQLite database
pub async fn create_app(config: Config) -> Result<axum::Router, ApplicationError> {
    let repository = SqliteScanRecordRepository::connect(&config.database).await?;
    repository
        .init_schema(config.database.reset_on_startup)
        .await?;

    let app_state = build_app_state(&config, Arc::new(repository))?;
    Ok(create_router(app_state, &config))
}
