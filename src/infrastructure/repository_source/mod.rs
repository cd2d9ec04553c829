//! Repository Source Abstractions
//!
//! Traits for listing a remote repository's top-level entries and for
//! downloading scan files, plus their GitHub/HTTP implementations.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, header};
use std::time::Duration;

pub mod file_fetcher;
pub mod github_client;
pub mod url_parser;
pub use file_fetcher::HttpScanFileFetcher;
pub use github_client::GitHubContentsClient;
pub use url_parser::{ParsedRepositoryUrl, parse_github_repo_url, resolve_listing_url};

use crate::application::errors::{ApplicationError, IngestionError};
use crate::config::GitHubConfig;
use crate::domain::{FileDescriptor, ScanRecord};

pub type IngestionResult<T> = Result<T, IngestionError>;

/// Lists the top-level entries of a remote repository. No retries.
#[async_trait]
pub trait RepositoryListingClient: Send + Sync {
    async fn list(&self, repository: &str) -> IngestionResult<Vec<FileDescriptor>>;
}

/// Downloads one scan file and turns it into canonical records.
///
/// A file either yields all of its records or fails as a whole.
#[async_trait]
pub trait ScanFileFetcher: Send + Sync {
    async fn fetch(&self, name: &str, download_url: &str) -> IngestionResult<Vec<ScanRecord>>;
}

/// Credentials and client settings shared by listing and download requests
#[derive(Clone)]
pub struct RemoteHttp {
    client: Client,
    token: Option<String>,
}

impl RemoteHttp {
    pub fn new(config: &GitHubConfig) -> Result<Self, ApplicationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApplicationError::Configuration {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            token: config.token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }
}
