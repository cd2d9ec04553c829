//! GitHub contents API listing client

use async_trait::async_trait;
use reqwest::header;
use tracing::{debug, instrument};

use super::{IngestionResult, RemoteHttp, RepositoryListingClient, resolve_listing_url};
use crate::application::errors::IngestionError;
use crate::domain::FileDescriptor;

/// Lists a repository's top-level path through the GitHub contents API
pub struct GitHubContentsClient {
    http: RemoteHttp,
    api_base_url: String,
}

impl GitHubContentsClient {
    pub fn new(http: RemoteHttp, api_base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_base_url: api_base_url.into(),
        }
    }

    pub fn listing_url(&self, repository: &str) -> IngestionResult<String> {
        resolve_listing_url(repository, &self.api_base_url).ok_or_else(|| {
            IngestionError::InvalidReference {
                reference: repository.to_string(),
            }
        })
    }
}

#[async_trait]
impl RepositoryListingClient for GitHubContentsClient {
    #[instrument(skip(self))]
    async fn list(&self, repository: &str) -> IngestionResult<Vec<FileDescriptor>> {
        let url = self.listing_url(repository)?;
        debug!(%url, "listing repository contents");

        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| IngestionError::transport(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestionError::http_status(&url, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IngestionError::transport(&url, &e))?;

        let entries: Vec<FileDescriptor> =
            serde_json::from_slice(&body).map_err(|e| IngestionError::MalformedResponse {
                url: url.clone(),
                message: e.to_string(),
            })?;

        debug!(%url, entries = entries.len(), "listing complete");
        Ok(entries)
    }
}
