//! Scan file download and decoding

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::{IngestionResult, RemoteHttp, ScanFileFetcher};
use crate::application::errors::IngestionError;
use crate::domain::{PayloadNormalizer, ScanRecord};
use crate::infrastructure::resilience::{AttemptError, RetryPolicy, retry_on_status};

/// Body shapes a scan file may take. Tried in declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Many(Vec<Map<String, Value>>),
    One(Map<String, Value>),
}

impl RawPayload {
    fn into_objects(self) -> Vec<Map<String, Value>> {
        match self {
            RawPayload::Many(objects) => objects,
            RawPayload::One(object) => vec![object],
        }
    }
}

/// Decode a scan file body into canonical records stamped with `name` and
/// the current time. Either every object becomes a record or the whole body
/// is rejected.
pub fn decode_scan_file(name: &str, url: &str, body: &[u8]) -> IngestionResult<Vec<ScanRecord>> {
    let payload: RawPayload =
        serde_json::from_slice(body).map_err(|e| IngestionError::MalformedResponse {
            url: url.to_string(),
            message: format!("expected a scan object or an array of scan objects: {}", e),
        })?;

    let scan_time = Utc::now();
    Ok(payload
        .into_objects()
        .iter()
        .map(|raw| PayloadNormalizer::to_record(raw, name, scan_time))
        .collect())
}

/// Downloads scan files over HTTP with a single fixed-delay retry on
/// non-success statuses
pub struct HttpScanFileFetcher {
    http: RemoteHttp,
    retry: RetryPolicy,
}

impl HttpScanFileFetcher {
    pub fn new(http: RemoteHttp, retry: RetryPolicy) -> Self {
        Self { http, retry }
    }

    async fn download(&self, url: &str) -> IngestionResult<Vec<u8>> {
        retry_on_status(&self.retry, || async {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| AttemptError::Fatal(IngestionError::transport(url, &e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(AttemptError::Retryable(IngestionError::http_status(
                    url, status,
                )));
            }

            response
                .bytes()
                .await
                .map(|bytes| bytes.to_vec())
                .map_err(|e| AttemptError::Fatal(IngestionError::transport(url, &e)))
        })
        .await
    }
}

#[async_trait]
impl ScanFileFetcher for HttpScanFileFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, name: &str, download_url: &str) -> IngestionResult<Vec<ScanRecord>> {
        let body = self.download(download_url).await?;
        let records = decode_scan_file(name, download_url, &body)?;
        debug!(file = name, records = records.len(), "scan file decoded");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{Router, http::StatusCode, routing::get};
    use mockito::Server;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    const ARRAY_BODY: &str = r#"[{"scanResults": {"vulnerabilities": [{"id": "vuln1", "severity": "HIGH"}]}, "sourceFile": "file1", "scanTime": "2020-01-01T00:00:00Z"}]"#;
    const OBJECT_BODY: &str = r#"{"scanResults": {"vulnerabilities": [{"id": "vuln1", "severity": "HIGH"}]}, "sourceFile": "file1", "scanTime": "2020-01-01T00:00:00Z"}"#;

    fn fetcher(delay: Duration) -> HttpScanFileFetcher {
        let http = RemoteHttp::new(&Config::default().github).unwrap();
        HttpScanFileFetcher::new(http, RetryPolicy::with_delay(delay))
    }

    /// Serves `/flaky.json`, answering 503 to the first `failures` requests
    async fn flaky_server(failures: u32) -> (String, Arc<AtomicU32>) {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/flaky.json",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < failures {
                        (StatusCode::SERVICE_UNAVAILABLE, String::new())
                    } else {
                        (StatusCode::OK, ARRAY_BODY.to_string())
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/flaky.json", addr), hits)
    }

    #[test]
    fn test_decode_array_yields_one_record_per_element() {
        let body = json!([
            {"scanResults": {"vulnerabilities": [{"id": "a"}]}},
            {"scanResults": {"summary": {}}},
            {"scanResults": "text"}
        ])
        .to_string();
        let records = decode_scan_file("multi.json", "http://h/multi.json", body.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.source_file == "multi.json"));
        assert_eq!(records[0].payload, Some(json!([{"id": "a"}])));
        assert_eq!(records[1].payload, None);
        assert_eq!(records[2].payload, None);
    }

    #[test]
    fn test_decode_single_object_and_empty_array() {
        let records = decode_scan_file("one.json", "http://h/one.json", OBJECT_BODY.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_file, "one.json");

        let records = decode_scan_file("empty.json", "http://h/empty.json", b"[]").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_decode_rejects_unrecognized_shapes_atomically() {
        for body in [
            &b"not json"[..],
            b"42",
            b"\"text\"",
            b"[{\"scanResults\": {}}, 7]",
            b"null",
        ] {
            let error = decode_scan_file("bad.json", "http://h/bad.json", body).unwrap_err();
            assert!(matches!(error, IngestionError::MalformedResponse { .. }));
        }
    }

    #[tokio::test]
    async fn test_fetch_array_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/valid.json")
            .with_status(200)
            .with_body(ARRAY_BODY)
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/valid.json", server.url());
        let records = fetcher(Duration::from_millis(1))
            .fetch("valid.json", &url)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_file, "valid.json");
        assert_eq!(
            records[0].payload,
            Some(json!([{"id": "vuln1", "severity": "HIGH"}]))
        );
    }

    #[tokio::test]
    async fn test_fetch_not_found_retries_once_then_fails() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/notfound.json")
            .with_status(404)
            .expect(2)
            .create_async()
            .await;

        let url = format!("{}/notfound.json", server.url());
        let error = fetcher(Duration::from_millis(5))
            .fetch("notfound.json", &url)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(error.status(), Some(404));
    }

    #[tokio::test]
    async fn test_fetch_recovers_after_one_retry() {
        let (url, hits) = flaky_server(1).await;
        let delay = Duration::from_millis(50);

        let start = Instant::now();
        let records = fetcher(delay).fetch("flaky.json", &url).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= delay);
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/broken.json")
            .with_status(200)
            .with_body("{truncated")
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/broken.json", server.url());
        let error = fetcher(Duration::from_millis(1))
            .fetch("broken.json", &url)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(error, IngestionError::MalformedResponse { .. }));
    }
}
