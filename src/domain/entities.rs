//! Domain entities representing core business concepts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::value_objects::*;

/// One entry of a remote repository's top-level listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Directories and submodules carry no download URL
    pub download_url: Option<String>,
}

impl FileDescriptor {
    pub fn file(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::File,
            download_url: Some(download_url.into()),
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::Dir,
            download_url: None,
        }
    }
}

/// A listing entry selected for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleFile {
    pub name: String,
    pub download_url: String,
}

/// Input to one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRequest {
    pub repository: String,
    /// Empty means every eligible file
    pub file_allowlist: HashSet<String>,
}

impl ScanRequest {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            file_allowlist: HashSet::new(),
        }
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_allowlist = files.into_iter().map(Into::into).collect();
        self
    }
}

/// Normalized, persistence-ready representation of one scanned object.
///
/// Serializes with the same field names as the upstream scan files so that
/// callers receive records in the shape they uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    #[serde(rename = "scanResults")]
    pub payload: Option<Value>,
    #[serde(rename = "sourceFile")]
    pub source_file: String,
    #[serde(rename = "scanTime")]
    pub scan_time: DateTime<Utc>,
}

impl ScanRecord {
    pub fn new(
        source_file: impl Into<String>,
        scan_time: DateTime<Utc>,
        payload: Option<Value>,
    ) -> Self {
        Self {
            payload,
            source_file: source_file.into(),
            scan_time,
        }
    }
}

/// A single vulnerability finding as served by the query path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityEntry {
    pub id: String,
    pub severity: String,
    pub cvss: f64,
    pub status: String,
    pub package_name: String,
    pub current_version: String,
    pub fixed_version: String,
    pub description: String,
    pub published_date: String,
    pub link: String,
    pub risk_factors: Vec<String>,
}

impl VulnerabilityEntry {
    /// Build an entry from a loosely-typed JSON object.
    ///
    /// Missing or mistyped fields fall back to their empty value; only string
    /// elements of `risk_factors` are kept.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let risk_factors = object
            .get("risk_factors")
            .and_then(Value::as_array)
            .map(|factors| {
                factors
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: text("id"),
            severity: text("severity"),
            cvss: object.get("cvss").and_then(Value::as_f64).unwrap_or_default(),
            status: text("status"),
            package_name: text("package_name"),
            current_version: text("current_version"),
            fixed_version: text("fixed_version"),
            description: text("description"),
            published_date: text("published_date"),
            link: text("link"),
            risk_factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_entry_decodes_github_contents_shape() {
        let entries: Vec<FileDescriptor> = serde_json::from_value(json!([
            {
                "name": "vulnscan15.json",
                "path": "vulnscan15.json",
                "url": "https://api.github.com/repos/o/r/contents/vulnscan15.json",
                "type": "file",
                "download_url": "https://raw.githubusercontent.com/o/r/main/vulnscan15.json"
            },
            {"name": "docs", "path": "docs", "type": "dir", "download_url": null}
        ]))
        .unwrap();

        assert_eq!(entries[0].entry_type, EntryType::File);
        assert_eq!(
            entries[0].download_url.as_deref(),
            Some("https://raw.githubusercontent.com/o/r/main/vulnscan15.json")
        );
        assert_eq!(entries[1], FileDescriptor::dir("docs"));
    }

    #[test]
    fn scan_record_serializes_with_upstream_field_names() {
        let time = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = ScanRecord::new("a.json", time, Some(json!([{"id": "v1"}])));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sourceFile"], "a.json");
        assert_eq!(value["scanResults"], json!([{"id": "v1"}]));
        assert_eq!(value["scanTime"], "2024-05-01T10:00:00Z");

        let absent = ScanRecord::new("b.json", time, None);
        assert!(serde_json::to_value(&absent).unwrap()["scanResults"].is_null());
    }

    #[test]
    fn vulnerability_entry_extraction_is_lenient() {
        let object = json!({
            "id": "CVE-2024-1234",
            "severity": "HIGH",
            "cvss": 8.5,
            "status": 42,
            "package_name": "openssl",
            "risk_factors": ["Remote Code Execution", 7, "High CVSS Score"]
        });
        let entry = VulnerabilityEntry::from_json_object(object.as_object().unwrap());

        assert_eq!(entry.id, "CVE-2024-1234");
        assert_eq!(entry.cvss, 8.5);
        assert_eq!(entry.status, "");
        assert_eq!(entry.fixed_version, "");
        assert_eq!(
            entry.risk_factors,
            vec!["Remote Code Execution", "High CVSS Score"]
        );
    }

    #[test]
    fn scan_request_allowlist_from_files() {
        let request = ScanRequest::new("owner/repo").with_files(["b.json", "c.json"]);
        assert!(request.file_allowlist.contains("b.json"));
        assert_eq!(request.file_allowlist.len(), 2);
    }
}
