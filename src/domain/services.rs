//! Domain services containing business logic

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::{
    EligibleFile, EntryType, FileDescriptor, SCAN_RESULTS_KEY, ScanRecord, VULNERABILITIES_KEY,
    VulnerabilityEntry,
};

/// Coerces heterogeneous scan objects into the canonical payload shape
pub struct PayloadNormalizer;

impl PayloadNormalizer {
    /// Extract the vulnerability collection from a raw scan object.
    ///
    /// Only `{"scanResults": {"vulnerabilities": ...}}` yields a payload; any
    /// other shape is discarded rather than rejected. A `null` collection is
    /// treated as absent.
    pub fn normalize(raw: &Map<String, Value>) -> Option<Value> {
        match raw.get(SCAN_RESULTS_KEY) {
            Some(Value::Object(scan_results)) => match scan_results.get(VULNERABILITIES_KEY) {
                Some(Value::Null) | None => None,
                Some(vulnerabilities) => Some(vulnerabilities.clone()),
            },
            _ => None,
        }
    }

    /// Stamp a raw scan object with its origin and capture time
    pub fn to_record(
        raw: &Map<String, Value>,
        source_file: &str,
        scan_time: DateTime<Utc>,
    ) -> ScanRecord {
        ScanRecord::new(source_file, scan_time, Self::normalize(raw))
    }
}

/// Decides which listing entries are fetched during a run
#[derive(Debug, Clone)]
pub struct FileEligibility<'a> {
    suffix: &'a str,
    allowlist: &'a HashSet<String>,
}

impl<'a> FileEligibility<'a> {
    pub fn new(suffix: &'a str, allowlist: &'a HashSet<String>) -> Self {
        Self { suffix, allowlist }
    }

    /// A regular file with the recognized suffix, a download URL, and (when an
    /// allowlist is given) a listed name
    pub fn is_eligible(&self, entry: &FileDescriptor) -> bool {
        entry.entry_type == EntryType::File
            && entry.name.ends_with(self.suffix)
            && entry.download_url.is_some()
            && (self.allowlist.is_empty() || self.allowlist.contains(&entry.name))
    }

    /// Eligible entries in listing order, each carrying its download URL
    pub fn select(&self, listing: Vec<FileDescriptor>) -> Vec<EligibleFile> {
        listing
            .into_iter()
            .filter(|entry| self.is_eligible(entry))
            .filter_map(|entry| {
                Some(EligibleFile {
                    download_url: entry.download_url?,
                    name: entry.name,
                })
            })
            .collect()
    }
}

/// Exact-match severity filter over stored payloads
pub struct SeverityFilter;

impl SeverityFilter {
    /// Every vulnerability object in `payload` whose `severity` string equals
    /// `severity`. Non-array payloads contribute nothing.
    pub fn matching(payload: &Value, severity: &str) -> Vec<VulnerabilityEntry> {
        payload
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .filter(|vuln| vuln.get("severity").and_then(Value::as_str) == Some(severity))
            .map(VulnerabilityEntry::from_json_object)
            .collect()
    }

    pub fn matching_records<'r>(
        records: impl IntoIterator<Item = &'r ScanRecord>,
        severity: &str,
    ) -> Vec<VulnerabilityEntry> {
        records
            .into_iter()
            .filter_map(|record| record.payload.as_ref())
            .flat_map(|payload| Self::matching(payload, severity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn normalize_extracts_vulnerability_array() {
        let raw = object(json!({
            "scanResults": {
                "scan_id": "SCAN-1",
                "vulnerabilities": [{"id": "v1", "severity": "HIGH"}]
            },
            "sourceFile": "ignored.json"
        }));
        assert_eq!(
            PayloadNormalizer::normalize(&raw),
            Some(json!([{"id": "v1", "severity": "HIGH"}]))
        );
    }

    #[test]
    fn normalize_discards_other_shapes() {
        let cases = [
            json!({"scanResults": {"summary": {"total": 0}}}),
            json!({"scanResults": [{"id": "v1"}]}),
            json!({"scanResults": "not an object"}),
            json!({"scanResults": null}),
            json!({"scanResults": {"vulnerabilities": null}}),
            json!({"somethingElse": {"vulnerabilities": []}}),
            json!({}),
        ];
        for case in cases {
            assert_eq!(PayloadNormalizer::normalize(&object(case.clone())), None, "{case}");
        }
    }

    #[test]
    fn normalize_keeps_non_array_collections_verbatim() {
        let raw = object(json!({"scanResults": {"vulnerabilities": {"count": 3}}}));
        assert_eq!(PayloadNormalizer::normalize(&raw), Some(json!({"count": 3})));
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = object(json!({"scanResults": {"vulnerabilities": [{"id": "v1"}]}}));
        let first = PayloadNormalizer::normalize(&raw);
        let second = PayloadNormalizer::normalize(&raw);
        assert_eq!(first, second);
    }

    #[test]
    fn to_record_overrides_embedded_metadata() {
        let raw = object(json!({
            "scanResults": {"vulnerabilities": []},
            "sourceFile": "x",
            "scanTime": "2020-01-01T00:00:00Z"
        }));
        let now = Utc::now();
        let record = PayloadNormalizer::to_record(&raw, "a.json", now);
        assert_eq!(record.source_file, "a.json");
        assert_eq!(record.scan_time, now);
        assert_eq!(record.payload, Some(json!([])));
    }

    #[test]
    fn eligibility_requires_json_files() {
        let allowlist = HashSet::new();
        let eligibility = FileEligibility::new(".json", &allowlist);

        assert!(eligibility.is_eligible(&FileDescriptor::file("a.json", "http://h/a.json")));
        assert!(!eligibility.is_eligible(&FileDescriptor::file("README.md", "http://h/README.md")));
        assert!(!eligibility.is_eligible(&FileDescriptor::file("json", "http://h/json")));
        assert!(!eligibility.is_eligible(&FileDescriptor::dir("nested.json")));
        assert!(!eligibility.is_eligible(&FileDescriptor {
            name: "link.json".into(),
            entry_type: EntryType::Other,
            download_url: Some("http://h/link.json".into()),
        }));
        assert!(!eligibility.is_eligible(&FileDescriptor {
            name: "no_url.json".into(),
            entry_type: EntryType::File,
            download_url: None,
        }));
    }

    #[test]
    fn eligibility_applies_allowlist() {
        let allowlist: HashSet<String> = ["b.json".to_string()].into_iter().collect();
        let eligibility = FileEligibility::new(".json", &allowlist);

        let selected = eligibility.select(vec![
            FileDescriptor::file("a.json", "http://h/a.json"),
            FileDescriptor::file("b.json", "http://h/b.json"),
            FileDescriptor {
                name: "c.json".into(),
                entry_type: EntryType::File,
                download_url: None,
            },
        ]);
        assert_eq!(
            selected,
            vec![EligibleFile {
                name: "b.json".into(),
                download_url: "http://h/b.json".into(),
            }]
        );
    }

    #[test]
    fn severity_filter_matches_exactly() {
        let payload = json!([
            {"id": "v1", "severity": "HIGH", "cvss": 9.1},
            {"id": "v2", "severity": "LOW"},
            {"id": "v3", "severity": "high"},
            {"id": "v4"},
            "not an object"
        ]);
        let high = SeverityFilter::matching(&payload, "HIGH");
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, "v1");
        assert_eq!(high[0].cvss, 9.1);

        assert!(SeverityFilter::matching(&json!({"severity": "HIGH"}), "HIGH").is_empty());
    }

    #[test]
    fn severity_filter_spans_records() {
        let now = Utc::now();
        let records = vec![
            ScanRecord::new("a.json", now, Some(json!([{"id": "a1", "severity": "HIGH"}]))),
            ScanRecord::new("b.json", now, None),
            ScanRecord::new("c.json", now, Some(json!([{"id": "c1", "severity": "HIGH"}]))),
        ];
        let ids: Vec<_> = SeverityFilter::matching_records(&records, "HIGH")
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(ids, vec!["a1", "c1"]);
    }
}
