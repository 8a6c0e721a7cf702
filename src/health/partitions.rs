//! Persistent partition failure detection.
//!
//! A partition (district) counts as persistently failing only when it failed
//! in both of the two most recent metric snapshots. A single bad run is
//! treated as noise.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;

/// Placeholder when the latest snapshot carries no error text.
pub const UNKNOWN_CAUSE: &str = "unknown cause";

/// One metrics record: per-partition outcomes of a single run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricSnapshot {
    #[serde(default, deserialize_with = "lenient_results")]
    pub district_results: Vec<PartitionOutcome>,
}

/// Outcome of one partition within a run.
#[derive(Debug, Clone, Deserialize)]
pub struct PartitionOutcome {
    pub district: String,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

fn default_success() -> bool {
    true
}

// Records written by older jobs may hold something other than a list here.
fn lenient_results<'de, D>(deserializer: D) -> Result<Vec<PartitionOutcome>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl MetricSnapshot {
    /// Decode a raw backend record, ignoring unrelated fields.
    pub fn from_record(record: &Value) -> Self {
        serde_json::from_value(record.clone()).unwrap_or_default()
    }

    fn failed(&self) -> BTreeSet<&str> {
        self.district_results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.district.as_str())
            .collect()
    }
}

/// A partition failing in both recent snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionFailure {
    pub partition: String,
    pub error: String,
}

/// Find partitions failing in both of the two newest snapshots.
///
/// `snapshots` is newest first. Error text comes from the newest snapshot.
/// The result is sorted by partition id.
pub fn persistent_failures(snapshots: &[MetricSnapshot]) -> Vec<PartitionFailure> {
    let [latest, previous, ..] = snapshots else {
        return Vec::new();
    };

    let persistent: BTreeSet<&str> = latest
        .failed()
        .intersection(&previous.failed())
        .copied()
        .collect();

    let mut errors: BTreeMap<&str, String> = BTreeMap::new();
    for outcome in &latest.district_results {
        if persistent.contains(outcome.district.as_str()) {
            let error = outcome
                .error_message
                .as_deref()
                .filter(|e| !e.is_empty())
                .unwrap_or(UNKNOWN_CAUSE);
            errors.entry(outcome.district.as_str()).or_insert_with(|| error.to_string());
        }
    }

    errors
        .into_iter()
        .map(|(partition, error)| PartitionFailure {
            partition: partition.to_string(),
            error,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(outcomes: &[(&str, bool, Option<&str>)]) -> MetricSnapshot {
        MetricSnapshot {
            district_results: outcomes
                .iter()
                .map(|(d, ok, err)| PartitionOutcome {
                    district: d.to_string(),
                    success: *ok,
                    error_message: err.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn test_intersection_not_union() {
        let latest = snapshot(&[("A", true, None), ("B", false, Some("timeout")), ("C", false, Some("500"))]);
        let previous = snapshot(&[("A", false, Some("dns")), ("B", false, Some("old")), ("C", true, None)]);

        let failures = persistent_failures(&[latest, previous]);
        assert_eq!(
            failures,
            vec![PartitionFailure { partition: "B".into(), error: "timeout".into() }]
        );
    }

    #[test]
    fn test_fewer_than_two_snapshots() {
        assert!(persistent_failures(&[]).is_empty());
        assert!(persistent_failures(&[snapshot(&[("A", false, None)])]).is_empty());
    }

    #[test]
    fn test_sorted_with_placeholder() {
        let latest = snapshot(&[("Seo-gu", false, None), ("Buk-gu", false, Some("parse error"))]);
        let previous = snapshot(&[("Buk-gu", false, None), ("Seo-gu", false, None)]);

        let failures = persistent_failures(&[latest, previous]);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].partition, "Buk-gu");
        assert_eq!(failures[0].error, "parse error");
        assert_eq!(failures[1].partition, "Seo-gu");
        assert_eq!(failures[1].error, UNKNOWN_CAUSE);
    }

    #[test]
    fn test_from_record() {
        let record = json!({
            "id": "r1",
            "created": "2026-02-08 09:59:47.957Z",
            "district_results": [
                {"district": "A", "success": false, "error_message": "boom"},
                {"district": "B"}
            ]
        });
        let snap = MetricSnapshot::from_record(&record);
        assert_eq!(snap.district_results.len(), 2);
        assert!(!snap.district_results[0].success);
        assert!(snap.district_results[1].success);

        let malformed = MetricSnapshot::from_record(&json!({"district_results": "n/a"}));
        assert!(malformed.district_results.is_empty());
    }
}
