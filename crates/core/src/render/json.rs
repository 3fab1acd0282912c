//! JSON rendering for a collection pass

use crate::collector::PassSummary;
use crate::models::{BackendKind, MetricKind, MetricRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// A serializable view of one pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(with = "time::serde::rfc3339")]
    pub collected_at: OffsetDateTime,
    pub backend: BackendKind,
    pub services: usize,
    pub skipped: usize,
    pub rows: Vec<JsonRow>,
}

/// One row with its labels keyed by label name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRow {
    pub metric: String,
    pub kind: MetricKind,
    pub value: f64,
    pub labels: BTreeMap<String, String>,
}

impl From<&MetricRow> for JsonRow {
    fn from(row: &MetricRow) -> Self {
        Self {
            metric: row.kind.fq_name(),
            kind: row.kind,
            value: row.value,
            labels: row
                .label_pairs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Snapshot {
    pub fn new(rows: &[MetricRow], summary: &PassSummary, collected_at: OffsetDateTime) -> Self {
        Self {
            collected_at,
            backend: summary.backend,
            services: summary.services,
            skipped: summary.skipped,
            rows: rows.iter().map(JsonRow::from).collect(),
        }
    }

    /// Snapshot stamped with the current UTC time
    pub fn now(rows: &[MetricRow], summary: &PassSummary) -> Self {
        Self::new(rows, summary, OffsetDateTime::now_utc())
    }
}

/// Render the snapshot as a pretty-printed JSON string
pub fn render_json_string(snapshot: &Snapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(snapshot)
}
