//! Core data structures shared by both backends and the renderers

use crate::enums::{StartMode, State, Status};
use serde::{Deserialize, Serialize};

/// Metric namespace prefix
pub const NAMESPACE: &str = "windows";
/// Metric subsystem
pub const SUBSYSTEM: &str = "service";

/// A normalized snapshot of one service, produced fresh on every pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Service name (internal name used by SCM); case is not significant
    pub name: String,
    /// Display name (human-readable)
    pub display_name: String,
    /// Process ID (0 if not running)
    pub process_id: u32,
    /// Account the service runs as, empty when unknown
    pub run_as: String,
    /// `None` when the raw state matched no canonical label
    pub state: Option<State>,
    /// `None` when the raw start mode matched no canonical label
    pub start_mode: Option<StartMode>,
    /// `None` when the backend has no status information
    pub status: Option<Status>,
}

impl ServiceRecord {
    /// The service name as used in every label position
    pub fn label_name(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Which data source produced a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Bulk `Win32_Service` WMI query
    Wmi,
    /// Per-handle Service Control Manager API
    ServiceControlManager,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Wmi => write!(f, "WMI"),
            BackendKind::ServiceControlManager => write!(f, "Service Control Manager"),
        }
    }
}

/// The four metric families emitted per service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Info,
    State,
    StartMode,
    Status,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Info,
        MetricKind::State,
        MetricKind::StartMode,
        MetricKind::Status,
    ];

    /// Short name within the subsystem
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Info => "info",
            MetricKind::State => "state",
            MetricKind::StartMode => "start_mode",
            MetricKind::Status => "status",
        }
    }

    /// Fully-qualified metric name, e.g. `windows_service_state`
    pub fn fq_name(self) -> String {
        format!("{}_{}_{}", NAMESPACE, SUBSYSTEM, self.name())
    }

    pub fn help(self) -> &'static str {
        match self {
            MetricKind::Info => "A metric with a constant '1' value labeled with service information",
            MetricKind::State => "The state of the service (State)",
            MetricKind::StartMode => "The start mode of the service (StartMode)",
            MetricKind::Status => "The status of the service (Status)",
        }
    }

    /// Label names, in the order label values appear on a [`MetricRow`]
    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            MetricKind::Info => &["name", "display_name", "process_id", "run_as"],
            MetricKind::State => &["name", "state"],
            MetricKind::StartMode => &["name", "start_mode"],
            MetricKind::Status => &["name", "status"],
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One gauge sample: kind, value and label values ordered as
/// [`MetricKind::label_names`]
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub kind: MetricKind,
    pub value: f64,
    pub labels: Vec<String>,
}

impl MetricRow {
    pub fn new(kind: MetricKind, value: f64, labels: Vec<String>) -> Self {
        debug_assert_eq!(labels.len(), kind.label_names().len());
        Self {
            kind,
            value,
            labels,
        }
    }

    /// Look up a label value by label name
    pub fn label(&self, name: &str) -> Option<&str> {
        self.kind
            .label_names()
            .iter()
            .position(|&n| n == name)
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }

    /// Iterate `(label name, label value)` pairs
    pub fn label_pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.kind
            .label_names()
            .iter()
            .copied()
            .zip(self.labels.iter().map(String::as_str))
    }
}
