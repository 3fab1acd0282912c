//! winsvc-core: OS-agnostic service collection for winsvc-exporter
//!
//! This crate normalizes service inventory from either backend into
//! [`ServiceRecord`]s and expands each record into one-hot encoded metric rows.
//! The Windows bindings for the backend traits live in
//! `winsvc-platform-windows`.
//!
//! # Modules
//!
//! - [`enums`] - Canonical state, start mode and status vocabularies
//! - [`models`] - Service records, metric kinds and rows
//! - [`backend`] - The WMI query and live SCM backends
//! - [`encode`] - One-hot encoding and row emission
//! - [`collector`] - Backend selection and the collection pass
//! - [`render`] - Prometheus text and JSON output
//!
//! # Example
//!
//! ```
//! use winsvc_core::{one_hot, StartMode};
//!
//! let rows: Vec<_> = one_hot(Some(StartMode::Manual)).collect();
//! assert_eq!(rows[3], ("manual", 1.0));
//! ```

pub mod backend;
pub mod collector;
pub mod encode;
pub mod enums;
pub mod error;
pub mod models;
pub mod render;
pub mod sink;

// Re-export commonly used types at crate root
pub use backend::{
    build_query, LiveHandleBackend, ManagerConnector, QueryBackend, RawServiceConfig,
    RawServiceStatus, ServiceHandle, ServiceManager, ServiceQuery, ServiceSource, SourceStats,
    Win32Service,
};
pub use collector::{Backend, CollectorConfig, PassSummary, ServiceCollector};
pub use encode::{emit_service, one_hot, service_rows, ROWS_PER_SERVICE};
pub use enums::{Enumeration, StartMode, State, Status};
pub use error::{CollectError, CollectResult};
pub use models::{BackendKind, MetricKind, MetricRow, ServiceRecord};
pub use sink::{FnSink, MetricSink};
