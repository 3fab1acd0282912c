//! Data acquisition strategies
//!
//! Both backends turn their raw data into [`ServiceRecord`]s and hand them to
//! a visitor one at a time. The OS bindings live behind the traits in
//! [`query`] and [`live`] so the normalization logic can run anywhere.

pub mod live;
pub mod query;

pub use live::{
    LiveHandleBackend, ManagerConnector, RawServiceConfig, RawServiceStatus, ServiceHandle,
    ServiceManager,
};
pub use query::{build_query, QueryBackend, ServiceQuery, Win32Service};

use crate::error::CollectResult;
use crate::models::{BackendKind, ServiceRecord};

/// Counters for one backend pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Records handed to the visitor
    pub services: usize,
    /// Services dropped because of a per-service failure
    pub skipped: usize,
}

/// A backend that produces the service records of one pass
pub trait ServiceSource {
    fn kind(&self) -> BackendKind;

    /// Visit every record of a fresh pass. A returned error is a whole-pass
    /// failure; errors from `visit` are propagated unchanged.
    fn collect_records(
        &self,
        visit: &mut dyn FnMut(ServiceRecord) -> CollectResult<()>,
    ) -> CollectResult<SourceStats>;
}
