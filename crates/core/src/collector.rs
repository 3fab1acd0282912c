//! Collector facade: backend selection and the collection pass

use crate::backend::{
    LiveHandleBackend, ManagerConnector, QueryBackend, ServiceQuery, ServiceSource, SourceStats,
};
use crate::encode::emit_service;
use crate::error::CollectResult;
use crate::models::{BackendKind, MetricRow, ServiceRecord};
use crate::sink::MetricSink;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Resolved collector settings, fixed for the lifetime of a collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// WQL `WHERE` fragment for the WMI backend. Ignored by the live backend.
    pub filter: String,
    /// Use the Service Control Manager API instead of WMI
    pub use_live_api: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            filter: String::new(),
            use_live_api: true,
        }
    }
}

/// The backend chosen at construction
#[derive(Debug, Clone)]
pub enum Backend<Q, C> {
    Query(QueryBackend<Q>),
    LiveHandle(LiveHandleBackend<C>),
}

impl<Q, C> Backend<Q, C>
where
    Q: ServiceQuery,
    C: ManagerConnector,
{
    /// Pick exactly one backend from `config`
    pub fn select(config: &CollectorConfig, query: Q, connector: C) -> Self {
        if config.use_live_api {
            Backend::LiveHandle(LiveHandleBackend::new(connector))
        } else {
            Backend::Query(QueryBackend::new(query, config.filter.clone()))
        }
    }
}

impl<Q, C> ServiceSource for Backend<Q, C>
where
    Q: ServiceQuery,
    C: ManagerConnector,
{
    fn kind(&self) -> BackendKind {
        match self {
            Backend::Query(b) => b.kind(),
            Backend::LiveHandle(b) => b.kind(),
        }
    }

    fn collect_records(
        &self,
        visit: &mut dyn FnMut(ServiceRecord) -> CollectResult<()>,
    ) -> CollectResult<SourceStats> {
        match self {
            Backend::Query(b) => b.collect_records(visit),
            Backend::LiveHandle(b) => b.collect_records(visit),
        }
    }
}

/// Outcome of a successful pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub backend: BackendKind,
    /// Services emitted
    pub services: usize,
    /// Rows sent to the sink
    pub rows: usize,
    /// Services skipped after a per-service failure
    pub skipped: usize,
}

/// Collects service metrics from the configured backend
#[derive(Debug, Clone)]
pub struct ServiceCollector<Q, C> {
    backend: Backend<Q, C>,
}

impl<Q, C> ServiceCollector<Q, C>
where
    Q: ServiceQuery,
    C: ManagerConnector,
{
    pub fn new(config: &CollectorConfig, query: Q, connector: C) -> Self {
        if config.use_live_api {
            warn!("WMI collection is disabled; using the Service Control Manager API");
            if !config.filter.trim().is_empty() {
                warn!(
                    filter = %config.filter,
                    "services-where filter is ignored when WMI collection is disabled"
                );
            }
        } else if config.filter.trim().is_empty() {
            warn!("No where-clause specified for service collector. This will generate a very large number of metrics!");
        }

        Self {
            backend: Backend::select(config, query, connector),
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn backend(&self) -> &Backend<Q, C> {
        &self.backend
    }

    /// Run one pass, streaming rows into `sink`
    ///
    /// Rows sent before a failure are not retracted.
    pub fn collect(&self, sink: &mut dyn MetricSink) -> CollectResult<PassSummary> {
        let backend = self.backend.kind();
        let mut rows = 0;

        let result = self.backend.collect_records(&mut |record| {
            rows += emit_service(&record, sink)?;
            Ok(())
        });

        match result {
            Ok(stats) => {
                let summary = PassSummary {
                    backend,
                    services: stats.services,
                    rows,
                    skipped: stats.skipped,
                };
                debug!(
                    backend = %backend,
                    services = summary.services,
                    rows = summary.rows,
                    skipped = summary.skipped,
                    "service collection pass complete"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(backend = %backend, error = %e, "failed collecting service metrics");
                Err(e)
            }
        }
    }

    /// Run one pass and buffer the rows
    pub fn collect_rows(&self) -> CollectResult<(Vec<MetricRow>, PassSummary)> {
        let mut rows = Vec::new();
        let summary = self.collect(&mut rows)?;
        Ok((rows, summary))
    }
}
