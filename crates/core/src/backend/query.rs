//! Declarative backend: one bulk `Win32_Service` query per pass

use super::{ServiceSource, SourceStats};
use crate::enums::{StartMode, State, Status};
use crate::error::CollectResult;
use crate::models::{BackendKind, ServiceRecord};
use serde::Deserialize;
use tracing::debug;

/// Raw `Win32_Service` row
///
/// See <https://learn.microsoft.com/en-us/windows/win32/cimwin32prov/win32-service>.
/// Nullable columns are options so a null never fails deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename = "Win32_Service", rename_all = "PascalCase")]
pub struct Win32Service {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub process_id: Option<u32>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_mode: Option<String>,
    #[serde(default)]
    pub start_name: Option<String>,
}

impl Win32Service {
    pub fn into_record(self) -> ServiceRecord {
        ServiceRecord {
            name: self.name,
            display_name: self.display_name.unwrap_or_default(),
            process_id: self.process_id.unwrap_or(0),
            run_as: self.start_name.unwrap_or_default(),
            state: self.state.as_deref().and_then(State::from_wmi),
            start_mode: self.start_mode.as_deref().and_then(StartMode::from_wmi),
            status: self.status.as_deref().and_then(Status::from_wmi),
        }
    }
}

/// Executes a WQL query against `Win32_Service`
pub trait ServiceQuery {
    /// Run `wql` in one round trip. Any failure is a whole-pass failure.
    fn query_services(&self, wql: &str) -> CollectResult<Vec<Win32Service>>;
}

/// Build the WQL statement for an optional `WHERE` fragment
pub fn build_query(filter: &str) -> String {
    let filter = filter.trim();
    if filter.is_empty() {
        "SELECT * FROM Win32_Service".to_string()
    } else {
        format!("SELECT * FROM Win32_Service WHERE {}", filter)
    }
}

/// Backend A: filtered bulk query
#[derive(Debug, Clone)]
pub struct QueryBackend<Q> {
    query: Q,
    filter: String,
}

impl<Q: ServiceQuery> QueryBackend<Q> {
    pub fn new(query: Q, filter: impl Into<String>) -> Self {
        Self {
            query,
            filter: filter.into(),
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }
}

impl<Q: ServiceQuery> ServiceSource for QueryBackend<Q> {
    fn kind(&self) -> BackendKind {
        BackendKind::Wmi
    }

    fn collect_records(
        &self,
        visit: &mut dyn FnMut(ServiceRecord) -> CollectResult<()>,
    ) -> CollectResult<SourceStats> {
        let wql = build_query(&self.filter);
        debug!(query = %wql, "querying services");
        let services = self.query.query_services(&wql)?;

        let mut stats = SourceStats::default();
        for service in services {
            visit(service.into_record())?;
            stats.services += 1;
        }
        Ok(stats)
    }
}
