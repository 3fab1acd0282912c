//! winsvc-platform-windows: Windows backends for winsvc-exporter
//!
//! This crate binds the backend traits of `winsvc-core` to the Service Control
//! Manager API ([`ScmConnector`]) and to WMI ([`WmiServiceQuery`]).

pub mod error;
#[cfg(windows)]
pub mod scm;
#[cfg(windows)]
pub mod wmi_query;

pub use error::*;
#[cfg(windows)]
pub use scm::{ScManager, ScService, ScmConnector};
#[cfg(windows)]
pub use wmi_query::WmiServiceQuery;

/// Service collector backed by the local machine
#[cfg(windows)]
pub type WindowsServiceCollector = winsvc_core::ServiceCollector<WmiServiceQuery, ScmConnector>;

/// Build a collector for the local machine. The backend is fixed by
/// `config.use_live_api` for the collector's lifetime.
#[cfg(windows)]
pub fn service_collector(config: &winsvc_core::CollectorConfig) -> WindowsServiceCollector {
    winsvc_core::ServiceCollector::new(config, WmiServiceQuery, ScmConnector)
}
