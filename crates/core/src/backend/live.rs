//! Live backend: per-service handles from the Service Control Manager
//!
//! The manager connection and every service handle are owned values that
//! release themselves on drop, so a skipped service closes its handle on the
//! way out of the loop body.

use super::{ServiceSource, SourceStats};
use crate::enums::{StartMode, State};
use crate::error::CollectResult;
use crate::models::{BackendKind, ServiceRecord};
use tracing::debug;

/// The subset of `QUERY_SERVICE_CONFIGW` the collector reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawServiceConfig {
    pub display_name: String,
    /// `dwStartType`
    pub start_type: u32,
    /// `lpServiceStartName`
    pub service_start_name: String,
}

/// The subset of `SERVICE_STATUS_PROCESS` the collector reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawServiceStatus {
    /// `dwCurrentState`
    pub current_state: u32,
    pub process_id: u32,
}

/// An open service handle, closed on drop
pub trait ServiceHandle {
    fn config(&self) -> CollectResult<RawServiceConfig>;
    fn status(&self) -> CollectResult<RawServiceStatus>;
}

/// An open manager connection, closed on drop
pub trait ServiceManager {
    type Service: ServiceHandle;

    /// Names of every service known to the manager
    fn list_services(&self) -> CollectResult<Vec<String>>;

    fn open_service(&self, name: &str) -> CollectResult<Self::Service>;
}

/// Opens a fresh manager connection for each pass
pub trait ManagerConnector {
    type Manager: ServiceManager;

    fn connect(&self) -> CollectResult<Self::Manager>;
}

/// Backend B: enumerate, then open and query each service on its own
#[derive(Debug, Clone)]
pub struct LiveHandleBackend<C> {
    connector: C,
}

impl<C: ManagerConnector> LiveHandleBackend<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    fn query_one<M: ServiceManager>(manager: &M, name: &str) -> CollectResult<ServiceRecord> {
        let service = manager.open_service(name)?;
        let config = service.config()?;
        let status = service.status()?;

        Ok(ServiceRecord {
            name: name.to_string(),
            display_name: config.display_name,
            process_id: status.process_id,
            run_as: config.service_start_name,
            state: State::from_scm(status.current_state),
            start_mode: StartMode::from_scm(config.start_type),
            status: None,
        })
    }
}

impl<C: ManagerConnector> ServiceSource for LiveHandleBackend<C> {
    fn kind(&self) -> BackendKind {
        BackendKind::ServiceControlManager
    }

    fn collect_records(
        &self,
        visit: &mut dyn FnMut(ServiceRecord) -> CollectResult<()>,
    ) -> CollectResult<SourceStats> {
        let manager = self.connector.connect()?;
        let names = manager.list_services()?;
        debug!(count = names.len(), "enumerated services");

        let mut stats = SourceStats::default();
        for name in &names {
            let record = match Self::query_one(&manager, name) {
                Ok(record) => record,
                Err(e) => {
                    debug!(service = %name, error = %e, "skipping service");
                    stats.skipped += 1;
                    continue;
                }
            };
            visit(record)?;
            stats.services += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectError;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Fail {
        Open,
        Config,
        Status,
    }

    #[derive(Default)]
    struct Counters {
        opened: Cell<usize>,
        closed: Cell<usize>,
        connected: Cell<usize>,
        disconnected: Cell<usize>,
    }

    struct FakeService {
        status: RawServiceStatus,
        config: RawServiceConfig,
        fail: Option<Fail>,
        counters: Rc<Counters>,
    }

    impl Drop for FakeService {
        fn drop(&mut self) {
            self.counters.closed.set(self.counters.closed.get() + 1);
        }
    }

    impl ServiceHandle for FakeService {
        fn config(&self) -> CollectResult<RawServiceConfig> {
            if self.fail == Some(Fail::Config) {
                return Err(CollectError::per_service("x", "QueryServiceConfigW", "denied"));
            }
            Ok(self.config.clone())
        }

        fn status(&self) -> CollectResult<RawServiceStatus> {
            if self.fail == Some(Fail::Status) {
                return Err(CollectError::per_service("x", "QueryServiceStatusEx", "denied"));
            }
            Ok(self.status)
        }
    }

    struct FakeManager {
        names: Vec<String>,
        failures: HashMap<String, Fail>,
        list_fails: bool,
        counters: Rc<Counters>,
    }

    impl Drop for FakeManager {
        fn drop(&mut self) {
            self.counters
                .disconnected
                .set(self.counters.disconnected.get() + 1);
        }
    }

    impl ServiceManager for FakeManager {
        type Service = FakeService;

        fn list_services(&self) -> CollectResult<Vec<String>> {
            if self.list_fails {
                return Err(CollectError::enumeration("EnumServicesStatusExW", "denied"));
            }
            Ok(self.names.clone())
        }

        fn open_service(&self, name: &str) -> CollectResult<FakeService> {
            let fail = self.failures.get(name).copied();
            if fail == Some(Fail::Open) {
                return Err(CollectError::per_service(name, "OpenServiceW", "not found"));
            }
            self.counters.opened.set(self.counters.opened.get() + 1);
            Ok(FakeService {
                status: RawServiceStatus {
                    current_state: 4,
                    process_id: 1000 + name.len() as u32,
                },
                config: RawServiceConfig {
                    display_name: format!("{} display", name),
                    start_type: 2,
                    service_start_name: "LocalSystem".to_string(),
                },
                fail,
                counters: Rc::clone(&self.counters),
            })
        }
    }

    #[derive(Clone)]
    struct FakeConnector {
        names: Vec<&'static str>,
        failures: Vec<(&'static str, Fail)>,
        connect_fails: bool,
        list_fails: bool,
        counters: Rc<Counters>,
    }

    impl FakeConnector {
        fn new(names: &[&'static str]) -> Self {
            Self {
                names: names.to_vec(),
                failures: Vec::new(),
                connect_fails: false,
                list_fails: false,
                counters: Rc::new(Counters::default()),
            }
        }

        fn failing(mut self, name: &'static str, fail: Fail) -> Self {
            self.failures.push((name, fail));
            self
        }
    }

    impl ManagerConnector for FakeConnector {
        type Manager = FakeManager;

        fn connect(&self) -> CollectResult<FakeManager> {
            if self.connect_fails {
                return Err(CollectError::connection("Service Control Manager", "denied"));
            }
            self.counters.connected.set(self.counters.connected.get() + 1);
            Ok(FakeManager {
                names: self.names.iter().map(|n| n.to_string()).collect(),
                failures: self
                    .failures
                    .iter()
                    .map(|(n, f)| (n.to_string(), *f))
                    .collect(),
                list_fails: self.list_fails,
                counters: Rc::clone(&self.counters),
            })
        }
    }

    fn run(connector: &FakeConnector) -> (CollectResult<SourceStats>, Vec<ServiceRecord>) {
        let backend = LiveHandleBackend::new(connector.clone());
        let mut records = Vec::new();
        let result = backend.collect_records(&mut |r| {
            records.push(r);
            Ok(())
        });
        (result, records)
    }

    #[test]
    fn test_collects_every_service() {
        let connector = FakeConnector::new(&["WinRM", "Spooler", "Dnscache"]);
        let (result, records) = run(&connector);
        let stats = result.unwrap();
        assert_eq!(stats, SourceStats { services: 3, skipped: 0 });
        assert_eq!(records.len(), 3);

        let winrm = &records[0];
        assert_eq!(winrm.name, "WinRM");
        assert_eq!(winrm.state, Some(State::Running));
        assert_eq!(winrm.start_mode, Some(StartMode::Auto));
        assert_eq!(winrm.process_id, 1005);
        assert_eq!(winrm.run_as, "LocalSystem");
        assert_eq!(winrm.status, None);
    }

    #[test]
    fn test_open_failure_skips_only_that_service() {
        let connector = FakeConnector::new(&["a", "b", "c", "d"]).failing("b", Fail::Open);
        let (result, records) = run(&connector);
        assert_eq!(result.unwrap(), SourceStats { services: 3, skipped: 1 });
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "c", "d"]);
    }

    #[test]
    fn test_config_and_status_failures_release_handles() {
        let connector = FakeConnector::new(&["a", "b", "c"])
            .failing("a", Fail::Config)
            .failing("c", Fail::Status);
        let (result, records) = run(&connector);
        assert_eq!(result.unwrap(), SourceStats { services: 1, skipped: 2 });
        assert_eq!(records.len(), 1);

        let counters = &connector.counters;
        assert_eq!(counters.opened.get(), 3);
        assert_eq!(counters.closed.get(), 3);
        assert_eq!(counters.connected.get(), 1);
        assert_eq!(counters.disconnected.get(), 1);
    }

    #[test]
    fn test_connect_failure_is_fatal() {
        let mut connector = FakeConnector::new(&["a"]);
        connector.connect_fails = true;
        let (result, records) = run(&connector);
        assert!(matches!(result, Err(CollectError::Connection { .. })));
        assert!(records.is_empty());
    }

    #[test]
    fn test_enumeration_failure_is_fatal_and_disconnects() {
        let mut connector = FakeConnector::new(&["a"]);
        connector.list_fails = true;
        let (result, records) = run(&connector);
        assert!(matches!(result, Err(CollectError::Enumeration { .. })));
        assert!(records.is_empty());
        assert_eq!(connector.counters.disconnected.get(), 1);
    }

    #[test]
    fn test_visitor_error_releases_everything() {
        let connector = FakeConnector::new(&["a", "b"]);
        let backend = LiveHandleBackend::new(connector.clone());
        let err = backend
            .collect_records(&mut |_| Err(CollectError::Sink("closed".into())))
            .unwrap_err();
        assert!(matches!(err, CollectError::Sink(_)));
        assert_eq!(connector.counters.opened.get(), 1);
        assert_eq!(connector.counters.closed.get(), 1);
        assert_eq!(connector.counters.disconnected.get(), 1);
    }

    #[test]
    fn test_each_pass_opens_its_own_connection() {
        let connector = FakeConnector::new(&["a"]);
        let backend = LiveHandleBackend::new(connector.clone());
        for _ in 0..3 {
            backend.collect_records(&mut |_| Ok(())).unwrap();
        }
        assert_eq!(connector.counters.connected.get(), 3);
        assert_eq!(connector.counters.disconnected.get(), 3);
    }
}
