//! WMI `Win32_Service` query

use crate::error::WinError;
use tracing::trace;
use ::wmi::{COMLibrary, WMIConnection};
use winsvc_core::{CollectResult, ServiceQuery, Win32Service};

const WMI_TARGET: &str = "WMI namespace ROOT\\CIMV2";

thread_local! {
    // COM is initialized once per thread and stays initialized for its lifetime.
    static COM_LIBRARY: Result<COMLibrary, String> = COMLibrary::new().map_err(|e| e.to_string());
}

/// Runs WQL queries against the local `ROOT\CIMV2` namespace
///
/// A new WMI connection is made for every query.
#[derive(Debug, Clone, Copy, Default)]
pub struct WmiServiceQuery;

impl WmiServiceQuery {
    fn connect(&self) -> Result<WMIConnection, WinError> {
        let com = COM_LIBRARY.with(|lib| lib.clone()).map_err(|message| WinError::WmiError {
            operation: "CoInitializeEx",
            message,
        })?;

        WMIConnection::new(com).map_err(|e| WinError::WmiError {
            operation: "ConnectServer",
            message: e.to_string(),
        })
    }
}

impl ServiceQuery for WmiServiceQuery {
    fn query_services(&self, wql: &str) -> CollectResult<Vec<Win32Service>> {
        let connection = self.connect().map_err(|e| e.into_connection(WMI_TARGET))?;

        let services: Vec<Win32Service> = connection.raw_query(wql).map_err(|e| {
            WinError::WmiError {
                operation: "ExecQuery",
                message: e.to_string(),
            }
            .into_enumeration()
        })?;

        trace!(count = services.len(), "Win32_Service query returned rows");
        Ok(services)
    }
}
