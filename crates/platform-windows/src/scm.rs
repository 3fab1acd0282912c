//! Windows Service Control Manager (SCM) integration
//!
//! Opens a manager connection per pass, lists Win32 services and queries each
//! one through its own handle. Handles close themselves on drop.

use crate::error::{WinError, WinResult};
use std::mem::size_of;
use tracing::trace;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::ERROR_MORE_DATA;
use windows::Win32::System::Services::{
    CloseServiceHandle, EnumServicesStatusExW, OpenSCManagerW, OpenServiceW, QueryServiceConfigW,
    QueryServiceStatusEx, ENUM_SERVICE_STATUS_PROCESSW, QUERY_SERVICE_CONFIGW, SC_ENUM_PROCESS_INFO,
    SC_HANDLE, SC_MANAGER_CONNECT, SC_MANAGER_ENUMERATE_SERVICE, SC_STATUS_PROCESS_INFO,
    SERVICE_QUERY_CONFIG, SERVICE_QUERY_STATUS, SERVICE_STATE_ALL, SERVICE_STATUS_PROCESS,
    SERVICE_WIN32,
};
use winsvc_core::{
    CollectResult, ManagerConnector, RawServiceConfig, RawServiceStatus, ServiceHandle,
    ServiceManager,
};

const SCM_TARGET: &str = "Service Control Manager";

/// RAII wrapper for SC_HANDLE
struct ScHandle(SC_HANDLE);

impl Drop for ScHandle {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            unsafe {
                let _ = CloseServiceHandle(self.0);
            }
        }
    }
}

/// Connects to the local SCM
#[derive(Debug, Clone, Copy, Default)]
pub struct ScmConnector;

impl ManagerConnector for ScmConnector {
    type Manager = ScManager;

    fn connect(&self) -> CollectResult<ScManager> {
        ScManager::open().map_err(|e| e.into_connection(SCM_TARGET))
    }
}

/// An open connection to the SCM
pub struct ScManager {
    handle: ScHandle,
}

impl ScManager {
    fn open() -> WinResult<Self> {
        let scm = unsafe {
            OpenSCManagerW(
                PCWSTR::null(),
                PCWSTR::null(),
                SC_MANAGER_CONNECT | SC_MANAGER_ENUMERATE_SERVICE,
            )
        }
        .map_err(|e| WinError::from_windows("OpenSCManagerW", &e))?;

        Ok(Self {
            handle: ScHandle(scm),
        })
    }
}

impl ServiceManager for ScManager {
    type Service = ScService;

    fn list_services(&self) -> CollectResult<Vec<String>> {
        enum_service_names(self.handle.0).map_err(WinError::into_enumeration)
    }

    fn open_service(&self, name: &str) -> CollectResult<ScService> {
        let wide = to_wide(name);
        let service = unsafe {
            OpenServiceW(
                self.handle.0,
                PCWSTR(wide.as_ptr()),
                SERVICE_QUERY_CONFIG | SERVICE_QUERY_STATUS,
            )
        }
        .map_err(|e| WinError::from_windows("OpenServiceW", &e).into_per_service(name))?;

        Ok(ScService {
            name: name.to_string(),
            handle: ScHandle(service),
        })
    }
}

/// An open service handle
pub struct ScService {
    name: String,
    handle: ScHandle,
}

impl ServiceHandle for ScService {
    fn config(&self) -> CollectResult<RawServiceConfig> {
        query_config(self.handle.0).map_err(|e| e.into_per_service(&self.name))
    }

    fn status(&self) -> CollectResult<RawServiceStatus> {
        query_status(self.handle.0).map_err(|e| e.into_per_service(&self.name))
    }
}

/// List the names of all Win32 services, following the resume handle until
/// the SCM has returned every entry
fn enum_service_names(scm: SC_HANDLE) -> WinResult<Vec<String>> {
    let mut names = Vec::new();
    // u64 storage keeps the pointer fields of each entry aligned
    let mut buffer: Vec<u64> = Vec::new();
    let mut resume_handle = 0u32;

    loop {
        let mut bytes_needed = 0u32;
        let mut services_returned = 0u32;
        let byte_len = buffer.len() * size_of::<u64>();

        let result = unsafe {
            let bytes = std::slice::from_raw_parts_mut(buffer.as_mut_ptr() as *mut u8, byte_len);
            EnumServicesStatusExW(
                scm,
                SC_ENUM_PROCESS_INFO,
                SERVICE_WIN32,
                SERVICE_STATE_ALL,
                if bytes.is_empty() { None } else { Some(bytes) },
                &mut bytes_needed,
                &mut services_returned,
                Some(&mut resume_handle as *mut u32),
                PCWSTR::null(),
            )
        };

        if services_returned > 0 {
            // Entry strings point into `buffer`; copy them out before the next call.
            let entries = unsafe {
                std::slice::from_raw_parts(
                    buffer.as_ptr() as *const ENUM_SERVICE_STATUS_PROCESSW,
                    services_returned as usize,
                )
            };
            names.extend(entries.iter().map(|e| pwstr_to_string(e.lpServiceName)));
        }

        match result {
            Ok(()) => break,
            Err(e) if e.code() == ERROR_MORE_DATA.to_hresult() => {
                let needed = bytes_needed as usize;
                if services_returned == 0 && needed <= byte_len {
                    return Err(WinError::from_windows("EnumServicesStatusExW", &e));
                }
                if needed > byte_len {
                    buffer.resize(needed.div_ceil(size_of::<u64>()), 0);
                }
            }
            Err(e) => return Err(WinError::from_windows("EnumServicesStatusExW", &e)),
        }
    }

    trace!(count = names.len(), "EnumServicesStatusExW returned services");
    Ok(names)
}

fn query_config(service: SC_HANDLE) -> WinResult<RawServiceConfig> {
    const API: &str = "QueryServiceConfigW";

    unsafe {
        // Get required buffer size
        let mut bytes_needed = 0u32;
        let sizing = QueryServiceConfigW(service, None, 0, &mut bytes_needed);

        if bytes_needed == 0 {
            return Err(match sizing {
                Err(e) => WinError::from_windows(API, &e),
                Ok(()) => WinError::ApiError {
                    api: API,
                    message: "no configuration returned".to_string(),
                },
            });
        }

        // u64 storage keeps the pointer fields of the struct aligned
        let mut buffer: Vec<u64> = vec![0; (bytes_needed as usize).div_ceil(size_of::<u64>())];
        let config = buffer.as_mut_ptr() as *mut QUERY_SERVICE_CONFIGW;

        QueryServiceConfigW(service, Some(config), bytes_needed, &mut bytes_needed)
            .map_err(|e| WinError::from_windows(API, &e))?;

        Ok(RawServiceConfig {
            display_name: pwstr_to_string((*config).lpDisplayName),
            start_type: (*config).dwStartType.0,
            service_start_name: pwstr_to_string((*config).lpServiceStartName),
        })
    }
}

fn query_status(service: SC_HANDLE) -> WinResult<RawServiceStatus> {
    let mut status = SERVICE_STATUS_PROCESS::default();
    let mut bytes_needed = 0u32;

    unsafe {
        let buffer = std::slice::from_raw_parts_mut(
            &mut status as *mut SERVICE_STATUS_PROCESS as *mut u8,
            size_of::<SERVICE_STATUS_PROCESS>(),
        );
        QueryServiceStatusEx(service, SC_STATUS_PROCESS_INFO, Some(buffer), &mut bytes_needed)
            .map_err(|e| WinError::from_windows("QueryServiceStatusEx", &e))?;
    }

    Ok(RawServiceStatus {
        current_state: status.dwCurrentState.0,
        process_id: status.dwProcessId,
    })
}

/// Null-terminated UTF-16 copy of `s`
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Convert PWSTR to String
fn pwstr_to_string(pwstr: PWSTR) -> String {
    if pwstr.is_null() {
        return String::new();
    }

    unsafe {
        let len = (0..).take_while(|&i| *pwstr.0.add(i) != 0).count();
        String::from_utf16_lossy(std::slice::from_raw_parts(pwstr.0, len))
    }
}
