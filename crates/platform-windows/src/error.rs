//! Error types for Windows platform operations

use thiserror::Error;
use winsvc_core::CollectError;

/// Errors that can occur during Windows API or WMI calls
#[derive(Debug, Error)]
pub enum WinError {
    /// Windows API call failed
    #[error("Windows API {api} failed: {message}")]
    ApiError { api: &'static str, message: String },

    /// COM initialization or WMI call failed
    #[error("WMI {operation} failed: {message}")]
    WmiError {
        operation: &'static str,
        message: String,
    },
}

impl WinError {
    /// Create an API error from a Windows error
    #[cfg(windows)]
    pub fn from_windows(api: &'static str, err: &windows::core::Error) -> Self {
        WinError::ApiError {
            api,
            message: err.message().to_string(),
        }
    }

    /// The API or WMI operation that failed
    pub fn operation(&self) -> &'static str {
        match self {
            WinError::ApiError { api, .. } => api,
            WinError::WmiError { operation, .. } => operation,
        }
    }

    /// Classify as a failure to reach `target`
    pub fn into_connection(self, target: &'static str) -> CollectError {
        CollectError::connection(target, self.to_string())
    }

    /// Classify as a failure to list services
    pub fn into_enumeration(self) -> CollectError {
        let operation = self.operation();
        CollectError::enumeration(operation, self.to_string())
    }

    /// Classify as a failure scoped to one service
    pub fn into_per_service(self, service: &str) -> CollectError {
        let operation = self.operation();
        CollectError::per_service(service, operation, self.to_string())
    }
}

/// Result type for Windows operations
pub type WinResult<T> = Result<T, WinError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error() -> WinError {
        WinError::ApiError {
            api: "OpenServiceW",
            message: "Access is denied.".to_string(),
        }
    }

    #[test]
    fn test_classification() {
        assert!(matches!(
            api_error().into_connection("Service Control Manager"),
            CollectError::Connection { target: "Service Control Manager", .. }
        ));
        assert!(matches!(
            api_error().into_enumeration(),
            CollectError::Enumeration { operation: "OpenServiceW", .. }
        ));
        match api_error().into_per_service("WinRM") {
            CollectError::PerService { service, operation, message } => {
                assert_eq!(service, "WinRM");
                assert_eq!(operation, "OpenServiceW");
                assert_eq!(message, "Windows API OpenServiceW failed: Access is denied.");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wmi_error_display() {
        let err = WinError::WmiError {
            operation: "ExecQuery",
            message: "Invalid query".to_string(),
        };
        assert_eq!(err.to_string(), "WMI ExecQuery failed: Invalid query");
        assert_eq!(err.operation(), "ExecQuery");
    }
}
