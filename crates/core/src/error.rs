//! Error types for a collection pass

use thiserror::Error;

/// Errors that can occur while collecting service metrics
///
/// `Connection` and `Enumeration` abort the pass. `PerService` is only ever
/// produced inside the live backend, where it is logged and the service
/// skipped.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The service manager or query namespace could not be reached
    #[error("failed to connect to {target}: {message}")]
    Connection {
        target: &'static str,
        message: String,
    },

    /// The service list could not be obtained
    #[error("failed to enumerate services via {operation}: {message}")]
    Enumeration {
        operation: &'static str,
        message: String,
    },

    /// One service could not be opened or queried
    #[error("service {service}: {operation} failed: {message}")]
    PerService {
        service: String,
        operation: &'static str,
        message: String,
    },

    /// The metric sink refused a row
    #[error("metric sink rejected row: {0}")]
    Sink(String),
}

impl CollectError {
    pub fn connection(target: &'static str, message: impl Into<String>) -> Self {
        CollectError::Connection {
            target,
            message: message.into(),
        }
    }

    pub fn enumeration(operation: &'static str, message: impl Into<String>) -> Self {
        CollectError::Enumeration {
            operation,
            message: message.into(),
        }
    }

    pub fn per_service(
        service: impl Into<String>,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        CollectError::PerService {
            service: service.into(),
            operation,
            message: message.into(),
        }
    }

    /// Check if this error aborts the whole pass
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CollectError::PerService { .. })
    }
}

/// Result type for collection operations
pub type CollectResult<T> = Result<T, CollectError>;
