//! Daemon error types.

use thiserror::Error;
use vaultview_connectors::ConnectorError;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Request body missing, not JSON, or without an `accounts` array
    #[error("Invalid payload")]
    InvalidPayload,

    /// Credential names an exchange with no registered connector
    #[error("Unsupported exchange: {0}")]
    UnsupportedExchange(String),

    /// Connector returned an error
    #[error("{exchange}: {source}")]
    Connector {
        /// Exchange identifier
        exchange: String,
        /// Underlying connector failure
        #[source]
        source: ConnectorError,
    },

    /// Connector did not answer within the fetch timeout
    #[error("{exchange}: balance fetch timed out after {timeout_ms}ms")]
    FetchTimeout {
        /// Exchange identifier
        exchange: String,
        /// Configured timeout
        timeout_ms: u128,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server runtime error
    #[error("Server error: {0}")]
    Server(String),
}

impl DaemonError {
    /// True for errors caused by the request rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DaemonError::InvalidPayload | DaemonError::UnsupportedExchange(_)
        )
    }
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
