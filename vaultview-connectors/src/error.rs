//! Connector error types.

use thiserror::Error;
use vaultview_domain::DomainError;

/// Errors that can occur while fetching balances from an exchange.
///
/// An empty balance list is a success, never one of these.
#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    /// Credential unusable before any request was made
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Failed to build request signature or token
    #[error("Failed to build signature: {0}")]
    Signature(String),

    /// HTTP transport failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// Exchange answered with an error status
    #[error("{exchange} API error: {status} - {msg}")]
    Api {
        /// Exchange identifier
        exchange: String,
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response body
        msg: String,
    },

    /// Response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,
}

impl ConnectorError {
    /// True for authentication/authorization rejections by the exchange.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ConnectorError::InvalidCredential(_)
                | ConnectorError::Api {
                    status: 401 | 403,
                    ..
                }
        )
    }
}

impl From<DomainError> for ConnectorError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidCredential(msg) => ConnectorError::InvalidCredential(msg),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
