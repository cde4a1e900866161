//! Exchange Credentials Domain Types
//!
//! Credentials arrive with a balance request and live only for its duration.
//!
//! # Security Model
//!
//! - Credentials are never persisted
//! - The API secret is zeroized when dropped
//! - `Debug` output redacts the secret so credentials can appear in traces

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use zeroize::Zeroizing;

// =============================================================================
// Errors
// =============================================================================

/// Domain errors for credential validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Credential is missing a required part
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
}

// =============================================================================
// Exchange Credential
// =============================================================================

/// API credentials for one exchange account.
///
/// Wire shape: `{ "exchange": "...", "apiKey": "...", "apiSecret": "..." }`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeCredential {
    /// Exchange identifier, matched against the connector registry
    pub exchange: String,
    /// API key (public identifier)
    pub api_key: String,
    /// API secret (never logged)
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_secret: Zeroizing<String>,
}

impl ExchangeCredential {
    /// Create a new credential.
    pub fn new(
        exchange: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            api_key: api_key.into(),
            api_secret: Zeroizing::new(api_secret.into()),
        }
    }

    /// Check that both key and secret are present.
    ///
    /// Mock connectors accept anything; authenticated connectors call this
    /// before signing.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidCredential` if the key or secret is blank
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.api_key.trim().is_empty() {
            return Err(DomainError::InvalidCredential(format!(
                "API key is empty for {}",
                self.exchange
            )));
        }
        if self.api_secret.trim().is_empty() {
            return Err(DomainError::InvalidCredential(format!(
                "API secret is empty for {}",
                self.exchange
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ExchangeCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeCredential")
            .field("exchange", &self.exchange)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Zeroizing<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Zeroizing::new)
}

// =============================================================================
// Exchange Summary
// =============================================================================

/// Identifier and display name of a supported exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSummary {
    /// Registry identifier (e.g., "binance")
    pub id: String,
    /// Human-readable label (e.g., "Binance")
    pub name: String,
}

impl ExchangeSummary {
    /// Create a summary.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
