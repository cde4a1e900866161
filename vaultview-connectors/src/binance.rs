//! Binance Spot balance connector
//!
//! Fetches balances from `GET /api/v3/account`.
//!
//! # Authentication
//!
//! Binance uses API key + secret with HMAC SHA256 signatures.
//! All signed requests require:
//! - `X-MBX-APIKEY` header
//! - `signature` query parameter (HMAC SHA256 of query string)
//! - `timestamp` query parameter

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;

use vaultview_domain::{Balance, ExchangeCredential};

use crate::connector::Connector;
use crate::error::{ConnectorError, ConnectorResult};
use crate::http;

// =============================================================================
// Constants
// =============================================================================

/// Binance REST API base URL (Spot)
pub const BINANCE_API_URL: &str = "https://api.binance.com";

/// How long a signed request stays valid on the exchange side (ms)
const RECV_WINDOW_MS: u64 = 5000;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Binance Connector
// =============================================================================

/// Authenticated Binance connector.
pub struct BinanceConnector {
    /// HTTP client
    client: Client,
    /// API base URL
    base_url: String,
    /// Per-request timeout
    request_timeout: Duration,
}

impl BinanceConnector {
    /// Create a connector against the given base URL.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            request_timeout,
        }
    }

    /// Build query string with signature for signed requests.
    ///
    /// Binance requires:
    /// 1. All parameters in query string
    /// 2. HMAC SHA256 signature of query string
    /// 3. signature and timestamp as query parameters
    fn build_signed_query(
        secret: &str,
        mut params: Vec<(&str, String)>,
        timestamp_ms: i64,
    ) -> ConnectorResult<String> {
        params.push(("timestamp", timestamp_ms.to_string()));
        params.sort_by(|a, b| a.0.cmp(b.0));

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let signature = sign(secret, &query_string)?;

        Ok(format!("{}&signature={}", query_string, signature))
    }
}

/// Hex-encoded HMAC SHA256 of `payload`.
fn sign(secret: &str, payload: &str) -> ConnectorResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ConnectorError::Signature(format!("HMAC error: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn extract_error(body: &str) -> Option<String> {
    serde_json::from_str::<BinanceErrorResponse>(body)
        .ok()
        .map(|err| format!("{}: {}", err.code, err.msg))
}

#[async_trait]
impl Connector for BinanceConnector {
    fn id(&self) -> &str {
        "binance"
    }

    fn display_name(&self) -> &str {
        "Binance"
    }

    async fn get_balances(&self, credential: &ExchangeCredential) -> ConnectorResult<Vec<Balance>> {
        credential.validate()?;

        let query = Self::build_signed_query(
            &credential.api_secret,
            vec![
                ("omitZeroBalances", "true".to_string()),
                ("recvWindow", RECV_WINDOW_MS.to_string()),
            ],
            Utc::now().timestamp_millis(),
        )?;
        let url = format!("{}?{}", http::join_url(&self.base_url, "/api/v3/account"), query);

        let request = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &credential.api_key);
        let body = http::send(self.id(), request, self.request_timeout, extract_error).await?;
        let account: AccountResponse = http::parse(&body)?;

        let balances: Vec<Balance> = account
            .balances
            .into_iter()
            .filter(|b| !(b.free.is_zero() && b.locked.is_zero()))
            .map(|b| Balance::with_locked(b.asset, b.free, b.locked))
            .collect();

        debug!(exchange = self.id(), count = balances.len(), "Fetched balances");
        Ok(balances)
    }
}

// =============================================================================
// Binance Types (from API responses)
// =============================================================================

/// Binance error response.
#[derive(Debug, Deserialize)]
struct BinanceErrorResponse {
    code: i64,
    msg: String,
}

/// Spot account information (only the fields we use).
#[derive(Debug, Deserialize)]
struct AccountResponse {
    balances: Vec<AccountBalance>,
}

/// One asset row of the account response. Amounts arrive as strings.
#[derive(Debug, Deserialize)]
struct AccountBalance {
    asset: String,
    free: Decimal,
    locked: Decimal,
}

// =============================================================================
// Tests
// =============================================================================
