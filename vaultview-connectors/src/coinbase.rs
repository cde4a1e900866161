//! Coinbase Advanced Trade balance connector
//!
//! Fetches balances from `GET /api/v3/brokerage/accounts`, following the
//! cursor until `has_next` is false.
//!
//! # Authentication
//!
//! Coinbase Developer Platform keys sign a short-lived ES256 JWT per request:
//! - `apiKey` is the key name (`organizations/{org}/apiKeys/{id}`), used as
//!   `kid` header and `sub` claim
//! - `apiSecret` is the EC private key in PKCS#8 PEM form. Escaped `\n`
//!   sequences, as produced by copying the key out of a JSON file, are accepted
//! - The `uri` claim binds the token to one method + host + path

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use vaultview_domain::{Balance, ExchangeCredential};

use crate::connector::Connector;
use crate::error::{ConnectorError, ConnectorResult};
use crate::http;

/// Coinbase REST API base URL
pub const COINBASE_API_URL: &str = "https://api.coinbase.com";

const ACCOUNTS_PATH: &str = "/api/v3/brokerage/accounts";

/// Page size for the accounts listing (API maximum)
const PAGE_LIMIT: u32 = 250;

/// Upper bound on pages followed for one listing
const MAX_PAGES: usize = 100;

/// Token lifetime accepted by Coinbase (seconds)
const TOKEN_TTL_SECS: i64 = 120;

/// Authenticated Coinbase connector.
pub struct CoinbaseConnector {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

/// JWT claims for Coinbase Developer Platform keys.
#[derive(Debug, Serialize, Deserialize)]
struct CoinbaseClaims {
    sub: String,
    iss: String,
    nbf: i64,
    exp: i64,
    uri: String,
}

impl CoinbaseConnector {
    /// Create a connector against the given base URL.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            request_timeout,
        }
    }

    /// `uri` claim value: method, host, and path without scheme or query.
    fn token_uri(&self, path: &str) -> String {
        let host = self
            .base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        format!("GET {}{}", host, path)
    }

    fn build_token(
        credential: &ExchangeCredential,
        uri: String,
        now: i64,
    ) -> ConnectorResult<String> {
        let pem = credential.api_secret.replace("\\n", "\n");
        let key = EncodingKey::from_ec_pem(pem.as_bytes())
            .map_err(|e| ConnectorError::InvalidCredential(format!("Invalid EC private key: {}", e)))?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(credential.api_key.clone());

        let claims = CoinbaseClaims {
            sub: credential.api_key.clone(),
            iss: "cdp".to_string(),
            nbf: now,
            exp: now + TOKEN_TTL_SECS,
            uri,
        };

        encode(&header, &claims, &key).map_err(|e| ConnectorError::Signature(e.to_string()))
    }

    async fn fetch_page(
        &self,
        credential: &ExchangeCredential,
        cursor: Option<&str>,
    ) -> ConnectorResult<AccountsPage> {
        let token = Self::build_token(credential, self.token_uri(ACCOUNTS_PATH), Utc::now().timestamp())?;

        let mut query = vec![("limit", PAGE_LIMIT.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let request = self
            .client
            .get(http::join_url(&self.base_url, ACCOUNTS_PATH))
            .query(&query)
            .bearer_auth(token);

        let body = http::send(self.id(), request, self.request_timeout, extract_error).await?;
        http::parse(&body)
    }
}

fn extract_error(body: &str) -> Option<String> {
    let err = serde_json::from_str::<CoinbaseErrorResponse>(body).ok()?;
    match err.message {
        Some(message) if !message.is_empty() => Some(format!("{}: {}", err.error, message)),
        _ => Some(err.error),
    }
}

#[async_trait]
impl Connector for CoinbaseConnector {
    fn id(&self) -> &str {
        "coinbase"
    }

    fn display_name(&self) -> &str {
        "Coinbase"
    }

    async fn get_balances(&self, credential: &ExchangeCredential) -> ConnectorResult<Vec<Balance>> {
        credential.validate()?;

        let mut balances = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(credential, cursor.as_deref()).await?;

            balances.extend(page.accounts.into_iter().filter_map(|account| {
                let hold = account.hold.map(|h| h.value).unwrap_or(Decimal::ZERO);
                let free = account.available_balance.value;
                if free.is_zero() && hold.is_zero() {
                    None
                } else {
                    Some(Balance::with_locked(account.currency, free, hold))
                }
            }));

            let next = match page.cursor {
                Some(next) if page.has_next && !next.is_empty() => next,
                _ => {
                    debug!(exchange = self.id(), count = balances.len(), "Fetched balances");
                    return Ok(balances);
                }
            };

            if cursor.as_deref() == Some(next.as_str()) {
                return Err(ConnectorError::Parse(format!(
                    "accounts cursor did not advance: {}",
                    next
                )));
            }
            cursor = Some(next);
        }

        Err(ConnectorError::Parse(format!(
            "accounts listing exceeded {} pages",
            MAX_PAGES
        )))
    }
}

// =============================================================================
// Coinbase Types (from API responses)
// =============================================================================

#[derive(Debug, Deserialize)]
struct CoinbaseErrorResponse {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsPage {
    accounts: Vec<CoinbaseAccount>,
    #[serde(default)]
    has_next: bool,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinbaseAccount {
    currency: String,
    available_balance: Money,
    #[serde(default)]
    hold: Option<Money>,
}

/// `{ "value": "1.5", "currency": "ETH" }`
#[derive(Debug, Deserialize)]
struct Money {
    value: Decimal,
}

// =============================================================================
// Tests
// =============================================================================
