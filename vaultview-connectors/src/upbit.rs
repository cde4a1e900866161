//! Upbit balance connector
//!
//! Fetches balances from `GET /v1/accounts`.
//!
//! # Authentication
//!
//! Each request carries `Authorization: Bearer <jwt>`, an HS256 token signed
//! with the secret key whose claims hold the access key and a unique nonce.
//! Requests without query parameters need no `query_hash` claim.

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use vaultview_domain::{Balance, ExchangeCredential};

use crate::connector::Connector;
use crate::error::{ConnectorError, ConnectorResult};
use crate::http;

/// Upbit REST API base URL
pub const UPBIT_API_URL: &str = "https://api.upbit.com";

/// Authenticated Upbit connector.
pub struct UpbitConnector {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

/// JWT claims for Upbit private endpoints.
#[derive(Debug, Serialize, Deserialize)]
struct UpbitClaims {
    access_key: String,
    nonce: String,
}

impl UpbitConnector {
    /// Create a connector against the given base URL.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            request_timeout,
        }
    }

    fn build_token(credential: &ExchangeCredential) -> ConnectorResult<String> {
        let claims = UpbitClaims {
            access_key: credential.api_key.clone(),
            nonce: Uuid::now_v7().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(credential.api_secret.as_bytes()),
        )
        .map_err(|e| ConnectorError::Signature(e.to_string()))
    }
}

fn extract_error(body: &str) -> Option<String> {
    serde_json::from_str::<UpbitErrorResponse>(body)
        .ok()
        .map(|err| format!("{}: {}", err.error.name, err.error.message))
}

#[async_trait]
impl Connector for UpbitConnector {
    fn id(&self) -> &str {
        "upbit"
    }

    fn display_name(&self) -> &str {
        "Upbit"
    }

    async fn get_balances(&self, credential: &ExchangeCredential) -> ConnectorResult<Vec<Balance>> {
        credential.validate()?;

        let token = Self::build_token(credential)?;
        let request = self
            .client
            .get(http::join_url(&self.base_url, "/v1/accounts"))
            .bearer_auth(token);

        let body = http::send(self.id(), request, self.request_timeout, extract_error).await?;
        let accounts: Vec<UpbitAccount> = http::parse(&body)?;

        let balances: Vec<Balance> = accounts
            .into_iter()
            .map(|a| Balance::with_locked(a.currency, a.balance, a.locked))
            .collect();

        debug!(exchange = self.id(), count = balances.len(), "Fetched balances");
        Ok(balances)
    }
}

// =============================================================================
// Upbit Types (from API responses)
// =============================================================================

#[derive(Debug, Deserialize)]
struct UpbitErrorResponse {
    error: UpbitErrorBody,
}

#[derive(Debug, Deserialize)]
struct UpbitErrorBody {
    name: String,
    message: String,
}

/// One row of `/v1/accounts`. Amounts arrive as strings.
#[derive(Debug, Deserialize)]
struct UpbitAccount {
    currency: String,
    balance: Decimal,
    locked: Decimal,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    const SECRET: &str = "upbit_secret";

    fn decode_claims(token: &str, secret: &str) -> Option<UpbitClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        decode::<UpbitClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .ok()
            .map(|data| data.claims)
    }

    #[test]
    fn test_token_is_verifiable_with_secret() {
        let cred = ExchangeCredential::new("upbit", "access", SECRET);

        let token = UpbitConnector::build_token(&cred).unwrap();
        let claims = decode_claims(&token, SECRET).unwrap();

        assert_eq!(claims.access_key, "access");
        assert!(!claims.nonce.is_empty());
        assert!(decode_claims(&token, "other").is_none());
    }

    #[test]
    fn test_nonce_unique_per_token() {
        let cred = ExchangeCredential::new("upbit", "access", SECRET);

        let a = decode_claims(&UpbitConnector::build_token(&cred).unwrap(), SECRET).unwrap();
        let b = decode_claims(&UpbitConnector::build_token(&cred).unwrap(), SECRET).unwrap();

        assert_ne!(a.nonce, b.nonce);
    }

    async fn accounts_handler(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        let authorized = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| decode_claims(token, SECRET))
            .is_some();

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"name": "invalid_access_key", "message": "Invalid access key."}})),
            );
        }

        (
            StatusCode::OK,
            Json(json!([
                {"currency": "KRW", "balance": "1500000.0", "locked": "0.0",
                 "avg_buy_price": "0", "avg_buy_price_modified": false, "unit_currency": "KRW"},
                {"currency": "BTC", "balance": "0.02", "locked": "0.005",
                 "avg_buy_price": "90000000", "avg_buy_price_modified": false, "unit_currency": "KRW"}
            ])),
        )
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/v1/accounts", get(accounts_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_get_balances_maps_accounts() {
        let connector = UpbitConnector::new(spawn_stub().await, Duration::from_secs(5));

        let balances = connector
            .get_balances(&ExchangeCredential::new("upbit", "access", SECRET))
            .await
            .unwrap();

        assert_eq!(
            balances,
            vec![
                Balance::with_locked("KRW", dec!(1500000), dec!(0)),
                Balance::with_locked("BTC", dec!(0.02), dec!(0.005)),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_balances_surfaces_error_name() {
        let connector = UpbitConnector::new(spawn_stub().await, Duration::from_secs(5));

        let err = connector
            .get_balances(&ExchangeCredential::new("upbit", "access", "bad"))
            .await
            .unwrap_err();

        assert!(err.is_auth_failure());
        assert!(err.to_string().contains("invalid_access_key"));
    }
}
