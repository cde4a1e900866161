//! Shared request plumbing for the authenticated connectors.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{ConnectorError, ConnectorResult};

/// Send a request and return the body of a 2xx response.
///
/// `request_timeout` covers the whole exchange, including reading the body.
/// Non-2xx responses become `ConnectorError::Api`; `extract_error` pulls the
/// exchange's own message out of the body when it has a known shape.
pub(crate) async fn send(
    exchange: &str,
    request: RequestBuilder,
    request_timeout: Duration,
    extract_error: fn(&str) -> Option<String>,
) -> ConnectorResult<String> {
    let exchange_round_trip = async {
        let response = request
            .send()
            .await
            .map_err(|e| ConnectorError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ConnectorError::Parse(e.to_string()))?;

        Ok::<_, ConnectorError>((status, body))
    };

    let (status, body) = timeout(request_timeout, exchange_round_trip)
        .await
        .map_err(|_| ConnectorError::Timeout)??;

    if !status.is_success() {
        let msg = extract_error(&body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });
        return Err(ConnectorError::Api {
            exchange: exchange.to_string(),
            status: status.as_u16(),
            msg,
        });
    }

    Ok(body)
}

/// Deserialize a response body.
pub(crate) fn parse<T: DeserializeOwned>(body: &str) -> ConnectorResult<T> {
    serde_json::from_str(body).map_err(|e| ConnectorError::Parse(e.to_string()))
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
