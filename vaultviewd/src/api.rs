//! HTTP API for the Vaultview daemon.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Supported exchanges
//! - Balance fetch and aggregation

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use vaultview_domain::{AggregatedBalance, BalancesByExchange, ExchangeCredential, ExchangeSummary};

use crate::error::{DaemonError, DaemonResult};
use crate::fetcher::{BalanceFetcher, FetchOutcome};

/// Message returned for failures that carry no usable message.
const FALLBACK_ERROR: &str = "Server error";

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState {
    pub fetcher: Arc<BalanceFetcher>,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Balance fetch request.
#[derive(Debug, Deserialize)]
pub struct BalancesRequest {
    pub accounts: Vec<ExchangeCredential>,
}

/// Balance fetch response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub balances_by_exchange: BalancesByExchange,
    pub aggregated: Vec<AggregatedBalance>,
    /// Only present when exchanges failed under the best-effort policy
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
}

impl From<FetchOutcome> for BalancesResponse {
    fn from(outcome: FetchOutcome) -> Self {
        Self {
            balances_by_exchange: outcome.balances_by_exchange,
            aggregated: outcome.aggregated,
            failures: outcome.failures,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router(state: Arc<ApiState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/exchanges", get(exchanges_handler))
        .route("/api/balances", post(balances_handler))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer for the configured origins.
///
/// `"*"` anywhere in the list allows any origin.
pub fn cors_layer(origins: &[String]) -> DaemonResult<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(AnyOrigin));
    }

    let allowed = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| DaemonError::Config(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<DaemonResult<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(allowed)))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List supported exchanges.
async fn exchanges_handler(State(state): State<Arc<ApiState>>) -> Json<Vec<ExchangeSummary>> {
    Json(state.fetcher.registry().supported_exchanges())
}

/// Fetch balances for every submitted account and aggregate them.
///
/// The body is parsed by hand so that every malformed input (missing body,
/// invalid JSON, missing or non-array `accounts`, malformed credential)
/// maps to the same `Invalid payload` error.
async fn balances_handler(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<BalancesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request: BalancesRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Rejected balances payload");
        to_error_response(DaemonError::InvalidPayload)
    })?;

    let outcome = state
        .fetcher
        .fetch(&request.accounts)
        .await
        .map_err(to_error_response)?;

    Ok(Json(outcome.into()))
}

// =============================================================================
// Helpers
// =============================================================================

/// Convert DaemonError to HTTP error response.
fn to_error_response(e: DaemonError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if e.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        error!(error = %e, "Balance request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Response for a panicking handler.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: FALLBACK_ERROR.to_string(),
        }),
    )
        .into_response()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchPolicy;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::util::ServiceExt;
    use vaultview_connectors::{Connector, ConnectorRegistry, ConnectorResult};
    use vaultview_domain::Balance;

    struct PanickingConnector;

    #[async_trait]
    impl Connector for PanickingConnector {
        fn id(&self) -> &str {
            "binance"
        }

        fn display_name(&self) -> &str {
            "Binance"
        }

        async fn get_balances(&self, _credential: &ExchangeCredential) -> ConnectorResult<Vec<Balance>> {
            panic!("connector bug");
        }
    }

    fn create_test_app(registry: ConnectorRegistry) -> Router {
        let fetcher = BalanceFetcher::new(
            Arc::new(registry),
            Duration::from_secs(1),
            FetchPolicy::FailFast,
        );
        let state = Arc::new(ApiState {
            fetcher: Arc::new(fetcher),
        });
        let cors = cors_layer(&["*".to_string()]).unwrap();

        create_router(state, cors)
    }

    async fn post_balances(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/balances")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(ConnectorRegistry::mock());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn test_exchanges_endpoint() {
        let app = create_test_app(ConnectorRegistry::mock());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/exchanges")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let exchanges: Vec<ExchangeSummary> = serde_json::from_slice(&body).unwrap();
        let ids: Vec<&str> = exchanges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["binance", "coinbase", "upbit"]);
    }

    #[tokio::test]
    async fn test_invalid_payloads() {
        let cases = [
            "",
            "not json",
            "null",
            "{}",
            r#"{"accounts": "binance"}"#,
            r#"{"accounts": {"exchange": "binance"}}"#,
            r#"{"accounts": [42]}"#,
            r#"{"accounts": [{"exchange": "binance"}]}"#,
        ];

        for case in cases {
            let (status, body) = post_balances(create_test_app(ConnectorRegistry::mock()), case).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {case:?}");
            assert_eq!(body["error"], "Invalid payload", "payload: {case:?}");
        }
    }

    #[tokio::test]
    async fn test_unsupported_exchange() {
        let app = create_test_app(ConnectorRegistry::mock());

        let (status, body) = post_balances(
            app,
            r#"{"accounts": [{"exchange": "kraken", "apiKey": "k", "apiSecret": "s"}]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unsupported exchange: kraken");
    }

    #[tokio::test]
    async fn test_empty_accounts() {
        let app = create_test_app(ConnectorRegistry::mock());

        let (status, body) = post_balances(app, r#"{"accounts": []}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({"balancesByExchange": {}, "aggregated": []})
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_server_error() {
        let app = create_test_app(ConnectorRegistry::new().with(PanickingConnector));

        let (status, body) = post_balances(
            app,
            r#"{"accounts": [{"exchange": "binance", "apiKey": "k", "apiSecret": "s"}]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server error");
    }

    #[test]
    fn test_error_status_mapping() {
        let (status, Json(body)) = to_error_response(DaemonError::InvalidPayload);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Invalid payload");

        let (status, Json(body)) = to_error_response(DaemonError::UnsupportedExchange("ftx".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Unsupported exchange: ftx");

        let (status, _) = to_error_response(DaemonError::FetchTimeout {
            exchange: "upbit".to_string(),
            timeout_ms: 10,
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_cors_layer_rejects_bad_origin() {
        assert!(cors_layer(&["http://localhost:3000".to_string()]).is_ok());
        assert!(matches!(
            cors_layer(&["bad\norigin".to_string()]),
            Err(DaemonError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed() {
        let app = create_test_app(ConnectorRegistry::mock());

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/balances")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
