//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use crate::fetcher::FetchPolicy;
use std::env;
use std::time::Duration;
use vaultview_connectors::{ConnectorMode, LiveConfig};

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Balance fetch configuration
    pub fetch: FetchConfig,

    /// Connector selection
    pub connectors: ConnectorsConfig,

    /// Log output format
    pub log_format: LogFormat,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Allowed CORS origins ("*" allows any)
    pub cors_origins: Vec<String>,
}

/// Balance fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Deadline for one exchange's `get_balances` call
    pub timeout: Duration,
    /// What to do when one exchange fails
    pub policy: FetchPolicy,
}

/// Connector selection.
#[derive(Debug, Clone)]
pub struct ConnectorsConfig {
    /// Mock or live connectors
    pub mode: ConnectorMode,
    /// Base URLs and HTTP timeout for live connectors
    pub live: LiveConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> DaemonResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Self::load_environment(&lookup)?;
        let api = Self::load_api_config(&lookup)?;
        let fetch = Self::load_fetch_config(&lookup)?;
        let connectors = Self::load_connectors_config(&lookup)?;
        let log_format = Self::load_log_format(&lookup)?;

        Ok(Self {
            api,
            fetch,
            connectors,
            log_format,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                cors_origins: vec!["*".to_string()],
            },
            fetch: FetchConfig {
                timeout: Duration::from_secs(2),
                policy: FetchPolicy::FailFast,
            },
            connectors: ConnectorsConfig {
                mode: ConnectorMode::Mock,
                live: LiveConfig::default(),
            },
            log_format: LogFormat::Text,
            environment: Environment::Test,
        }
    }

    fn load_environment<F: Fn(&str) -> Option<String>>(lookup: &F) -> DaemonResult<Environment> {
        let env_str = lookup("VAULTVIEW_ENV").unwrap_or_else(|| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid VAULTVIEW_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config<F: Fn(&str) -> Option<String>>(lookup: &F) -> DaemonResult<ApiConfig> {
        let host = lookup("VAULTVIEW_API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port_str = lookup("VAULTVIEW_API_PORT").unwrap_or_else(|| "8080".to_string());

        let port = port_str
            .parse::<u16>()
            .map_err(|_| DaemonError::Config(format!("Invalid VAULTVIEW_API_PORT: {}", port_str)))?;

        let cors_origins: Vec<String> = lookup("VAULTVIEW_CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if cors_origins.is_empty() {
            return Err(DaemonError::Config(
                "VAULTVIEW_CORS_ORIGINS must name at least one origin or \"*\"".to_string(),
            ));
        }

        Ok(ApiConfig {
            host,
            port,
            cors_origins,
        })
    }

    fn load_fetch_config<F: Fn(&str) -> Option<String>>(lookup: &F) -> DaemonResult<FetchConfig> {
        let timeout = Self::load_millis(lookup, "VAULTVIEW_FETCH_TIMEOUT_MS", 10_000)?;

        let policy = match lookup("VAULTVIEW_FETCH_POLICY")
            .unwrap_or_else(|| "fail_fast".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail_fast" => FetchPolicy::FailFast,
            "best_effort" => FetchPolicy::BestEffort,
            other => {
                return Err(DaemonError::Config(format!(
                    "Invalid VAULTVIEW_FETCH_POLICY: {}. Expected: fail_fast, best_effort",
                    other
                )))
            }
        };

        Ok(FetchConfig { timeout, policy })
    }

    fn load_connectors_config<F: Fn(&str) -> Option<String>>(
        lookup: &F,
    ) -> DaemonResult<ConnectorsConfig> {
        let mode = match lookup("VAULTVIEW_CONNECTORS")
            .unwrap_or_else(|| "mock".to_string())
            .to_lowercase()
            .as_str()
        {
            "mock" => ConnectorMode::Mock,
            "live" => ConnectorMode::Live,
            other => {
                return Err(DaemonError::Config(format!(
                    "Invalid VAULTVIEW_CONNECTORS: {}. Expected: mock, live",
                    other
                )))
            }
        };

        let defaults = LiveConfig::default();
        let live = LiveConfig {
            binance_url: lookup("VAULTVIEW_BINANCE_URL").unwrap_or(defaults.binance_url),
            coinbase_url: lookup("VAULTVIEW_COINBASE_URL").unwrap_or(defaults.coinbase_url),
            upbit_url: lookup("VAULTVIEW_UPBIT_URL").unwrap_or(defaults.upbit_url),
            request_timeout: Self::load_millis(lookup, "VAULTVIEW_HTTP_TIMEOUT_MS", 5_000)?,
        };

        Ok(ConnectorsConfig { mode, live })
    }

    fn load_log_format<F: Fn(&str) -> Option<String>>(lookup: &F) -> DaemonResult<LogFormat> {
        match lookup("VAULTVIEW_LOG_FORMAT")
            .unwrap_or_else(|| "text".to_string())
            .to_lowercase()
            .as_str()
        {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(DaemonError::Config(format!(
                "Invalid VAULTVIEW_LOG_FORMAT: {}. Expected: text, json",
                other
            ))),
        }
    }

    fn load_millis<F: Fn(&str) -> Option<String>>(
        lookup: &F,
        key: &str,
        default_ms: u64,
    ) -> DaemonResult<Duration> {
        match lookup(key) {
            Some(val) => match val.parse::<u64>() {
                Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
                _ => Err(DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            },
            None => Ok(Duration::from_millis(default_ms)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            fetch: FetchConfig {
                timeout: Duration::from_millis(10_000),
                policy: FetchPolicy::FailFast,
            },
            connectors: ConnectorsConfig {
                mode: ConnectorMode::Mock,
                live: LiveConfig::default(),
            },
            log_format: LogFormat::Text,
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> DaemonResult<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.connectors.mode, ConnectorMode::Mock);
        assert_eq!(config.fetch.policy, FetchPolicy::FailFast);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test();

        assert_eq!(config.api.port, 0);
        assert_eq!(config.environment, Environment::Test);
    }

    #[test]
    fn test_empty_lookup_matches_default() {
        let loaded = from_pairs(&[]).unwrap();
        let default = Config::default();

        assert_eq!(loaded.api.host, default.api.host);
        assert_eq!(loaded.api.port, default.api.port);
        assert_eq!(loaded.api.cors_origins, default.api.cors_origins);
        assert_eq!(loaded.fetch.timeout, default.fetch.timeout);
        assert_eq!(loaded.fetch.policy, default.fetch.policy);
        assert_eq!(loaded.connectors.mode, default.connectors.mode);
        assert_eq!(
            loaded.connectors.live.request_timeout,
            default.connectors.live.request_timeout
        );
        assert_eq!(loaded.log_format, default.log_format);
        assert_eq!(loaded.environment, default.environment);
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("VAULTVIEW_ENV", "prod"),
            ("VAULTVIEW_API_PORT", "9090"),
            ("VAULTVIEW_CONNECTORS", "live"),
            ("VAULTVIEW_FETCH_POLICY", "best_effort"),
            ("VAULTVIEW_FETCH_TIMEOUT_MS", "2500"),
            ("VAULTVIEW_UPBIT_URL", "http://localhost:9000"),
            ("VAULTVIEW_CORS_ORIGINS", "http://localhost:3000, https://app.example.com"),
            ("VAULTVIEW_LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.api.port, 9090);
        assert_eq!(config.connectors.mode, ConnectorMode::Live);
        assert_eq!(config.connectors.live.upbit_url, "http://localhost:9000");
        assert_eq!(config.fetch.policy, FetchPolicy::BestEffort);
        assert_eq!(config.fetch.timeout, Duration::from_millis(2500));
        assert_eq!(
            config.api.cors_origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            from_pairs(&[("VAULTVIEW_API_PORT", "http")]),
            Err(DaemonError::Config(_))
        ));
        assert!(from_pairs(&[("VAULTVIEW_CONNECTORS", "sandbox")]).is_err());
        assert!(from_pairs(&[("VAULTVIEW_FETCH_POLICY", "retry")]).is_err());
        assert!(from_pairs(&[("VAULTVIEW_FETCH_TIMEOUT_MS", "0")]).is_err());
        assert!(from_pairs(&[("VAULTVIEW_CORS_ORIGINS", " , ")]).is_err());
        assert!(from_pairs(&[("VAULTVIEW_ENV", "staging")]).is_err());
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
