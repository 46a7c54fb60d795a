//! Product configuration for the API clients.
//!
//! Provides centralized configuration for every product endpoint, its
//! credentials, and the shared timeout/retry/poll settings. Configuration is
//! loaded from environment variables with defaults where the product has a
//! well-known public API.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use toolhub_client::{Auth, ClientConfig, PollConfig, RateLimitPolicy};

/// Header carrying the test management API key.
pub const TEST_MANAGEMENT_KEY_HEADER: &str = "apikey";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Configuration for all products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsConfig {
    /// Error tracking API configuration.
    pub error_tracking: ServiceEndpoint,

    /// Contract testing broker configuration.
    pub contract_testing: ServiceEndpoint,

    /// Test management API configuration.
    pub test_management: ServiceEndpoint,

    /// Default request timeout in seconds.
    pub default_timeout_secs: u64,

    /// Maximum replays of a throttled request.
    pub rate_limit_max_retries: u32,

    /// Delay between async job status checks, in milliseconds.
    pub poll_interval_ms: u64,

    /// Budget for an async job to finish, in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for ProductsConfig {
    /// Returns defaults with public API URLs and no credentials.
    fn default() -> Self {
        Self {
            error_tracking: ServiceEndpoint {
                base_url: Some("https://api.bugsnag.com".to_string()),
                auth: Auth::None,
            },
            contract_testing: ServiceEndpoint {
                base_url: None,
                auth: Auth::None,
            },
            test_management: ServiceEndpoint {
                base_url: Some("https://api.testmanagement.example.com".to_string()),
                auth: Auth::None,
            },
            default_timeout_secs: 30,
            rate_limit_max_retries: 5,
            poll_interval_ms: 1000,
            poll_timeout_secs: 120,
        }
    }
}

impl ProductsConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ERROR_TRACKING_API_URL`: Error tracking API URL (default: https://api.bugsnag.com)
    /// - `ERROR_TRACKING_AUTH_TOKEN`: Error tracking personal auth token
    /// - `CONTRACT_BROKER_URL`: Contract broker URL (no default)
    /// - `CONTRACT_BROKER_TOKEN`: Contract broker bearer token
    /// - `CONTRACT_BROKER_USERNAME` / `CONTRACT_BROKER_PASSWORD`: Contract broker basic auth
    /// - `TEST_MANAGEMENT_API_URL`: Test management API URL
    /// - `TEST_MANAGEMENT_API_KEY`: Test management API key
    /// - `TOOLHUB_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `TOOLHUB_RATE_LIMIT_MAX_RETRIES`: Replays of throttled requests (default: 5)
    /// - `TOOLHUB_POLL_INTERVAL_MS`: Job status check interval (default: 1000)
    /// - `TOOLHUB_POLL_TIMEOUT_SECS`: Job completion budget (default: 120)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let contract_auth = match (
            value("CONTRACT_BROKER_TOKEN"),
            value("CONTRACT_BROKER_USERNAME"),
            value("CONTRACT_BROKER_PASSWORD"),
        ) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(ConfigError::InvalidValue {
                    key: "CONTRACT_BROKER_TOKEN".to_string(),
                    message: "set either a token or a username/password, not both".to_string(),
                })
            }
            (Some(token), None, None) => Auth::Bearer(token),
            (None, Some(username), Some(password)) => Auth::Basic { username, password },
            (None, Some(_), None) => {
                return Err(ConfigError::MissingEnvVar("CONTRACT_BROKER_PASSWORD".to_string()))
            }
            (None, None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("CONTRACT_BROKER_USERNAME".to_string()))
            }
            (None, None, None) => Auth::None,
        };

        Ok(Self {
            error_tracking: ServiceEndpoint {
                base_url: value("ERROR_TRACKING_API_URL").or(default.error_tracking.base_url),
                auth: value("ERROR_TRACKING_AUTH_TOKEN")
                    .map(Auth::Token)
                    .unwrap_or(Auth::None),
            },
            contract_testing: ServiceEndpoint {
                base_url: value("CONTRACT_BROKER_URL"),
                auth: contract_auth,
            },
            test_management: ServiceEndpoint {
                base_url: value("TEST_MANAGEMENT_API_URL").or(default.test_management.base_url),
                auth: value("TEST_MANAGEMENT_API_KEY")
                    .map(|key| Auth::Header {
                        name: TEST_MANAGEMENT_KEY_HEADER.to_string(),
                        value: key,
                    })
                    .unwrap_or(Auth::None),
            },
            default_timeout_secs: value("TOOLHUB_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.default_timeout_secs),
            rate_limit_max_retries: value("TOOLHUB_RATE_LIMIT_MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.rate_limit_max_retries),
            poll_interval_ms: value("TOOLHUB_POLL_INTERVAL_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.poll_interval_ms),
            poll_timeout_secs: value("TOOLHUB_POLL_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.poll_timeout_secs),
        })
    }

    /// Get the default request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Async job polling cadence.
    pub fn poll(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.poll_timeout_secs),
        }
    }

    /// Rate-limit guard policy.
    pub fn rate_limit(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_retries: self.rate_limit_max_retries,
            ..RateLimitPolicy::default()
        }
    }

    /// Build the client configuration for an endpoint, if it is configured.
    pub fn client_config(&self, endpoint: &ServiceEndpoint) -> Option<ClientConfig> {
        let base_url = endpoint.base_url.as_ref().filter(|_| endpoint.has_auth())?;
        Some(
            ClientConfig::new(base_url.clone(), endpoint.auth.clone())
                .with_timeout(self.timeout())
                .with_rate_limit(self.rate_limit())
                .with_poll(self.poll()),
        )
    }

    /// Validate that every product has credentials.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if !self.error_tracking.has_auth() {
            return Err(ConfigError::MissingEnvVar("ERROR_TRACKING_AUTH_TOKEN".to_string()));
        }
        if self.contract_testing.base_url.is_none() {
            return Err(ConfigError::MissingEnvVar("CONTRACT_BROKER_URL".to_string()));
        }
        if !self.contract_testing.has_auth() {
            return Err(ConfigError::MissingEnvVar("CONTRACT_BROKER_TOKEN".to_string()));
        }
        if !self.test_management.has_auth() {
            return Err(ConfigError::MissingEnvVar("TEST_MANAGEMENT_API_KEY".to_string()));
        }
        Ok(())
    }
}

/// Configuration for a single product endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Base URL for the product API (e.g., "https://api.bugsnag.com").
    pub base_url: Option<String>,

    /// Authentication scheme and credentials.
    pub auth: Auth,
}

impl ServiceEndpoint {
    /// Endpoint with a URL and credentials.
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Self {
        Self {
            base_url: Some(base_url.into()),
            auth,
        }
    }

    /// Check if credentials are available.
    pub fn has_auth(&self) -> bool {
        self.auth != Auth::None
    }

    /// Whether tools for this endpoint can be registered.
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.has_auth()
    }
}
