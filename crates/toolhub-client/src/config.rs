//! Client configuration.
//!
//! A [`ClientConfig`] is assembled once with the `with_*` builders and then
//! moved into a [`ResourceClient`](crate::ResourceClient), which only hands
//! out shared references. Changing any setting means building a new client.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default header carrying the collection size.
pub const DEFAULT_TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Authentication scheme for one client. Exactly one scheme is used per client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Auth {
    /// `Authorization: token <value>`
    Token(String),
    /// `Authorization: Bearer <value>`
    Bearer(String),
    /// `Authorization: Basic base64(username:password)`
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// Product-specific API key header, e.g. `apikey: <value>`.
    Header {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// No authentication.
    None,
}

impl Auth {
    /// Header name and value to attach to every request.
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            Auth::Token(token) => Some(("Authorization".to_string(), format!("token {}", token))),
            Auth::Bearer(token) => Some(("Authorization".to_string(), format!("Bearer {}", token))),
            Auth::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{}:{}", username, password));
                Some(("Authorization".to_string(), format!("Basic {}", encoded)))
            }
            Auth::Header { name, value } => Some((name.clone(), value.clone())),
            Auth::None => None,
        }
    }

    /// Short scheme name, safe to log.
    pub fn scheme(&self) -> &'static str {
        match self {
            Auth::Token(_) => "token",
            Auth::Bearer(_) => "bearer",
            Auth::Basic { .. } => "basic",
            Auth::Header { .. } => "header",
            Auth::None => "none",
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Header { name, .. } => write!(f, "Auth::Header({}: ***)", name),
            other => write!(f, "Auth::{}(***)", other.scheme()),
        }
    }
}

/// Behaviour of the rate-limit guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Maximum number of replays after throttled responses
    pub max_retries: u32,

    /// Delay used when the retry-after header is missing or not a whole number
    pub fallback_delay: Duration,

    /// Upper bound for a single server-requested delay
    pub max_delay: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            fallback_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Async job polling cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between status checks
    pub interval: Duration,

    /// Wall-clock budget for the job to reach a terminal state
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Configuration owned by a single [`ResourceClient`](crate::ResourceClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    auth: Auth,
    default_headers: Vec<(String, String)>,
    timeout: Duration,
    rate_limit: RateLimitPolicy,
    poll: PollConfig,
    total_count_header: String,
}

impl ClientConfig {
    /// Create a configuration for the given base path.
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            default_headers: Vec::new(),
            timeout: Duration::from_secs(30),
            rate_limit: RateLimitPolicy::default(),
            poll: PollConfig::default(),
            total_count_header: DEFAULT_TOTAL_COUNT_HEADER.to_string(),
        }
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the rate-limit guard policy.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitPolicy) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set the async job polling cadence.
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Set the header that carries the collection size.
    pub fn with_total_count_header(mut self, name: impl Into<String>) -> Self {
        self.total_count_header = name.into();
        self
    }

    /// Base path relative URLs are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authentication scheme.
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Headers sent with every request.
    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Rate-limit guard policy.
    pub fn rate_limit(&self) -> &RateLimitPolicy {
        &self.rate_limit
    }

    /// Async job polling cadence.
    pub fn poll(&self) -> &PollConfig {
        &self.poll
    }

    /// Header that carries the collection size.
    pub fn total_count_header(&self) -> &str {
        &self.total_count_header
    }

    /// Resolve a request URL against the base path.
    ///
    /// Absolute URLs pass through unchanged.
    pub fn resolve_url(&self, url: &str) -> String {
        if is_absolute(url) {
            return url.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = url.trim_start_matches('/');
        if path.is_empty() {
            return base.to_string();
        }
        format!("{}/{}", base, path)
    }
}

fn is_absolute(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
