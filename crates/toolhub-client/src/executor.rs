//! Request executor.
//!
//! Performs exactly one network call per [`Executor::attempt`] and classifies
//! the outcome. Throttled responses are reported as [`Attempt::Throttled`] for
//! the rate-limit guard; every other non-success status is terminal.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::request::RequestDescriptor;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A successful response with its body decoded.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code (always 2xx).
    pub status: u16,

    /// Response headers.
    pub headers: HeaderMap,

    /// Decoded JSON body; `None` when the response had no body.
    pub body: Option<Value>,
}

impl RawResponse {
    /// Header value by name, case-insensitive. Repeated headers are joined with `, `.
    pub fn header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// Headers as a sorted map with lowercase names.
    pub fn header_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for name in self.headers.keys() {
            if let Some(value) = self.header(name.as_str()) {
                map.insert(name.as_str().to_string(), value);
            }
        }
        map
    }
}

/// Outcome of a single network call.
#[derive(Debug)]
pub(crate) enum Attempt {
    /// 2xx response
    Done(RawResponse),
    /// Rate-limit status; the guard decides whether to replay
    Throttled {
        retry_after: Option<u64>,
        body: String,
    },
}

/// Issues one authenticated request at a time.
#[derive(Clone)]
pub(crate) struct Executor {
    http: Client,
    config: Arc<ClientConfig>,
    default_headers: HeaderMap,
    auth_header: Option<(HeaderName, HeaderValue)>,
}

impl Executor {
    pub(crate) fn new(config: Arc<ClientConfig>) -> ClientResult<Self> {
        Url::parse(config.base_url())
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url(), e)))?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in config.default_headers() {
            let (name, value) = parse_header(name, value)?;
            default_headers.insert(name, value);
        }

        let auth_header = match config.auth().header() {
            Some((name, value)) => {
                let (name, mut value) = parse_header(&name, &value)?;
                value.set_sensitive(true);
                Some((name, value))
            }
            None => None,
        };

        Ok(Self {
            http,
            config,
            default_headers,
            auth_header,
        })
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the final URL for a descriptor.
    pub(crate) fn url(&self, request: &RequestDescriptor) -> ClientResult<Url> {
        let resolved = self.config.resolve_url(&request.url);
        let mut url = Url::parse(&resolved)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", resolved, e)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    /// Merge default, call-specific and authentication headers.
    ///
    /// Call-specific headers replace defaults of the same name. The
    /// authentication header is applied last and is never replaced.
    pub(crate) fn headers(&self, request: &RequestDescriptor) -> ClientResult<HeaderMap> {
        let mut headers = self.default_headers.clone();

        for (name, value) in &request.headers {
            let (name, value) = parse_header(name, value)?;
            if let Some((auth_name, _)) = &self.auth_header {
                if *auth_name == name {
                    warn!(header = %name, "Ignoring call-specific header that would replace authentication");
                    continue;
                }
            }
            headers.insert(name, value);
        }

        if let Some((name, value)) = &self.auth_header {
            headers.insert(name.clone(), value.clone());
        }

        Ok(headers)
    }

    /// Perform exactly one network call.
    pub(crate) async fn attempt(&self, request: &RequestDescriptor) -> ClientResult<Attempt> {
        let url = self.url(request)?;
        let headers = self.headers(request)?;

        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            let body = body_text(response.text().await);
            return Ok(Attempt::Throttled { retry_after, body });
        }

        if !status.is_success() {
            let body = body_text(response.text().await);
            warn!(status = status.as_u16(), body = %body, "Upstream API returned an error");
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let body = decode_body(status.as_u16(), &bytes)?;

        Ok(Attempt::Done(RawResponse {
            status: status.as_u16(),
            headers,
            body,
        }))
    }
}

fn parse_header(name: &str, value: &str) -> ClientResult<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ClientError::Config(format!("Invalid header name: {}", name)))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| ClientError::Config(format!("Invalid value for header {}", name)))?;
    Ok((header_name, header_value))
}

/// Text of an error response, or a visible placeholder when it could not be read.
fn body_text(text: Result<String, reqwest::Error>) -> String {
    text.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to read error response body");
        format!("<unreadable response body: {}>", e)
    })
}

fn decode_body(status: u16, bytes: &[u8]) -> ClientResult<Option<Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| ClientError::Decode {
            status,
            message: e.to_string(),
        })
}
