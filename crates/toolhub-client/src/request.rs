//! Request descriptors.

use crate::error::{ClientError, ClientResult};
use reqwest::Method;
use serde_json::Value;

/// One HTTP call, as built by an endpoint-specific caller.
///
/// `url` may be absolute or relative to the client's base path. Descriptors
/// are never mutated by the core; replays and page walks clone them.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,

    /// Absolute URL or path relative to the base path
    pub url: String,

    /// Query parameters, in order; repeated keys are allowed
    pub query: Vec<(String, String)>,

    /// Call-specific headers
    pub headers: Vec<(String, String)>,

    /// JSON body; `None` sends no body
    pub body: Option<Value>,
}

impl RequestDescriptor {
    /// Create a descriptor for the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::HEAD, url)
    }

    pub fn options(url: impl Into<String>) -> Self {
        Self::new(Method::OPTIONS, url)
    }

    /// Append one query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append one query parameter when a value is present.
    pub fn with_query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    /// Append several query parameters.
    pub fn with_queries<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.query.extend(pairs);
        self
    }

    /// Add a call-specific header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body. Empty objects, empty arrays and null send no body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = if is_empty_body(&body) { None } else { Some(body) };
        self
    }

    /// Descriptor for the page a cursor points at.
    ///
    /// The cursor already carries the query string, so only method, headers
    /// and body are inherited.
    pub fn follow(&self, cursor: &str) -> Self {
        Self {
            method: self.method.clone(),
            url: cursor.to_string(),
            query: Vec::new(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// Percent-encode a caller-supplied identifier as one path segment.
///
/// `/`, `?`, `#` and `%` are escaped, so the value can never address another
/// endpoint. Empty, `.` and `..` values are rejected because URL parsing
/// would collapse them.
pub fn segment(value: &str) -> ClientResult<String> {
    match value {
        "" | "." | ".." => Err(ClientError::InvalidUrl(format!(
            "invalid path segment: {:?}",
            value
        ))),
        _ => Ok(urlencoding::encode(value).into_owned()),
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
