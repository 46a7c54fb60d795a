//! Resource client.
//!
//! Ties the executor, rate-limit guard, pagination walker, sanitizer and job
//! poller to one immutable [`ClientConfig`] and one [`PolicyRegistry`].
//! Endpoint-specific code only builds [`RequestDescriptor`]s and names the
//! resource type whose policy applies.

use crate::config::ClientConfig;
use crate::envelope::ResponseEnvelope;
use crate::error::{ClientError, ClientResult};
use crate::executor::{Executor, RawResponse};
use crate::pagination::{json_kind, parse_total_count, walk};
use crate::poller::{await_result, JobHandle, PollOutcome};
use crate::rate_limit::send_guarded;
use crate::request::RequestDescriptor;
use crate::sanitize::PolicyRegistry;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Shared request/pagination/redaction/polling core for one upstream API.
///
/// Cloning is cheap; clones share the configuration and HTTP client.
#[derive(Clone)]
pub struct ResourceClient {
    executor: Executor,
    policies: Arc<PolicyRegistry>,
}

impl ResourceClient {
    /// Create a client. Fails when the base URL or a header is invalid.
    pub fn new(config: ClientConfig, policies: PolicyRegistry) -> ClientResult<Self> {
        debug!(
            base_url = %config.base_url(),
            auth = config.auth().scheme(),
            resources = policies.resources().count(),
            "Creating resource client"
        );
        Ok(Self {
            executor: Executor::new(Arc::new(config))?,
            policies: Arc::new(policies),
        })
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    /// Field policies this client applies.
    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Descriptor for the page a caller-supplied cursor points at.
    ///
    /// An absolute cursor must share the base URL's scheme, host and port;
    /// any other cursor fails with `InvalidUrl` before a request is sent.
    pub fn resume(&self, cursor: &str) -> ClientResult<RequestDescriptor> {
        let base = Url::parse(self.config().base_url())
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.config().base_url(), e)))?;
        let target = Url::parse(&self.config().resolve_url(cursor))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", cursor, e)))?;

        if target.origin() != base.origin() {
            warn!(cursor = %cursor, "Rejecting cursor outside the API origin");
            return Err(ClientError::InvalidUrl(format!(
                "cursor {} is outside {}",
                cursor,
                base.origin().ascii_serialization()
            )));
        }
        Ok(RequestDescriptor::get(cursor))
    }

    /// Perform one request through the rate-limit guard, without sanitizing.
    pub async fn execute(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> ClientResult<RawResponse> {
        send_guarded(&self.executor, request, cancel).await
    }

    /// Fetch a single JSON object.
    #[instrument(skip(self, request, cancel), fields(url = %request.url))]
    pub async fn fetch_object(
        &self,
        resource: &str,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        self.policies.get(resource)?;

        let mut response = self.execute(request, cancel).await?;
        let body = match response.body.take() {
            Some(Value::Object(map)) => Value::Object(map),
            Some(other) => {
                return Err(ClientError::Shape(format!(
                    "expected object, got {}",
                    json_kind(&other)
                )))
            }
            None => return Err(ClientError::Shape("expected object, got empty body".to_string())),
        };

        self.envelope(resource, response, Some(body), None)
    }

    /// Fetch a collection: one page, or every page when `fetch_all` is set.
    ///
    /// With `fetch_all`, the envelope carries every item in server order, the
    /// last page's headers and no cursor. Otherwise it carries the first page
    /// and the cursor of the second, if any.
    #[instrument(skip(self, request, cancel), fields(url = %request.url))]
    pub async fn fetch_collection(
        &self,
        resource: &str,
        request: &RequestDescriptor,
        fetch_all: bool,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Vec<Value>>> {
        self.policies.get(resource)?;

        let result = walk(&self.executor, request, fetch_all, cancel).await?;
        debug!(
            pages = result.pages,
            items = result.items.len(),
            "Collection fetched"
        );

        let envelope = self.envelope(
            resource,
            result.last,
            Some(Value::Array(result.items)),
            result.next_cursor,
        )?;
        Ok(envelope.map(|body| match body {
            Value::Array(items) => items,
            other => vec![other],
        }))
    }

    /// Send a request whose response may be any JSON value or empty.
    #[instrument(skip(self, request, cancel), fields(method = %request.method, url = %request.url))]
    pub async fn send(
        &self,
        resource: &str,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        self.policies.get(resource)?;

        let mut response = self.execute(request, cancel).await?;
        let body = response.body.take();
        self.envelope(resource, response, body, None)
    }

    /// Submit a long-running job and return its handle.
    #[instrument(skip(self, request, cancel), fields(url = %request.url))]
    pub async fn submit_job(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> ClientResult<JobHandle> {
        let response = self.execute(request, cancel).await?;
        JobHandle::from_body(response.body)
    }

    /// Poll a submitted job until it completes and return its sanitized result.
    #[instrument(skip(self, handle, cancel), fields(status_url = %handle.status_url))]
    pub async fn await_job(
        &self,
        resource: &str,
        handle: JobHandle,
        cancel: &CancellationToken,
    ) -> ClientResult<PollOutcome> {
        self.policies.get(resource)?;

        let mut response = await_result(&self.executor, &handle, cancel).await?;
        let body = response.body.take();
        let result = self.envelope(resource, response, body, None)?;
        Ok(PollOutcome {
            completed: true,
            result,
        })
    }

    /// Submit a job and wait for its result.
    pub async fn run_job(
        &self,
        resource: &str,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> ClientResult<PollOutcome> {
        self.policies.get(resource)?;

        let handle = self.submit_job(request, cancel).await?;
        self.await_job(resource, handle, cancel).await
    }

    fn envelope(
        &self,
        resource: &str,
        response: RawResponse,
        body: Option<Value>,
        next_cursor: Option<String>,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        let (body, redaction) = match body {
            Some(body) => {
                let (body, redaction) = self.policies.apply(resource, body)?;
                (Some(body), redaction)
            }
            None => {
                let (_, redaction) = self.policies.apply(resource, Value::Null)?;
                (None, redaction)
            }
        };
        let total_count = parse_total_count(
            response
                .header(self.config().total_count_header())
                .as_deref(),
        );

        Ok(ResponseEnvelope {
            status: response.status,
            headers: response.header_map(),
            body,
            next_cursor,
            total_count,
            redaction,
        })
    }
}
