//! # Toolhub Client
//!
//! The resource-client core shared by every SaaS integration in toolhub. It
//! turns a single [`RequestDescriptor`] into:
//!
//! - an authenticated request (`token`, `Bearer`, `Basic` or an API-key header)
//! - a single page or a fully walked collection, following `Link: <...>; rel="next"`
//! - a field-redacted [`ResponseEnvelope`], using a per-resource [`FieldPolicy`]
//! - for long-running server-side jobs, a bounded poll of a status URL
//!
//! Throttled responses (`429` + `Retry-After`) are replayed transparently up to
//! [`RateLimitPolicy::max_retries`] times.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use toolhub_client::{
//!     Auth, CancellationToken, ClientConfig, FieldPolicy, PolicyRegistry, RequestDescriptor,
//!     ResourceClient,
//! };
//!
//! async fn projects() -> Result<(), toolhub_client::ClientError> {
//!     let config = ClientConfig::new("https://api.example.com", Auth::Token("t0k3n".into()))
//!         .with_header("X-Version", "2");
//!     let policies = PolicyRegistry::new()
//!         .with("project", FieldPolicy::allow(["id", "name"]));
//!     let client = ResourceClient::new(config, policies)?;
//!
//!     let cancel = CancellationToken::new();
//!     let request = RequestDescriptor::get("/organizations/o1/projects").with_query("per_page", 100);
//!     let envelope = client.fetch_collection("project", &request, true, &cancel).await?;
//!     println!("{} projects", envelope.body.unwrap_or_default().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Every failure is a [`ClientError`]. HTTP failures keep the status code and
//! the raw response text. Nothing is retried except throttled responses.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub(crate) mod executor;
pub mod filters;
pub mod pagination;
pub mod poller;
pub mod rate_limit;
pub mod request;
pub mod sanitize;

// Re-export main types
pub use client::ResourceClient;
pub use config::{Auth, ClientConfig, PollConfig, RateLimitPolicy, DEFAULT_TOTAL_COUNT_HEADER};
pub use envelope::ResponseEnvelope;
pub use error::{ClientError, ClientResult};
pub use executor::RawResponse;
pub use filters::{encode_filters, FilterComparison, FilterValue, Filters};
pub use pagination::{next_cursor, parse_link_header, parse_total_count, LinkEntry};
pub use poller::{JobHandle, JobStatus, PollOutcome};
pub use request::{segment, RequestDescriptor};
pub use sanitize::{sanitize, FieldPolicy, PolicyKind, PolicyRegistry, Redaction};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
