//! Async job poller.
//!
//! A job is submitted with one request whose response names a status URL and
//! a result URL. The status URL is checked with `HEAD` at a fixed interval:
//! `202 Accepted` means the job is still running, any other success means it
//! is done, and any other status fails the job. Once done, the result URL is
//! fetched exactly once.
//!
//! ```text
//! SUBMITTED -> PENDING -> (PENDING ...) -> COMPLETE
//!                      \-> FAILED
//!                      \-> TIMED_OUT
//! ```
//!
//! A timed-out job is not cancelled remotely; the API offers no way to.

use crate::config::PollConfig;
use crate::envelope::ResponseEnvelope;
use crate::error::{ClientError, ClientResult};
use crate::executor::{Executor, RawResponse};
use crate::rate_limit::{send_guarded, sleep_or_cancel};
use crate::request::RequestDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// URLs returned by a job submission. Consumed by one poll sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    /// Where to check whether the job finished
    #[serde(alias = "statusUrl")]
    pub status_url: String,

    /// Where to fetch the finished job's payload
    #[serde(alias = "resultUrl")]
    pub result_url: String,
}

impl JobHandle {
    /// Extract a handle from a submission response body.
    pub fn from_body(body: Option<Value>) -> ClientResult<Self> {
        let body = body.ok_or_else(|| {
            ClientError::Shape("expected job handle, got empty body".to_string())
        })?;
        serde_json::from_value(body)
            .map_err(|e| ClientError::Shape(format!("expected job handle: {}", e)))
    }
}

/// Terminal value of a successful poll sequence.
#[derive(Debug, Clone, Serialize)]
pub struct PollOutcome {
    /// Always `true`; failures are errors
    pub completed: bool,

    /// The result fetch, sanitized for the job's resource type
    pub result: ResponseEnvelope<Value>,
}

/// State reported by one status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Complete,
}

impl JobStatus {
    /// Classify a successful status-check response.
    pub fn from_status(status: u16) -> Self {
        if status == 202 {
            JobStatus::Pending
        } else {
            JobStatus::Complete
        }
    }
}

/// Check the status URL until the job completes or the budget elapses.
async fn wait_until_complete(
    executor: &Executor,
    handle: &JobHandle,
    poll: &PollConfig,
    cancel: &CancellationToken,
) -> ClientResult<()> {
    let check = RequestDescriptor::head(handle.status_url.clone());
    let mut checks = 0u32;

    loop {
        let response = send_guarded(executor, &check, cancel).await?;
        checks += 1;

        match JobStatus::from_status(response.status) {
            JobStatus::Complete => {
                debug!(checks = checks, "Job complete");
                return Ok(());
            }
            JobStatus::Pending => {
                debug!(checks = checks, "Job still running");
                sleep_or_cancel(poll.interval, cancel).await?;
            }
        }
    }
}

/// Poll a submitted job and fetch its result.
///
/// Only the status checks count against the budget; the result fetch starts
/// after the job reported completion.
pub(crate) async fn await_result(
    executor: &Executor,
    handle: &JobHandle,
    cancel: &CancellationToken,
) -> ClientResult<RawResponse> {
    let poll = executor.config().poll().clone();

    match timeout(poll.timeout, wait_until_complete(executor, handle, &poll, cancel)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(
                budget_secs = poll.timeout.as_secs_f64(),
                status_url = %handle.status_url,
                "Job did not complete within the poll budget"
            );
            return Err(ClientError::Timeout {
                budget: poll.timeout,
            });
        }
    }

    info!(result_url = %handle.result_url, "Fetching job result");
    send_guarded(executor, &RequestDescriptor::get(handle.result_url.clone()), cancel).await
}
