//! Rate-limit guard.
//!
//! Wraps a single executor call. When the server answers with
//! `429 Too Many Requests`, the guard waits for the number of whole seconds in
//! `Retry-After` and replays the identical descriptor, so callers only ever
//! see the eventual response. Replays are bounded by
//! [`RateLimitPolicy::max_retries`].
//!
//! Every method is replayed the same way. A throttled write is a rejection
//! before processing on the integrated APIs, which is what makes the replay
//! safe; callers own that precondition.

use crate::config::RateLimitPolicy;
use crate::error::{ClientError, ClientResult};
use crate::executor::{Attempt, Executor, RawResponse};
use crate::request::RequestDescriptor;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Delay before replaying a throttled request.
///
/// `retry_after` is the server-provided whole number of seconds; it is capped
/// at `max_delay`. Without it the policy's fallback delay applies.
pub fn retry_delay(policy: &RateLimitPolicy, retry_after: Option<u64>) -> Duration {
    match retry_after {
        Some(secs) => Duration::from_secs(secs).min(policy.max_delay),
        None => policy.fallback_delay,
    }
}

/// Sleep unless the caller cancels first.
pub(crate) async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> ClientResult<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        _ = sleep(delay) => Ok(()),
    }
}

/// Execute a request, absorbing throttled attempts.
pub(crate) async fn send_guarded(
    executor: &Executor,
    request: &RequestDescriptor,
    cancel: &CancellationToken,
) -> ClientResult<RawResponse> {
    let policy = executor.config().rate_limit();
    let mut retries = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        match executor.attempt(request).await? {
            Attempt::Done(response) => {
                if retries > 0 {
                    info!(retries = retries, "Request succeeded after throttling");
                }
                return Ok(response);
            }
            Attempt::Throttled { body, .. } if retries >= policy.max_retries => {
                error!(
                    retries = retries,
                    url = %request.url,
                    "Rate limit retries exhausted"
                );
                return Err(ClientError::RateLimitExceeded { retries, body });
            }
            Attempt::Throttled { retry_after, .. } => {
                let delay = retry_delay(policy, retry_after);
                warn!(
                    attempt = retries + 1,
                    max_retries = policy.max_retries,
                    delay_secs = delay.as_secs(),
                    url = %request.url,
                    "Throttled by upstream API, waiting before replay"
                );

                sleep_or_cancel(delay, cancel).await?;
                retries += 1;
            }
        }
    }
}
