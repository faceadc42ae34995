//! Fixed-delay retry for place-provider calls.

use std::future::Future;

use tastelist_core::RetryPolicy;
use tracing::{debug, warn};

use crate::{CancelSignal, Cancelled, PlacesError};

/// Run `op` until it succeeds, fails permanently, or `policy.max_attempts` is reached.
///
/// Only [transient](PlacesError::is_transient) failures are retried, after a
/// fixed `policy.delay`. Every attempt increments `attempts`. Cancellation is
/// checked before each attempt and races both the call and the delay.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancelSignal,
    attempts: &mut u32,
    call: &'static str,
    mut op: F,
) -> Result<Result<T, PlacesError>, Cancelled>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PlacesError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut tried = 0;
    loop {
        if cancel.is_cancelled() {
            debug!(call, tried, "cancelled before attempt");
            return Err(Cancelled);
        }
        tried += 1;
        *attempts += 1;
        debug!(call, attempt = tried, "calling place provider");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled),
            result = op() => result,
        };

        match result {
            Ok(value) => return Ok(Ok(value)),
            Err(err) if err.is_transient() && tried < max_attempts => {
                warn!(
                    call,
                    attempt = tried,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "transient place provider failure, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Cancelled),
                    _ = tokio::time::sleep(policy.delay) => {}
                }
            }
            Err(err) => return Ok(Err(err)),
        }
    }
}
