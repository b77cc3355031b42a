//! Retry helper for one-shot operations.
//!
//! The pollers deliberately never retry: a failed tick self-corrects on the
//! next scheduled one. This helper exists for operations that are *not* on
//! a polling cadence, such as a one-shot export fetch.

use std::future::Future;
use std::time::Duration;

use error_stack::Report;
use tracing::warn;

use crate::error::CommError;
use crate::error::CommResult;

/// Run `op` up to `max_attempts` times with exponential backoff.
///
/// The delay starts at `base_delay`, doubles after every failed attempt and
/// is capped at `max_delay`. The error of the final attempt is returned
/// when all attempts fail.
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    mut op: F,
) -> CommResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CommResult<T>>,
{
    let mut delay = base_delay;
    let mut last_err = None;

    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(report) => {
                warn!(attempt, max_attempts, "attempt failed: {report}");
                last_err = Some(report);
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, max_delay);
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| {
        Report::new(CommError::Configuration {
            message: "retry requires at least one attempt".into(),
        })
    }))
}
