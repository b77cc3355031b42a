//! Fixed-cadence poll loop for one concern.

use std::future::Future;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::CommResult;
use crate::types::PollState;
use crate::types::Snapshot;

/// Owns the snapshot state and the timer for one polling concern.
///
/// The loop runs on a fixed `tokio::time::interval`; a failed tick records
/// its error and the next tick proceeds on schedule (no backoff, failures
/// are expected to self-correct). Cancelling the token stops the timer and
/// abandons any in-flight request without applying its result.
pub struct Poller<T> {
    name: String,
    interval: Duration,
    state: RwLock<PollState<T>>,
    next_seq: AtomicU64,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            interval,
            state: RwLock::new(PollState::default()),
            next_seq: AtomicU64::new(0),
        })
    }

    /// Name used in log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Issue the sequence number for the next request.
    pub fn issue_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a successful response from a request with the given sequence.
    pub fn apply_success(&self, seq: u64, data: T) -> bool {
        self.state.write().expect("poisoned").apply_success(seq, data)
    }

    /// Record a failed request with the given sequence.
    pub fn apply_failure(&self, seq: u64, message: impl Into<String>) -> bool {
        self.state
            .write()
            .expect("poisoned")
            .apply_failure(seq, message)
    }

    /// Clone of the last-known-good data, if any.
    pub fn latest(&self) -> Option<T> {
        self.state.read().expect("poisoned").data().cloned()
    }

    /// Clone of the full last-known-good snapshot, if any.
    pub fn snapshot(&self) -> Option<Snapshot<T>> {
        self.state.read().expect("poisoned").snapshot().cloned()
    }

    /// Error message of the most recent failed tick, if it has not been
    /// superseded by a success.
    pub fn last_error(&self) -> Option<String> {
        self.state
            .read()
            .expect("poisoned")
            .last_error()
            .map(str::to_owned)
    }

    pub fn failures(&self) -> u64 {
        self.state.read().expect("poisoned").failures()
    }

    pub fn stale_drops(&self) -> u64 {
        self.state.read().expect("poisoned").stale_drops()
    }

    /// Run the poll loop until the token is cancelled.
    ///
    /// The first fetch fires immediately; afterwards ticks are spaced by
    /// the configured interval regardless of the outcome of any
    /// individual tick.
    pub async fn run<F, Fut>(&self, fetch: F, token: CancellationToken)
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = CommResult<T>> + Send,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(poller = %self.name, "poll loop cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let seq = self.issue_seq();
            tokio::select! {
                // A response racing teardown is abandoned unapplied.
                _ = token.cancelled() => {
                    tracing::debug!(poller = %self.name, seq, "cancelled with request in flight");
                    break;
                }
                result = fetch() => match result {
                    Ok(data) => {
                        if !self.apply_success(seq, data) {
                            tracing::trace!(poller = %self.name, seq, "discarded out-of-order response");
                        }
                    }
                    Err(report) => {
                        tracing::warn!(poller = %self.name, seq, "poll tick failed: {report}");
                        self.apply_failure(seq, report.to_string());
                    }
                }
            }
        }
    }
}
