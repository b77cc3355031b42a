//! Snapshot state shared by all polling concerns.

use chrono::DateTime;
use chrono::Utc;

/// The last successfully applied response for one polling concern.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// The fetched data
    pub data: T,
    /// Request sequence number this snapshot was produced by
    pub seq: u64,
    /// When the response was applied
    pub fetched_at: DateTime<Utc>,
}

/// Eventually-consistent local view of one remote resource.
///
/// Two policies are enforced here rather than in the poll loop so they are
/// unit-testable without a network:
///
/// - *stale-but-available*: a failed tick records its error message but
///   never discards the previous snapshot, so consumers keep rendering the
///   last-known-good data alongside the error.
/// - *sequence guard*: every request carries a monotonically increasing
///   sequence number, and a response older than the last applied one is
///   discarded. Overlapping ticks therefore cannot roll the view back.
#[derive(Debug)]
pub struct PollState<T> {
    last_good: Option<Snapshot<T>>,
    last_error: Option<String>,
    last_applied_seq: u64,
    ticks: u64,
    failures: u64,
    stale_drops: u64,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            last_good: None,
            last_error: None,
            last_applied_seq: 0,
            ticks: 0,
            failures: 0,
            stale_drops: 0,
        }
    }
}

impl<T> PollState<T> {
    /// Apply a successful response. Returns `false` when the response is
    /// older than the last applied one and was dropped.
    pub fn apply_success(&mut self, seq: u64, data: T) -> bool {
        self.ticks += 1;
        if seq < self.last_applied_seq {
            self.stale_drops += 1;
            return false;
        }
        self.last_applied_seq = seq;
        self.last_good = Some(Snapshot {
            data,
            seq,
            fetched_at: Utc::now(),
        });
        self.last_error = None;
        true
    }

    /// Record a failed tick. The previous snapshot stays untouched.
    /// Returns `false` when the failure belongs to a superseded request.
    pub fn apply_failure(&mut self, seq: u64, message: impl Into<String>) -> bool {
        self.ticks += 1;
        self.failures += 1;
        if seq < self.last_applied_seq {
            self.stale_drops += 1;
            return false;
        }
        self.last_applied_seq = seq;
        self.last_error = Some(message.into());
        true
    }

    /// Last-known-good data, if any tick ever succeeded.
    pub fn data(&self) -> Option<&T> {
        self.last_good.as_ref().map(|s| &s.data)
    }

    pub fn snapshot(&self) -> Option<&Snapshot<T>> {
        self.last_good.as_ref()
    }

    /// Error message of the most recent failed tick, cleared by the next
    /// successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_applied_seq(&self) -> u64 {
        self.last_applied_seq
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn stale_drops(&self) -> u64 {
        self.stale_drops
    }
}
