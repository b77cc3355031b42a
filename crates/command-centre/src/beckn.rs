//! Simulated Beckn workflow stepper.

use std::collections::HashMap;

use api_types::BecknStep;
use chrono::DateTime;
use chrono::Utc;

/// Manually advanced workflow indicator.
///
/// Manual advances are not validated against backend-reported order; when
/// an event carries a backend step, that step wins for display.
#[derive(Debug, Clone)]
pub struct WorkflowTracker {
    current: BecknStep,
    timestamps: HashMap<BecknStep, DateTime<Utc>>,
}

impl Default for WorkflowTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowTracker {
    pub fn new() -> Self {
        Self {
            current: BecknStep::Discover,
            timestamps: HashMap::new(),
        }
    }

    pub fn current(&self) -> BecknStep {
        self.current
    }

    /// When the given step was reached by a manual advance, if ever.
    pub fn timestamp(&self, step: BecknStep) -> Option<DateTime<Utc>> {
        self.timestamps.get(&step).copied()
    }

    /// Advance one step, stamping the step reached. No-op at COMPLETE;
    /// returns whether a step was taken.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        match self.current.next() {
            Some(next) => {
                self.current = next;
                self.timestamps.insert(next, now);
                true
            }
            None => false,
        }
    }

    /// Back to DISCOVER with all timestamps cleared.
    pub fn reset(&mut self) {
        self.current = BecknStep::Discover;
        self.timestamps.clear();
    }

    /// Step to display: the backend-reported one when present, else the
    /// simulated one.
    pub fn effective_step(&self, backend_reported: Option<BecknStep>) -> BecknStep {
        backend_reported.unwrap_or(self.current)
    }
}
