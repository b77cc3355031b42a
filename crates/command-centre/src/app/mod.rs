//! Per-concern polling controllers and shared dashboard state.

pub mod tasks;

use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use api_types::AuditLog;
use api_types::Der;
use api_types::FeederSummary;
use api_types::FlexEvent;
use http_poll_comm::Poller;

use crate::config::MonitorArgs;
use crate::normalize::FeederDetail;
use crate::selection;

pub use tasks::Tasks;

/// Reachability of the backend as seen by the health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendHealth {
    Checking,
    Online,
    Offline,
}

impl std::fmt::Display for BackendHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Checking => "checking",
            Self::Online => "online",
            Self::Offline => "offline",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct SelectionState {
    /// Pending deep-link request, consumed once satisfied
    requested: Option<String>,
    /// Id of the last resolved selection
    current: Option<String>,
}

/// One poller per concern, plus the selection and inspection state the
/// concern-specific fetches read.
///
/// Every poller keeps its own last-known-good snapshot; a failed tick on
/// one concern never touches the others.
pub struct PollingHub {
    pub feeders: Arc<Poller<Vec<FeederSummary>>>,
    pub detail: Arc<Poller<Option<FeederDetail>>>,
    pub events: Arc<Poller<Vec<FlexEvent>>>,
    pub ders: Arc<Poller<Vec<Der>>>,
    pub audit: Arc<Poller<Option<AuditLog>>>,
    pub health: Arc<Poller<BackendHealth>>,
    selection: RwLock<SelectionState>,
    inspected_obp: RwLock<Option<String>>,
}

impl PollingHub {
    pub fn new(args: &MonitorArgs) -> Arc<Self> {
        let feeder_interval = Duration::from_millis(args.feeder_poll_ms);
        let der_interval = Duration::from_millis(args.der_poll_ms);
        let health_interval = Duration::from_millis(args.health_poll_ms);

        Arc::new(Self {
            feeders: Poller::new("feeders", feeder_interval),
            detail: Poller::new("feeder-state", feeder_interval),
            events: Poller::new("events", feeder_interval),
            ders: Poller::new("ders", der_interval),
            audit: Poller::new("audit", der_interval),
            health: Poller::new("health", health_interval),
            selection: RwLock::new(SelectionState::default()),
            inspected_obp: RwLock::new(None),
        })
    }

    /// Ask for a feeder to be focused once its id shows up in the list.
    pub fn request_feeder(&self, id: impl Into<String>) {
        self.selection.write().expect("poisoned").requested = Some(id.into());
    }

    /// The user picked a feeder directly; any pending deep link is dropped.
    pub fn select_feeder(&self, id: impl Into<String>) {
        let mut sel = self.selection.write().expect("poisoned");
        sel.requested = None;
        sel.current = Some(id.into());
    }

    /// Resolve the selection against the freshest feeder list.
    ///
    /// A pending deep-link request is consumed the first time its id shows
    /// up, so manual selection takes over afterwards. An empty list
    /// resolves to nothing but remembers the last id, so the focus comes
    /// back when the feeders do.
    pub fn resolve_selection(&self) -> Option<FeederSummary> {
        let list = self.feeders.latest().unwrap_or_default();
        let mut sel = self.selection.write().expect("poisoned");
        let resolved =
            selection::resolve_selection(&list, sel.requested.as_deref(), sel.current.as_deref());
        if let Some(feeder) = &resolved {
            if sel.requested.as_deref() == Some(feeder.id.as_str()) {
                sel.requested = None;
            }
            sel.current = Some(feeder.id.clone());
        }
        resolved
    }

    /// OBP id whose audit trail should be kept fresh, or `None` to stop
    /// the audit poller from fetching.
    pub fn inspect_obp(&self, obp_id: Option<String>) {
        *self.inspected_obp.write().expect("poisoned") = obp_id;
    }

    pub fn inspected_obp(&self) -> Option<String> {
        self.inspected_obp.read().expect("poisoned").clone()
    }

    pub fn backend_health(&self) -> BackendHealth {
        self.health.latest().unwrap_or(BackendHealth::Checking)
    }

    /// Per-concern error lines, shown alongside the stale data.
    pub fn poll_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, error) in [
            ("feeders", self.feeders.last_error()),
            ("state", self.detail.last_error()),
            ("events", self.events.last_error()),
            ("ders", self.ders.last_error()),
            ("audit", self.audit.last_error()),
        ] {
            if let Some(error) = error {
                errors.push(format!("{name}: {error}"));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use similar_asserts::assert_eq;

    use super::*;

    fn hub() -> Arc<PollingHub> {
        PollingHub::new(&MonitorArgs::parse_from(["fluxeon"]))
    }

    fn feeder(id: &str, load_kw: f64) -> FeederSummary {
        FeederSummary {
            id: id.into(),
            name: format!("Feeder {id}"),
            state: 0,
            load_kw,
            temperature: None,
        }
    }

    #[test]
    fn deep_link_is_consumed_once_satisfied() {
        let hub = hub();
        hub.request_feeder("F2");

        hub.feeders
            .apply_success(hub.feeders.issue_seq(), vec![feeder("F1", 1.0)]);
        let first = hub.resolve_selection().expect("list is non-empty");
        assert_eq!(first.id, "F1", "an unsatisfied request falls back to the first entry");

        hub.feeders.apply_success(
            hub.feeders.issue_seq(),
            vec![feeder("F1", 1.0), feeder("F2", 2.0)],
        );
        let second = hub.resolve_selection().expect("list is non-empty");
        assert_eq!(second.id, "F2", "the deep link wins once its id appears");

        hub.select_feeder("F1");
        let third = hub.resolve_selection().expect("list is non-empty");
        assert_eq!(third.id, "F1", "manual selection sticks after the link was consumed");
    }

    #[test]
    fn selection_survives_an_empty_refresh() {
        let hub = hub();
        hub.feeders.apply_success(
            hub.feeders.issue_seq(),
            vec![feeder("F1", 1.0), feeder("F2", 2.0)],
        );
        hub.select_feeder("F2");
        assert_eq!(hub.resolve_selection().expect("resolved").id, "F2");

        hub.feeders.apply_success(hub.feeders.issue_seq(), vec![]);
        assert_eq!(hub.resolve_selection(), None, "an empty list resolves to nothing");

        hub.feeders.apply_success(
            hub.feeders.issue_seq(),
            vec![feeder("F1", 1.0), feeder("F2", 2.0)],
        );
        assert_eq!(
            hub.resolve_selection().expect("resolved").id,
            "F2",
            "the focus comes back with the feeders"
        );
    }

    #[test]
    fn poll_errors_collect_per_concern_lines() {
        let hub = hub();
        assert!(hub.poll_errors().is_empty());

        hub.feeders
            .apply_failure(hub.feeders.issue_seq(), "Network error: connection refused");
        hub.events
            .apply_failure(hub.events.issue_seq(), "HTTP error: 503 - Service Unavailable");

        let errors = hub.poll_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("feeders:"));
        assert!(errors[1].starts_with("events:"));
    }

    #[test]
    fn backend_health_defaults_to_checking() {
        let hub = hub();
        assert_eq!(hub.backend_health(), BackendHealth::Checking);

        hub.health
            .apply_success(hub.health.issue_seq(), BackendHealth::Online);
        assert_eq!(hub.backend_health(), BackendHealth::Online);
    }
}
