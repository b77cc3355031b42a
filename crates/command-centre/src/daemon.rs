//! Headless reporting loop for the daemon subcommand.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use api_types::RiskLevel;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::app::PollingHub;
use crate::normalize;

/// Periodically log fleet KPIs and per-feeder risk transitions.
///
/// The reporter only reads poller snapshots; it issues no requests of its
/// own, so its cadence is independent of the poll cadences.
pub async fn run_reporter(hub: Arc<PollingHub>, interval: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_risk: HashMap<String, Option<RiskLevel>> = HashMap::new();

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(feeders) = hub.feeders.latest() else {
            if let Some(error) = hub.feeders.last_error() {
                tracing::warn!("no feeder data yet: {error}");
            }
            continue;
        };

        for feeder in &feeders {
            let risk = feeder.risk();
            match last_risk.insert(feeder.id.clone(), risk) {
                Some(previous) if previous != risk => {
                    tracing::info!(
                        feeder = %feeder.id,
                        from = ?previous,
                        to = ?risk,
                        load_kw = feeder.load_kw,
                        "risk level changed"
                    );
                }
                None if matches!(risk, Some(RiskLevel::Warning | RiskLevel::Critical)) => {
                    tracing::info!(
                        feeder = %feeder.id,
                        risk = ?risk,
                        load_kw = feeder.load_kw,
                        "feeder entered monitoring in elevated state"
                    );
                }
                _ => {}
            }
        }

        let kpis = normalize::fleet_kpis(&feeders);
        let selected = hub
            .resolve_selection()
            .map(|f| f.id)
            .unwrap_or_else(|| "-".into());
        tracing::info!(
            total = kpis.total,
            warning = kpis.warning,
            critical = kpis.critical,
            unknown = kpis.unknown,
            health = %hub.backend_health(),
            selected = %selected,
            "fleet status"
        );

        for error in hub.poll_errors() {
            tracing::warn!("poll tick failing: {error}");
        }
    }
}
