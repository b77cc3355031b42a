//! Background task supervision for the polling concerns.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use api_types::FlexEvent;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app::BackendHealth;
use crate::app::PollingHub;
use crate::client::BackendClient;
use crate::daemon;
use crate::normalize;

/// Task manager, responsible for starting and managing all pollers
pub struct Tasks {
    pub tasks: Vec<JoinHandle<()>>,
    cancellation_token: CancellationToken,
}

impl Default for Tasks {
    fn default() -> Self {
        Self::new()
    }
}

impl Tasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start one background task per polling concern.
    pub fn spawn_pollers(&mut self, hub: &Arc<PollingHub>, client: &Arc<BackendClient>) {
        self.tasks.push(self.spawn_feeders_task(hub, client));
        self.tasks.push(self.spawn_detail_task(hub, client));
        self.tasks.push(self.spawn_events_task(hub, client));
        self.tasks.push(self.spawn_ders_task(hub, client));
        self.tasks.push(self.spawn_audit_task(hub, client));
        self.tasks.push(self.spawn_health_task(hub, client));
    }

    /// Start the headless reporter used by the daemon subcommand.
    pub fn spawn_reporter_task(&mut self, hub: &Arc<PollingHub>, interval: Duration) {
        let hub = hub.clone();
        let token = self.cancellation_token.clone();
        self.tasks.push(tokio::spawn(async move {
            tracing::info!("Starting fleet reporter task");
            daemon::run_reporter(hub, interval, token).await;
            tracing::info!("Fleet reporter task completed");
        }));
    }

    /// wait for tasks to complete or receive shutdown signal
    pub async fn wait_for_completion(&mut self) -> Result<()> {
        let signal_handler = {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                let mut sigint = signal(SignalKind::interrupt())?;

                tokio::spawn(async move {
                    tokio::select! {
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, initiating graceful shutdown");
                        }
                        _ = sigint.recv() => {
                            tracing::info!("Received SIGINT, initiating graceful shutdown");
                        }
                    }
                })
            }
            #[cfg(not(unix))]
            {
                tokio::spawn(async {
                    tokio::signal::ctrl_c()
                        .await
                        .expect("Failed to install Ctrl+C handler");
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                })
            }
        };

        tokio::select! {
            _ = signal_handler => {
                tracing::info!("Shutdown signal received, cancelling all tasks");
                self.cancellation_token.cancel();
                self.wait_for_tasks_with_timeout(Duration::from_secs(30)).await;
            }
            result = futures::future::select_all(&mut self.tasks) => {
                let (result, _index, _remaining) = result;
                if let Err(e) = result {
                    tracing::error!("Task completed with error: {e}");
                    return Err(e.into());
                }
                tracing::warn!("Task completed unexpectedly");
            }
        }

        Ok(())
    }

    /// Cancel everything and join with a bounded timeout.
    pub async fn shutdown(&mut self, timeout: Duration) {
        self.cancellation_token.cancel();
        self.wait_for_tasks_with_timeout(timeout).await;
    }

    async fn wait_for_tasks_with_timeout(&mut self, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            for task in &mut self.tasks {
                if let Err(e) = task.await {
                    tracing::error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await
        .unwrap_or_else(|_| {
            tracing::warn!("Task shutdown timed out after {:?}", timeout);
        });
    }

    fn spawn_feeders_task(
        &self,
        hub: &Arc<PollingHub>,
        client: &Arc<BackendClient>,
    ) -> JoinHandle<()> {
        let poller = hub.feeders.clone();
        let client = client.clone();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            tracing::info!("Starting feeder list poller");
            poller
                .run(
                    move || {
                        let client = client.clone();
                        async move { client.list_feeders().await }
                    },
                    token,
                )
                .await;
            tracing::info!("Feeder list poller stopped");
        })
    }

    fn spawn_detail_task(
        &self,
        hub: &Arc<PollingHub>,
        client: &Arc<BackendClient>,
    ) -> JoinHandle<()> {
        let poller = hub.detail.clone();
        let hub = hub.clone();
        let client = client.clone();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            tracing::info!("Starting feeder state poller");
            poller
                .run(
                    move || {
                        let hub = hub.clone();
                        let client = client.clone();
                        async move {
                            // Re-resolving here keeps the focused feeder in
                            // step with the freshest list on every tick.
                            let Some(selected) = hub.resolve_selection() else {
                                return Ok(None);
                            };
                            let dto = client.feeder_state(&selected.id).await?;
                            Ok(Some(normalize::resolve_feeder_detail(
                                &dto,
                                &selected.id,
                                Some(selected.load_kw),
                                selected.temperature,
                            )))
                        }
                    },
                    token,
                )
                .await;
            tracing::info!("Feeder state poller stopped");
        })
    }

    fn spawn_events_task(
        &self,
        hub: &Arc<PollingHub>,
        client: &Arc<BackendClient>,
    ) -> JoinHandle<()> {
        let poller = hub.events.clone();
        let client = client.clone();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            tracing::info!("Starting active events poller");
            poller
                .run(
                    move || {
                        let client = client.clone();
                        async move {
                            let dtos = client.active_events().await?;
                            let fetched_at = Utc::now();
                            Ok(dtos
                                .into_iter()
                                .map(|dto| FlexEvent::from_dto(dto, fetched_at))
                                .collect())
                        }
                    },
                    token,
                )
                .await;
            tracing::info!("Active events poller stopped");
        })
    }

    fn spawn_ders_task(
        &self,
        hub: &Arc<PollingHub>,
        client: &Arc<BackendClient>,
    ) -> JoinHandle<()> {
        let poller = hub.ders.clone();
        let client = client.clone();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            tracing::info!("Starting DER catalog poller");
            poller
                .run(
                    move || {
                        let client = client.clone();
                        async move { client.ders().await }
                    },
                    token,
                )
                .await;
            tracing::info!("DER catalog poller stopped");
        })
    }

    fn spawn_audit_task(
        &self,
        hub: &Arc<PollingHub>,
        client: &Arc<BackendClient>,
    ) -> JoinHandle<()> {
        let poller = hub.audit.clone();
        let hub = hub.clone();
        let client = client.clone();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            tracing::info!("Starting audit trail poller");
            poller
                .run(
                    move || {
                        let hub = hub.clone();
                        let client = client.clone();
                        async move {
                            // Only fetch while a dispatch is being inspected.
                            let Some(obp_id) = hub.inspected_obp() else {
                                return Ok(None);
                            };
                            client.audit_trail(&obp_id).await.map(Some)
                        }
                    },
                    token,
                )
                .await;
            tracing::info!("Audit trail poller stopped");
        })
    }

    fn spawn_health_task(
        &self,
        hub: &Arc<PollingHub>,
        client: &Arc<BackendClient>,
    ) -> JoinHandle<()> {
        let poller = hub.health.clone();
        let client = client.clone();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            tracing::info!("Starting backend health probe");
            poller
                .run(
                    move || {
                        let client = client.clone();
                        async move {
                            // Unreachable is a result, not a poll failure.
                            match client.health().await {
                                Ok(_) => Ok(BackendHealth::Online),
                                Err(report) => {
                                    tracing::debug!("health probe failed: {report}");
                                    Ok(BackendHealth::Offline)
                                }
                            }
                        }
                    },
                    token,
                )
                .await;
            tracing::info!("Backend health probe stopped");
        })
    }
}
