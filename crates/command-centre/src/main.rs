mod app;
mod beckn;
mod client;
mod config;
mod daemon;
mod events;
mod logging;
mod normalize;
mod selection;
mod tui;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use api_types::EventStatus;
use api_types::FlexEvent;
use chrono::Utc;
use clap::Parser;
use http_poll_comm::retry_with_backoff;

use crate::app::PollingHub;
use crate::app::Tasks;
use crate::client::BackendClient;
use crate::config::Cli;
use crate::config::Commands;
use crate::config::ExportArgs;
use crate::config::MonitorArgs;
use crate::events::EventFilter;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tui(args) => run_tui(args).await,
        Commands::Daemon(args) => run_daemon(args).await,
        Commands::ExportEvents(args) => run_export_events(args).await,
    }
}

async fn run_tui(args: MonitorArgs) -> Result<()> {
    let _guard = logging::init(args.poll_log.as_deref());

    tracing::info!("Starting FLUXEON command centre against {}", args.api_base_url);

    let client = Arc::new(
        BackendClient::new(&args.client_config())
            .map_err(|report| anyhow::anyhow!("{report:?}"))?,
    );
    let hub = PollingHub::new(&args);
    if let Some(feeder) = &args.feeder {
        hub.request_feeder(feeder.clone());
    }

    let mut tasks = Tasks::new();
    tasks.spawn_pollers(&hub, &client);

    let result = tui::run_command_centre(hub, &args).await;

    tasks.shutdown(Duration::from_secs(5)).await;
    result
}

async fn run_daemon(args: MonitorArgs) -> Result<()> {
    let _guard = logging::init(args.poll_log.as_deref());

    tracing::info!("Starting FLUXEON monitor daemon against {}", args.api_base_url);

    let client = Arc::new(
        BackendClient::new(&args.client_config())
            .map_err(|report| anyhow::anyhow!("{report:?}"))?,
    );
    let hub = PollingHub::new(&args);
    if let Some(feeder) = &args.feeder {
        hub.request_feeder(feeder.clone());
    }

    let mut tasks = Tasks::new();
    tasks.spawn_pollers(&hub, &client);
    tasks.spawn_reporter_task(&hub, Duration::from_millis(args.der_poll_ms));

    tasks.wait_for_completion().await
}

async fn run_export_events(args: ExportArgs) -> Result<()> {
    let _guard = logging::init(None);

    let config = args.client_config();
    let client =
        BackendClient::new(&config).map_err(|report| anyhow::anyhow!("{report:?}"))?;

    let filter = EventFilter {
        status: match &args.status {
            Some(value) => Some(
                EventStatus::parse(&value.to_uppercase())
                    .with_context(|| format!("unrecognized status filter: {value}"))?,
            ),
            None => None,
        },
        feeder: args.feeder.clone(),
        obp: args.obp.clone(),
    };

    // Not on a polling cadence, so this one-shot fetch gets the backoff.
    let dtos = retry_with_backoff(
        config.max_retries,
        config.retry_delay,
        config.max_retry_delay,
        || client.active_events(),
    )
    .await
    .map_err(|report| anyhow::anyhow!("{report:?}"))?;

    let fetched_at = Utc::now();
    let all: Vec<FlexEvent> = dtos
        .into_iter()
        .map(|dto| FlexEvent::from_dto(dto, fetched_at))
        .collect();
    let filtered = filter.apply(&all);

    let csv = events::events_to_csv(&filtered);
    std::fs::write(&args.out, csv)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    tracing::info!(
        "Exported {} of {} active events to {}",
        filtered.len(),
        all.len(),
        args.out.display()
    );
    Ok(())
}
