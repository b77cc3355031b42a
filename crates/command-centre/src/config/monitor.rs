use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use http_poll_comm::ClientConfig;

#[derive(Parser, Clone, Debug)]
pub struct MonitorArgs {
    #[arg(
        long,
        env = "FLUXEON_API_BASE",
        default_value = "http://localhost:8000",
        help = "Base URL of the FLUXEON backend API"
    )]
    pub api_base_url: String,

    #[arg(
        long,
        default_value = "2500",
        help = "Poll interval for feeder list, selected feeder state and active events, in milliseconds"
    )]
    pub feeder_poll_ms: u64,

    #[arg(
        long,
        default_value = "5000",
        help = "Poll interval for DER catalog and audit trail, in milliseconds"
    )]
    pub der_poll_ms: u64,

    #[arg(
        long,
        default_value = "15000",
        help = "Backend health probe interval in milliseconds"
    )]
    pub health_poll_ms: u64,

    #[arg(long, default_value = "10", help = "HTTP request timeout in seconds")]
    pub request_timeout_secs: u64,

    #[arg(
        long,
        env = "FLUXEON_FEEDER",
        help = "Feeder id to focus once it appears in the list, e.g. F12"
    )]
    pub feeder: Option<String>,

    #[arg(
        long,
        env = "FLUXEON_POLL_LOG",
        value_hint = clap::ValueHint::FilePath,
        help = "Optional path for a daily-rolling poll log, e.g. logs/fluxeon.log"
    )]
    pub poll_log: Option<PathBuf>,

    #[arg(
        long,
        default_value = "fluxeon_events.csv",
        value_hint = clap::ValueHint::FilePath,
        help = "Path written by the in-app events CSV export"
    )]
    pub export_path: PathBuf,
}

impl MonitorArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.api_base_url)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_poll_interval(Duration::from_millis(self.feeder_poll_ms))
    }
}

#[derive(Parser, Clone, Debug)]
pub struct ExportArgs {
    #[arg(
        long,
        env = "FLUXEON_API_BASE",
        default_value = "http://localhost:8000",
        help = "Base URL of the FLUXEON backend API"
    )]
    pub api_base_url: String,

    #[arg(
        long,
        default_value = "fluxeon_events.csv",
        value_hint = clap::ValueHint::FilePath,
        help = "Output CSV path"
    )]
    pub out: PathBuf,

    #[arg(long, help = "Only export events with this status: ACTIVE, COMPLETED or FAILED")]
    pub status: Option<String>,

    #[arg(long, help = "Only export events whose feeder id contains this text")]
    pub feeder: Option<String>,

    #[arg(long, help = "Only export events whose OBP id contains this text")]
    pub obp: Option<String>,

    #[arg(long, default_value = "3", help = "Fetch attempts before giving up")]
    pub max_retries: u32,

    #[arg(long, default_value = "1000", help = "Initial retry delay in milliseconds")]
    pub retry_base_ms: u64,

    #[arg(long, default_value = "10", help = "HTTP request timeout in seconds")]
    pub request_timeout_secs: u64,
}

impl ExportArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.api_base_url)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_retry_config(
                self.max_retries,
                Duration::from_millis(self.retry_base_ms),
                Duration::from_secs(30),
            )
    }
}
