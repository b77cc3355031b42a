use clap::{Parser, Subcommand};

use crate::config::monitor::{ExportArgs, MonitorArgs};

#[derive(Parser)]
#[command(
    name = "fluxeon",
    about = "FLUXEON Command Centre - feeder risk and flexibility dispatch monitor",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive terminal command centre
    Tui(MonitorArgs),
    /// Run headless, logging fleet KPIs and risk transitions
    Daemon(MonitorArgs),
    /// Fetch the active events once and write them as CSV
    #[command(name = "export-events")]
    ExportEvents(ExportArgs),
}
