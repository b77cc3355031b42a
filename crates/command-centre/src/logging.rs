//! provides logging helpers

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// initiate the global tracing subscriber
///
/// Console output goes to stderr with an env-controlled filter. When a
/// poll-log path is given, a daily-rolling file additionally records every
/// poll outcome at debug level; the returned guard must be held for the
/// lifetime of the process so the non-blocking writer flushes.
pub fn init(poll_log: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter);

    let Some(poll_log) = poll_log else {
        registry().with(fmt_layer).init();
        return None;
    };

    let directory = poll_log
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = poll_log
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("fluxeon.log");

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .max_log_files(3)
        .build(directory)
        .expect("failed to create rolling file appender");

    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

    let file_layer = layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(filter::LevelFilter::DEBUG);

    registry().with(fmt_layer).with(file_layer).init();
    Some(file_guard)
}
