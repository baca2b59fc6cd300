use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app_dirs::AppDirs;

pub const ENV_LOG: &str = "KWIZ_LOG";

/// Route `tracing` output to a daily log file. The terminal belongs to the UI,
/// so nothing is written to stdout. Keep the guard alive until exit.
pub fn init() -> Option<WorkerGuard> {
    let dir = AppDirs::log_dir()?;
    init_in(&dir)
}

pub fn init_in(dir: &Path) -> Option<WorkerGuard> {
    std::fs::create_dir_all(dir).ok()?;

    let file_appender = tracing_appender::rolling::daily(dir, "kwiz.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter =
        EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .ok()?;

    Some(guard)
}
