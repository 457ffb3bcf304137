use std::fs::OpenOptions;
use std::sync::Mutex;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;

/// Installs the global tracing subscriber.
///
/// The terminal UI owns stdout/stderr while it runs, so interactive sessions
/// log to `config.log_file`; headless runs log to stderr.
pub fn init_logging(config: &AppConfig, headless: bool) -> Result<()> {
    let level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,climate_engine_tui={level},climate_engine={level}")));

    let installed = if headless {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    };

    installed.map_err(|e| eyre!("Failed to initialize logging: {e}"))
}
