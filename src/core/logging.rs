//! Logging initialization
//!
//! The crate and teloxide log through the `log` facade; `try_init` installs
//! the `log` → `tracing` bridge so both end up in the same subscriber.

use std::fs::File;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Initialize logger for console output and, optionally, a log file
///
/// # Arguments
/// * `log_file_path` - Path to the log file (truncated on start), or `None`
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Log file could not be created or a logger is already set
pub fn init_logger(log_file_path: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = match log_file_path {
        Some(path) => {
            let file = File::create(path).map_err(|e| anyhow::anyhow!("Failed to create log file {}: {}", path, e))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}
