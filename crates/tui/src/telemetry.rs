//! Log output for the terminal host.
//!
//! The terminal belongs to ratatui, so logs go to `chirp.log` under the data
//! directory instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::TuiError;

pub const LOG_FILE_NAME: &str = "chirp.log";

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str, log_dir: &Path) -> Result<PathBuf, TuiError> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|error| TuiError::Logging(error.to_string()))?;

    tracing::info!(path = %log_path.display(), level, "logging initialized");
    Ok(log_path)
}
