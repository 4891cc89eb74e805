use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "chat-composer.log";
const DEFAULT_FILTER: &str = "info";

pub fn default_log_dir(home: &Path) -> PathBuf {
    home.join(".chat-composer").join("log")
}

/// Install the global subscriber, appending to `<log_dir>/chat-composer.log`.
///
/// Logs go to a file because the terminal belongs to the composer UI. `RUST_LOG` overrides
/// the default `info` filter.
pub fn init(log_dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("create {}", log_dir.display()))?;
    let log_path = log_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("install tracing subscriber: {err}"))?;

    Ok(log_path)
}
