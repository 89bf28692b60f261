use autopilot_core::paths::{APP_NAME, cache_dir};
use std::path::PathBuf;

const LOG_FILE_NAME: &str = "autopilot.log";

pub const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Warn;

pub fn default_log_file() -> PathBuf {
    cache_dir().join(LOG_FILE_NAME)
}

/// `--debug` raises the file log to debug so pattern matches are recorded.
pub fn level_for(debug: bool) -> log::LevelFilter {
    if debug {
        log::LevelFilter::Debug
    } else {
        DEFAULT_LOG_LEVEL
    }
}

pub fn setup_logging(level: log::LevelFilter) -> anyhow::Result<()> {
    let log_file = default_log_file();
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    simple_log::file(log_file.to_string_lossy().into_owned(), level, 10, 10)
        .map_err(|e| anyhow::anyhow!(e))?;
    log::info!("{APP_NAME} logging initialised (level={level})");
    Ok(())
}
