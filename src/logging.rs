use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;

pub const LOG_FILE: &str = "blog.log";
pub const ERROR_LOG_FILE: &str = "errors.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Init(#[from] TryInitError),
}

/// `RUST_LOG` wins; otherwise the configured level
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_log_file(directory: &Path, name: &str) -> Result<File, LoggingError> {
    let path = directory.join(name);
    fs::create_dir_all(directory)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
        .map_err(|source| LoggingError::Io { path, source })
}

/// Install the global subscriber: console, plus `blog.log` and an
/// ERROR-only `errors.log` when file logging is enabled.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let console = fmt::layer().compact().with_target(true);

    let (file, errors) = if config.file_logging {
        let directory = Path::new(&config.directory);
        let all = fmt::layer()
            .with_ansi(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(Mutex::new(open_log_file(directory, LOG_FILE)?));
        let errors = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(directory, ERROR_LOG_FILE)?))
            .with_filter(LevelFilter::ERROR);
        (Some(all), Some(errors))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(console)
        .with(file)
        .with(errors)
        .try_init()?;

    tracing::debug!(
        "Logging initialized: level={}, file_logging={}, directory={}",
        config.level,
        config.file_logging,
        config.directory
    );
    Ok(())
}
