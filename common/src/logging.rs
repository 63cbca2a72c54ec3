//! Process-wide logging: human readable lines on stderr and in a log file.
//!
//! Call [`init`] once at the top of `main` and keep the returned guard alive
//! until the process exits, otherwise buffered file output is lost.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("unable to create log directory {dir}: {source}")]
    CreateDir {
        dir: String,
        source: std::io::Error,
    },

    #[error("invalid log filter {0:?}")]
    Filter(String),

    #[error("logging already initialized")]
    AlreadyInitialized,
}

/// Log to stderr and to `dir/file_name`.
///
/// `default_filter` applies when `RUST_LOG` is unset.
pub fn init(
    dir: impl AsRef<Path>,
    file_name: &str,
    default_filter: &str,
) -> Result<WorkerGuard, LoggingError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        dir: dir.display().to_string(),
        source,
    })?;

    let filter = match std::env::var("RUST_LOG") {
        Ok(env) if !env.trim().is_empty() => {
            EnvFilter::try_new(&env).map_err(|_| LoggingError::Filter(env))?
        }
        _ => EnvFilter::try_new(default_filter)
            .map_err(|_| LoggingError::Filter(default_filter.to_owned()))?,
    };

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(guard)
}
