//! # Logging
//!
//! Installs the global `tracing` subscriber. The host binding calls
//! [`init`] once, before [`Plugin::load`](crate::Plugin::load).
//!
//! `RUST_LOG` overrides the default level (`trace` in debug builds, `info`
//! otherwise). `trace!` calls are compiled out of release builds.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Logging could not be set up.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// The log file could not be created.
    #[error("failed to create log file {}: {source}", .path.display())]
    Io {
        /// Log file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

const DEFAULT_LEVEL: &str = if cfg!(debug_assertions) {
    "trace"
} else {
    "info"
};

/// Installs the subscriber, writing to `log_file` (truncated) or stderr.
///
/// # Errors
///
/// [`LoggingError::Io`] if the file cannot be created,
/// [`LoggingError::AlreadyInitialized`] on a second call.
pub fn init(log_file: Option<&Path>) -> Result<(), LoggingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let (writer, ansi) = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| LoggingError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
