//! # Core Error Types
//!
//! Errors crossing the host boundary. None of these ever escape a
//! notification handler; handlers log them and return.

use std::time::Duration;
use thiserror::Error;

/// A form, flag or setting the plugin needs is missing from the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No named flag with this editor id.
    #[error("failed to load in flag {0}")]
    MissingFlag(String),

    /// No keyword with this editor id.
    #[error("failed to load in keyword {0}")]
    MissingKeyword(String),

    /// No engine setting with this name.
    #[error("failed to load {0} from game settings")]
    MissingGameSetting(String),

    /// The host refused the subscription.
    #[error("host refused the {0} event sink")]
    SinkRefused(&'static str),
}

/// Result type for registration-time resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// A blocking script call did not produce a usable value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// The VM refused to queue the call. The callback will never run.
    #[error("script VM rejected dispatch of {class}.{function}")]
    DispatchRejected {
        /// Script class.
        class: String,
        /// Static function.
        function: String,
    },

    /// The callback delivered a value of the wrong type.
    #[error("{class}.{function} returned {found}, expected {expected}")]
    UnexpectedReturn {
        /// Script class.
        class: String,
        /// Static function.
        function: String,
        /// Type the caller asked for.
        expected: &'static str,
        /// Type the VM delivered.
        found: &'static str,
    },

    /// No callback within the configured timeout.
    #[error("timed out after {waited:?} waiting for {class}.{function}")]
    TimedOut {
        /// Script class.
        class: String,
        /// Static function.
        function: String,
        /// How long we waited.
        waited: Duration,
    },
}

/// A background job could not be queued.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Every slot in the queue is taken.
    #[error("task queue {0} is full")]
    QueueFull(String),

    /// All workers are gone.
    #[error("task queue {0} is closed")]
    Closed(String),

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker for task queue {name}: {source}")]
    Spawn {
        /// Queue name.
        name: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// An actor's AI process data is not available.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessError {
    /// The actor has no AI process at all.
    #[error("actor has no AI process")]
    NoProcess,

    /// The actor has a process but no high-level data.
    #[error("actor has no high-level AI process")]
    NoHighProcess,
}
