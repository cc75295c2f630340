//! # Skill Error Types

use bruiser_core::ScriptError;
use std::path::PathBuf;
use thiserror::Error;

/// The settings file could not be used.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has the wrong shape.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for settings loading.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// A player XP award was abandoned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AwardError {
    /// A script call failed.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// The VM reported a negative experience total.
    #[error("player experience read back as {0}")]
    NegativeExperience(f32),
}
