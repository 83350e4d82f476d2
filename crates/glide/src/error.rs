//! Error handling for the glide binary.

use std::{io, path::PathBuf, result};

use thiserror::Error;

/// Convenient result type for glide commands.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum Error {
    /// Effect configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] config::Error),
    /// A scenario file could not be read.
    #[error("Failed to read scenario {}: {source}", path.display())]
    ScenarioRead {
        /// Scenario path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A scenario file is not valid RON.
    #[error("Failed to parse scenario {}: {source}", path.display())]
    ScenarioParse {
        /// Scenario path.
        path: PathBuf,
        /// Parser error with position.
        source: ron::error::SpannedError,
    },
    /// A scenario step referenced something the world does not know.
    #[error("Step {index} ({step}): {message}")]
    Step {
        /// Zero-based step index.
        index: usize,
        /// Rendered step.
        step: String,
        /// What went wrong.
        message: String,
    },
    /// Serializing a report or configuration failed.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
