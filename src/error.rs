//! Error types for Registro
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Nothing in this crate retries. Every variant is a configuration or
//! environment problem that is surfaced to the caller immediately.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Registro error types
#[derive(Error, Debug)]
pub enum Error {
    /// Run directory already exists and overwrite was not requested
    #[error("Run '{name}' already exists at {}\nManual deletion needed (or enable overwrite)", path.display())]
    RunAlreadyExists {
        /// Experiment name
        name: String,
        /// Existing run directory
        path: PathBuf,
    },

    /// Appending a row to the result ledger failed; the run is unusable past this point
    #[error("Ledger write failed for {}: {source}", path.display())]
    LedgerWrite {
        /// Ledger file
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// A loss or metric collaborator failed or produced an unusable value
    #[error("Metric '{metric}' computation failed: {reason}")]
    MetricComputation {
        /// Metric name
        metric: String,
        /// What went wrong
        reason: String,
    },

    /// Validation epochs must strictly increase within a run
    #[error("Epoch {epoch} is not after the last validated epoch {last}")]
    NonMonotonicEpoch {
        /// Rejected epoch index
        epoch: u64,
        /// Last accepted epoch index
        last: u64,
    },

    /// Writing a checkpoint file failed
    #[error("Checkpoint write failed for {}: {source}", path.display())]
    CheckpointWrite {
        /// Checkpoint file
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// Configuration rejected at build/parse time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid input parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding/decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::MetricComputation`] failure.
    #[must_use]
    pub fn metric(metric: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MetricComputation {
            metric: metric.into(),
            reason: reason.into(),
        }
    }
}
