//! Best-result summary and publishing
//!
//! The summary captures the full metric set of the epoch with the best
//! validation loss so far. It is refreshed on every loss improvement (ties
//! included) and can be handed to a [`Publisher`] at any point in the run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ledger::MetricSnapshot;
use crate::Result;

/// Metrics of the best-loss epoch of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSummary {
    /// Experiment name
    pub experiment: String,
    /// 0-based epoch index of the best-loss epoch
    pub epoch: u64,
    /// Best validation loss
    pub best_val_loss: f64,
    /// Validation accuracy at that epoch
    pub val_accuracy: f64,
    /// Training loss at that epoch
    pub train_loss: f64,
    /// Training accuracy at that epoch
    pub train_accuracy: f64,
    /// Validation score at that epoch
    pub val_score: f64,
    /// Training score at that epoch
    pub train_score: f64,
}

impl BestSummary {
    /// Summary of `snapshot` for `experiment`.
    #[must_use]
    pub fn from_snapshot(experiment: impl Into<String>, snapshot: &MetricSnapshot) -> Self {
        Self {
            experiment: experiment.into(),
            epoch: snapshot.epoch,
            best_val_loss: snapshot.val_loss,
            val_accuracy: snapshot.val_accuracy,
            train_loss: snapshot.train_loss,
            train_accuracy: snapshot.train_accuracy,
            val_score: snapshot.val_score,
            train_score: snapshot.train_score,
        }
    }
}

/// Destination for a run summary (chat notification, file, log).
pub trait Publisher {
    /// Publish `summary`.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary cannot be delivered.
    fn publish(&mut self, summary: &BestSummary) -> Result<()>;
}

/// Writes the summary as pretty-printed JSON to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFilePublisher {
    path: PathBuf,
}

impl JsonFilePublisher {
    /// File name used by [`JsonFilePublisher::in_dir`].
    pub const FILE_NAME: &'static str = "summary.json";

    /// Publish to an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Publish to `summary.json` under `dir` (typically the run directory).
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    /// Target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a previously published summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not a summary.
    pub fn read(&self) -> Result<BestSummary> {
        let json = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Publisher for JsonFilePublisher {
    fn publish(&mut self, summary: &BestSummary) -> Result<()> {
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "published run summary");
        Ok(())
    }
}

/// Logs the summary through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&mut self, summary: &BestSummary) -> Result<()> {
        tracing::info!(
            experiment = %summary.experiment,
            epoch = summary.epoch,
            best_val_loss = summary.best_val_loss,
            val_accuracy = summary.val_accuracy,
            val_score = summary.val_score,
            "best result"
        );
        Ok(())
    }
}
