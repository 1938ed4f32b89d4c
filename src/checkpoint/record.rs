//! Checkpoint Record - one persisted model-state file

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::objective::Objective;

/// Checkpoint Record describes a checkpoint file written for one objective.
///
/// Checkpoints are not versioned: each improvement overwrites the previous
/// file for the same objective, so the record reflects the latest write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointRecord {
    objective: Objective,
    epoch: u64,
    path: PathBuf,
    size_bytes: u64,
    created_at: DateTime<Utc>,
}

impl CheckpointRecord {
    /// Create a new checkpoint record.
    ///
    /// # Arguments
    ///
    /// * `objective` - Objective the checkpoint was written for
    /// * `epoch` - 0-based epoch index of the model state
    /// * `path` - File that was written
    /// * `size_bytes` - Size of the model state in bytes
    #[must_use]
    pub fn new(objective: Objective, epoch: u64, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            objective,
            epoch,
            path: path.into(),
            size_bytes,
            created_at: Utc::now(),
        }
    }

    /// Get the objective.
    #[must_use]
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    /// Get the 0-based epoch index.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Get the checkpoint file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the checkpoint size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Get the write timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
