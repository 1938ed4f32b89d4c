//! Checkpoint persistence
//!
//! Every file is written to a temporary sibling and renamed into place, so a
//! reader (or a crash) only ever sees the previous or the new model state.

use std::fs;
use std::path::{Path, PathBuf};

use super::{CheckpointDecision, CheckpointRecord};
use crate::objective::Objective;
use crate::{Error, Result};

/// Path of the checkpoint for `objective` under `dir`.
#[must_use]
pub fn checkpoint_path(dir: &Path, objective: Objective, extension: &str) -> PathBuf {
    dir.join(format!("{}.{extension}", objective.file_stem()))
}

/// Write `model_state` once per objective selected by `decision`.
///
/// All files derive from the same `model_state`. Returns one record per file
/// written (0, 1 or 2).
///
/// # Errors
///
/// Returns [`Error::CheckpointWrite`] on the first file that cannot be
/// written; files written before it remain valid.
pub fn write_checkpoints(
    dir: &Path,
    extension: &str,
    decision: CheckpointDecision,
    epoch: u64,
    model_state: &[u8],
) -> Result<Vec<CheckpointRecord>> {
    decision
        .objectives()
        .map(|objective| {
            let path = checkpoint_path(dir, objective, extension);
            write_atomic(&path, model_state)?;
            tracing::debug!(
                %objective,
                epoch,
                path = %path.display(),
                bytes = model_state.len(),
                "wrote checkpoint"
            );
            Ok(CheckpointRecord::new(objective, epoch, path, model_state.len() as u64))
        })
        .collect()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    fs::write(&temp, bytes)
        .and_then(|()| fs::rename(&temp, path))
        .map_err(|source| {
            // Best effort cleanup.
            if let Err(cleanup) = fs::remove_file(&temp) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %temp.display(), error = %cleanup, "stale checkpoint temp file");
                }
            }
            Error::CheckpointWrite {
                path: path.to_path_buf(),
                source,
            }
        })
}
