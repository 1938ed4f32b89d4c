//! Run workspace - on-disk lifecycle of one experiment's output directory
//!
//! ```text
//! <results_root>/<experiment_name>/
//!     result.csv          append-only ledger
//!     weights_loss.<ext>  best-loss checkpoint (overwritten in place)
//!     weights_roc.<ext>   best-score checkpoint (overwritten in place)
//! ```
//!
//! Preparation happens exactly once per run, before any epoch:
//! - missing directory: create it (`Fresh`)
//! - existing directory, overwrite requested: delete recursively, recreate (`Overwritten`)
//! - existing directory, no overwrite: refuse with [`Error::RunAlreadyExists`] (`Blocked`)
//!
//! There is no locking. Two processes preparing the same name at once is
//! unsupported.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Lifecycle outcome of preparing a run directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkspaceState {
    /// Directory did not exist and was created.
    Fresh,
    /// Directory existed and was wiped and recreated.
    Overwritten,
    /// Directory existed and overwrite was not requested.
    Blocked,
}

/// Check that `name` is usable as a single directory name.
///
/// The name is the target of a recursive delete on overwrite, so anything
/// that could escape the results root is rejected.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for empty names, `.`/`..`, or names
/// containing path separators.
pub fn validate_run_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(Error::InvalidConfig(format!(
            "experiment name must be a single directory name, got {name:?}"
        ))),
    }
}

/// Handle to a prepared run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWorkspace {
    name: String,
    dir: PathBuf,
    state: WorkspaceState,
}

impl RunWorkspace {
    /// Decide what [`RunWorkspace::prepare`] would do, without touching the disk.
    #[must_use]
    pub fn probe(root: &Path, name: &str, overwrite: bool) -> WorkspaceState {
        if !root.join(name).exists() {
            WorkspaceState::Fresh
        } else if overwrite {
            WorkspaceState::Overwritten
        } else {
            WorkspaceState::Blocked
        }
    }

    /// Prepare `<root>/<name>` for a new run.
    ///
    /// Overwriting irreversibly destroys every prior result under that name.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `name` is not a single directory name
    /// - [`Error::RunAlreadyExists`] if the directory exists and `overwrite` is false
    /// - [`Error::Io`] if the directory cannot be removed or created
    pub fn prepare(root: &Path, name: &str, overwrite: bool) -> Result<Self> {
        validate_run_name(name)?;
        let dir = root.join(name);

        let state = Self::probe(root, name, overwrite);
        match state {
            WorkspaceState::Fresh => {}
            WorkspaceState::Overwritten => {
                tracing::warn!(run = name, path = %dir.display(), "run output exists - overwriting");
                if dir.is_dir() {
                    fs::remove_dir_all(&dir)?;
                } else {
                    fs::remove_file(&dir)?;
                }
            }
            WorkspaceState::Blocked => {
                tracing::warn!(run = name, path = %dir.display(), "run output exists - manual deletion needed");
                return Err(Error::RunAlreadyExists {
                    name: name.to_string(),
                    path: dir,
                });
            }
        }

        fs::create_dir_all(&dir)?;
        tracing::info!(run = name, path = %dir.display(), ?state, "prepared run workspace");

        Ok(Self {
            name: name.to_string(),
            dir,
            state,
        })
    }

    /// Experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// How the directory was prepared.
    #[must_use]
    pub const fn state(&self) -> WorkspaceState {
        self.state
    }

    /// Path of a file inside the run directory.
    #[must_use]
    pub fn file(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// Identity of one training run.
///
/// Created once, when the orchestrator prepares its workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRun {
    name: String,
    workspace_state: WorkspaceState,
    created_at: DateTime<Utc>,
}

impl ExperimentRun {
    /// Record a run whose workspace was prepared with the given outcome.
    #[must_use]
    pub fn new(name: impl Into<String>, workspace_state: WorkspaceState) -> Self {
        Self {
            name: name.into(),
            workspace_state,
            created_at: Utc::now(),
        }
    }

    /// Unique run name (also the directory name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Workspace lifecycle outcome.
    #[must_use]
    pub const fn workspace_state(&self) -> WorkspaceState {
        self.workspace_state
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl From<&RunWorkspace> for ExperimentRun {
    fn from(workspace: &RunWorkspace) -> Self {
        Self::new(workspace.name(), workspace.state())
    }
}
