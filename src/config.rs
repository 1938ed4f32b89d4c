//! Orchestrator configuration
//!
//! ```json
//! {
//!   "experiment_name": "resnet50-fold0",
//!   "results_root": "results",
//!   "validation_frequency": 2,
//!   "overwrite": false,
//!   "checkpoint_extension": "bin"
//! }
//! ```
//!
//! Only `experiment_name` is required. A `validation_frequency` of zero is
//! rejected; leave it out to validate every epoch.

use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::schedule::TriggerSchedule;
use crate::workspace::validate_run_name;
use crate::{Error, Result};

/// Default directory holding one sub-directory per run.
pub const DEFAULT_RESULTS_ROOT: &str = "results";

/// Default checkpoint file extension.
pub const DEFAULT_CHECKPOINT_EXTENSION: &str = "bin";

fn default_results_root() -> PathBuf {
    PathBuf::from(DEFAULT_RESULTS_ROOT)
}

fn default_checkpoint_extension() -> String {
    DEFAULT_CHECKPOINT_EXTENSION.to_string()
}

/// Settings for one experiment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    experiment_name: String,
    #[serde(default = "default_results_root")]
    results_root: PathBuf,
    #[serde(default)]
    validation_frequency: Option<NonZeroU64>,
    #[serde(default)]
    overwrite: bool,
    #[serde(default = "default_checkpoint_extension")]
    checkpoint_extension: String,
}

impl OrchestratorConfig {
    /// Create a builder; `experiment_name` is the only required field.
    #[must_use]
    pub fn builder(experiment_name: impl Into<String>) -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::new(experiment_name)
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] for malformed JSON (including a zero
    /// frequency) and [`Error::InvalidConfig`] for invalid values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    ///
    /// Same as [`OrchestratorConfig::from_json_str`], plus [`Error::Io`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        validate_run_name(&self.experiment_name)?;
        let ext = &self.checkpoint_extension;
        if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "checkpoint_extension must be a bare extension like \"bin\", got {ext:?}"
            )));
        }
        Ok(())
    }

    /// Experiment name (also the run directory name).
    #[must_use]
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Directory holding run directories.
    #[must_use]
    pub fn results_root(&self) -> &Path {
        &self.results_root
    }

    /// Validation frequency, `None` meaning every epoch.
    #[must_use]
    pub const fn validation_frequency(&self) -> Option<NonZeroU64> {
        self.validation_frequency
    }

    /// Whether an existing run directory may be wiped.
    #[must_use]
    pub const fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Checkpoint file extension.
    #[must_use]
    pub fn checkpoint_extension(&self) -> &str {
        &self.checkpoint_extension
    }

    /// Validation trigger derived from the frequency.
    #[must_use]
    pub const fn schedule(&self) -> TriggerSchedule {
        TriggerSchedule::new(self.validation_frequency)
    }
}

/// Builder for `OrchestratorConfig`.
#[derive(Debug)]
pub struct OrchestratorConfigBuilder {
    experiment_name: String,
    results_root: PathBuf,
    validation_frequency: Option<u64>,
    overwrite: bool,
    checkpoint_extension: String,
}

impl OrchestratorConfigBuilder {
    /// Create a new builder with defaults for every optional field.
    #[must_use]
    pub fn new(experiment_name: impl Into<String>) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            results_root: default_results_root(),
            validation_frequency: None,
            overwrite: false,
            checkpoint_extension: default_checkpoint_extension(),
        }
    }

    /// Set the results root directory.
    #[must_use]
    pub fn results_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.results_root = root.into();
        self
    }

    /// Validate every `frequency` epochs (must be positive).
    #[must_use]
    pub const fn validation_frequency(mut self, frequency: u64) -> Self {
        self.validation_frequency = Some(frequency);
        self
    }

    /// Allow wiping an existing run directory.
    #[must_use]
    pub const fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the checkpoint file extension.
    #[must_use]
    pub fn checkpoint_extension(mut self, extension: impl Into<String>) -> Self {
        self.checkpoint_extension = extension.into();
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero frequency, an unusable
    /// experiment name, or a malformed extension.
    pub fn build(self) -> Result<OrchestratorConfig> {
        let validation_frequency = match self.validation_frequency {
            None => None,
            Some(n) => Some(NonZeroU64::new(n).ok_or_else(|| {
                Error::InvalidConfig("validation_frequency must be positive".to_string())
            })?),
        };
        let config = OrchestratorConfig {
            experiment_name: self.experiment_name,
            results_root: self.results_root,
            validation_frequency,
            overwrite: self.overwrite,
            checkpoint_extension: self.checkpoint_extension,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = OrchestratorConfig::builder("exp").build().unwrap();
        assert_eq!(config.experiment_name(), "exp");
        assert_eq!(config.results_root(), Path::new("results"));
        assert_eq!(config.validation_frequency(), None);
        assert!(!config.overwrite());
        assert_eq!(config.checkpoint_extension(), "bin");
        assert_eq!(config.schedule(), TriggerSchedule::every_epoch());
    }

    #[test]
    fn test_builder_rejects_zero_frequency() {
        let err = OrchestratorConfig::builder("exp")
            .validation_frequency(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_builder_rejects_bad_extension() {
        for ext in ["", ".bin", "a/b"] {
            assert!(OrchestratorConfig::builder("exp")
                .checkpoint_extension(ext)
                .build()
                .is_err());
        }
    }

    #[test]
    fn test_from_json_minimal() {
        let config = OrchestratorConfig::from_json_str(r#"{"experiment_name": "r1"}"#).unwrap();
        assert_eq!(config, OrchestratorConfig::builder("r1").build().unwrap());
    }

    #[test]
    fn test_from_json_full() {
        let config = OrchestratorConfig::from_json_str(
            r#"{
                "experiment_name": "r1",
                "results_root": "/tmp/out",
                "validation_frequency": 2,
                "overwrite": true,
                "checkpoint_extension": "pth"
            }"#,
        )
        .unwrap();
        assert_eq!(config.validation_frequency(), NonZeroU64::new(2));
        assert!(config.overwrite());
        assert_eq!(config.checkpoint_extension(), "pth");
        assert!(!config.schedule().should_run(0));
        assert!(config.schedule().should_run(1));
    }

    #[test]
    fn test_from_json_rejects_zero_frequency() {
        let err = OrchestratorConfig::from_json_str(
            r#"{"experiment_name": "r1", "validation_frequency": 0}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_from_json_rejects_escaping_name() {
        let err = OrchestratorConfig::from_json_str(r#"{"experiment_name": "../x"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"experiment_name": "disk"}"#).unwrap();
        assert_eq!(OrchestratorConfig::from_path(&path).unwrap().experiment_name(), "disk");
    }
}
