//! # Registro: Epoch Bookkeeping for Model Training
//!
//! **Version**: 0.1.0
//!
//! Registro coordinates the bookkeeping around repeated training epochs:
//! when to run validation, how metrics compare across epochs, which
//! checkpoints are worth persisting, and an append-only experiment ledger.
//! Tensor math, data loading and metric formulas stay with the caller.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: Failures stop the run; no default value ever replaces a
//!   failed metric
//! - **Poka-Yoke**: A run directory is never merged into silently; reuse
//!   requires an explicit overwrite
//! - **Genchi Genbutsu**: Ledger state is read from disk, not remembered
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use registro::{ExperimentOrchestrator, OrchestratorConfig};
//! use registro::ledger::MetricSnapshot;
//! use registro::metrics::MetricSuite;
//!
//! let config = OrchestratorConfig::builder("baseline").build()?;
//! let mut orchestrator = ExperimentOrchestrator::new(config, MetricSuite::classification())?;
//!
//! let decision = orchestrator.record_snapshot(MetricSnapshot {
//!     epoch: 0,
//!     val_loss: 0.9,
//!     train_loss: 1.1,
//!     val_accuracy: 0.61,
//!     train_accuracy: 0.58,
//!     val_score: 0.70,
//!     train_score: 0.66,
//! })?;
//! if decision.is_progress() {
//!     orchestrator.save_checkpoint(b"serialized weights")?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod objective;
pub mod orchestrator;
pub mod schedule;
pub mod summary;
pub mod telemetry;
pub mod workspace;

pub use checkpoint::{BestTracker, CheckpointDecision, CheckpointSelector};
pub use config::OrchestratorConfig;
pub use error::{Error, Result};
pub use orchestrator::{ExperimentOrchestrator, OrchestratorState};
pub use workspace::{RunWorkspace, WorkspaceState};
