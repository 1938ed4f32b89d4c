//! Experiment orchestrator - per-epoch bookkeeping contract for a training loop
//!
//! ## State Machine
//!
//! ```text
//!            prepare workspace
//!   new() ───────────────────────> Initialized ──validate──> Validating ──> Idle
//!     │                                                          ^          │
//!     │ RunAlreadyExists                                         └─validate─┘
//!     v
//!   Blocked (construction fails, the process must stop)
//! ```
//!
//! A triggered epoch runs, in order: metric computation, checkpoint
//! selection, ledger append, scalar emission. The caller then reads the
//! decision and persists 0, 1 or 2 checkpoint files from one model state.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use registro::metrics::{MetricSuite, ValidationBundle};
//! use registro::{ExperimentOrchestrator, OrchestratorConfig};
//!
//! # fn main() -> registro::Result<()> {
//! let config = OrchestratorConfig::builder("resnet50-fold0")
//!     .validation_frequency(2)
//!     .build()?;
//! let mut orchestrator = ExperimentOrchestrator::new(config, MetricSuite::classification())?;
//!
//! for epoch in 0..10 {
//!     let mut bundle = ValidationBundle::new(3)?;
//!     // ... training pass: push train batches when orchestrator.should_trigger(epoch)
//!     if orchestrator.should_trigger(epoch) {
//!         // ... validation pass: push val batches
//!         orchestrator.validate(&bundle, epoch)?;
//!         if orchestrator.is_progress() {
//!             orchestrator.save_checkpoint(b"model weights")?;
//!         }
//!     }
//!     bundle.clear();
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::checkpoint::{
    write_checkpoints, BestTracker, CheckpointDecision, CheckpointRecord, CheckpointSelector,
};
use crate::config::OrchestratorConfig;
use crate::ledger::{check_loss, check_unit, LedgerEntry, MetricSnapshot, ResultLedger};
use crate::metrics::{Metric, MetricSuite, Outputs, ValidationBundle};
use crate::schedule::TriggerSchedule;
use crate::summary::{BestSummary, Publisher};
use crate::telemetry::{emit_snapshot, NullSink, ScalarSink};
use crate::workspace::{ExperimentRun, RunWorkspace};
use crate::{Error, Result};

/// Orchestrator lifecycle state.
///
/// `Blocked` is never observed on a live orchestrator: a blocked workspace
/// fails construction with [`Error::RunAlreadyExists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorState {
    /// Workspace prepared, no epoch validated yet.
    Initialized,
    /// Inside a validation call.
    Validating,
    /// Between validations.
    Idle,
    /// Workspace preparation refused.
    Blocked,
}

/// Owns one run's bookkeeping: workspace, ledger, best tracker and sink.
#[derive(Debug)]
pub struct ExperimentOrchestrator<S = NullSink> {
    config: OrchestratorConfig,
    schedule: TriggerSchedule,
    run: ExperimentRun,
    workspace: RunWorkspace,
    ledger: ResultLedger,
    metrics: MetricSuite,
    sink: S,
    best: BestTracker,
    decision: CheckpointDecision,
    summary: Option<BestSummary>,
    last_epoch: Option<u64>,
    state: OrchestratorState,
}

impl ExperimentOrchestrator<NullSink> {
    /// Prepare the run workspace without telemetry.
    ///
    /// # Errors
    ///
    /// See [`ExperimentOrchestrator::with_sink`].
    pub fn new(config: OrchestratorConfig, metrics: MetricSuite) -> Result<Self> {
        Self::with_sink(config, metrics, NullSink)
    }
}

impl<S: ScalarSink> ExperimentOrchestrator<S> {
    /// Prepare the run workspace and emit telemetry to `sink`.
    ///
    /// Directory side effects happen here, exactly once, before any epoch.
    ///
    /// # Errors
    ///
    /// - [`Error::RunAlreadyExists`] if the run directory exists and the
    ///   config does not allow overwriting; the caller must stop
    /// - [`Error::InvalidConfig`] / [`Error::Io`] from workspace preparation
    pub fn with_sink(config: OrchestratorConfig, metrics: MetricSuite, sink: S) -> Result<Self> {
        config.validate()?;
        let workspace = RunWorkspace::prepare(
            config.results_root(),
            config.experiment_name(),
            config.overwrite(),
        )?;
        let run = ExperimentRun::from(&workspace);
        let ledger = ResultLedger::in_dir(workspace.dir());

        tracing::info!(
            run = run.name(),
            state = ?run.workspace_state(),
            frequency = ?config.validation_frequency(),
            ?metrics,
            "experiment initialized"
        );

        Ok(Self {
            schedule: config.schedule(),
            config,
            run,
            workspace,
            ledger,
            metrics,
            sink,
            best: BestTracker::new(),
            decision: CheckpointDecision::default(),
            summary: None,
            last_epoch: None,
            state: OrchestratorState::Initialized,
        })
    }

    /// Whether the validation pass should run for `epoch` (0-based).
    #[must_use]
    pub const fn should_trigger(&self, epoch: u64) -> bool {
        self.schedule.should_run(epoch)
    }

    /// Compute metrics for a triggered epoch and do its bookkeeping.
    ///
    /// Loss is computed on both splits, then accuracy, then score. The
    /// resulting snapshot goes through [`ExperimentOrchestrator::record_snapshot`].
    ///
    /// # Errors
    ///
    /// - [`Error::MetricComputation`] if a collaborator fails or returns an
    ///   out-of-domain value
    /// - [`Error::NonMonotonicEpoch`] if `epoch` does not follow the last one
    /// - [`Error::InvalidInput`] for the epoch index `u64::MAX`
    /// - [`Error::LedgerWrite`] if the row cannot be appended
    ///
    /// On error nothing is recorded and the pending decision is cleared.
    pub fn validate(&mut self, bundle: &ValidationBundle, epoch: u64) -> Result<CheckpointDecision> {
        self.begin(epoch)?;
        let outcome = self
            .measure(bundle, epoch)
            .and_then(|snapshot| self.commit(snapshot));
        self.finish(outcome)
    }

    /// Bookkeeping for metrics the caller already computed.
    ///
    /// # Errors
    ///
    /// Same as [`ExperimentOrchestrator::validate`], minus collaborator failures.
    pub fn record_snapshot(&mut self, snapshot: MetricSnapshot) -> Result<CheckpointDecision> {
        self.begin(snapshot.epoch)?;
        let outcome = snapshot.check().and_then(|()| self.commit(snapshot));
        self.finish(outcome)
    }

    /// Whether the last validation asked for any checkpoint.
    #[must_use]
    pub fn is_progress(&self) -> bool {
        self.decision.is_progress()
    }

    /// Decision of the last validation.
    #[must_use]
    pub const fn decision(&self) -> CheckpointDecision {
        self.decision
    }

    /// Persist `model_state` once per objective selected by the last decision.
    ///
    /// Files are `weights_loss.<ext>` and `weights_roc.<ext>` in the run
    /// directory, overwritten in place. With no validated epoch, or no
    /// progress, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CheckpointWrite`] if a file cannot be written.
    pub fn save_checkpoint(&self, model_state: &[u8]) -> Result<Vec<CheckpointRecord>> {
        let Some(epoch) = self.last_epoch else {
            return Ok(Vec::new());
        };
        write_checkpoints(
            self.workspace.dir(),
            self.config.checkpoint_extension(),
            self.decision,
            epoch,
            model_state,
        )
    }

    /// Hand the best-loss summary to `publisher`.
    ///
    /// Returns `false` (publishing nothing) before the first validation.
    ///
    /// # Errors
    ///
    /// Propagates the publisher's failure.
    pub fn publish(&self, publisher: &mut dyn Publisher) -> Result<bool> {
        match &self.summary {
            Some(summary) => {
                publisher.publish(summary)?;
                Ok(true)
            }
            None => {
                tracing::warn!(run = self.run.name(), "no validated epoch to publish");
                Ok(false)
            }
        }
    }

    /// Running optimum.
    #[must_use]
    pub const fn best(&self) -> &BestTracker {
        &self.best
    }

    /// Metrics of the best-loss epoch so far.
    #[must_use]
    pub const fn summary(&self) -> Option<&BestSummary> {
        self.summary.as_ref()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Last validated epoch index.
    #[must_use]
    pub const fn last_epoch(&self) -> Option<u64> {
        self.last_epoch
    }

    /// Run identity.
    #[must_use]
    pub const fn run(&self) -> &ExperimentRun {
        &self.run
    }

    /// Run directory handle.
    #[must_use]
    pub const fn workspace(&self) -> &RunWorkspace {
        &self.workspace
    }

    /// Result ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Telemetry sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the orchestrator, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn begin(&mut self, epoch: u64) -> Result<()> {
        if let Some(last) = self.last_epoch {
            if epoch <= last {
                self.decision = CheckpointDecision::default();
                return Err(Error::NonMonotonicEpoch { epoch, last });
            }
        }
        self.state = OrchestratorState::Validating;
        Ok(())
    }

    fn finish(&mut self, outcome: Result<CheckpointDecision>) -> Result<CheckpointDecision> {
        self.state = OrchestratorState::Idle;
        if outcome.is_err() {
            self.decision = CheckpointDecision::default();
        }
        outcome
    }

    fn measure(&self, bundle: &ValidationBundle, epoch: u64) -> Result<MetricSnapshot> {
        let loss = self.metrics.loss();
        let accuracy = self.metrics.accuracy();
        let score = self.metrics.score();

        Ok(MetricSnapshot {
            epoch,
            val_loss: check_loss(loss.name(), compute(loss, &bundle.val)?)?,
            train_loss: check_loss(loss.name(), compute(loss, &bundle.train)?)?,
            val_accuracy: check_unit(accuracy.name(), compute(accuracy, &bundle.val)?)?,
            train_accuracy: check_unit(accuracy.name(), compute(accuracy, &bundle.train)?)?,
            val_score: check_unit(score.name(), compute(score, &bundle.val)?)?,
            train_score: check_unit(score.name(), compute(score, &bundle.train)?)?,
        })
    }

    /// Select, append, then publish state: the tracker only advances once
    /// the ledger row is durable.
    fn commit(&mut self, snapshot: MetricSnapshot) -> Result<CheckpointDecision> {
        let entry = LedgerEntry::try_from(&snapshot)?;
        let mut best = self.best;
        let decision = CheckpointSelector::evaluate(&snapshot, &mut best);

        self.ledger.append(&entry)?;

        self.best = best;
        self.decision = decision;
        self.last_epoch = Some(snapshot.epoch);
        if decision.save_for_loss() {
            self.summary = Some(BestSummary::from_snapshot(self.run.name(), &snapshot));
        }

        emit_snapshot(&mut self.sink, &snapshot);

        tracing::info!(
            run = self.run.name(),
            epoch = snapshot.epoch,
            val_loss = snapshot.val_loss,
            train_loss = snapshot.train_loss,
            val_accuracy = snapshot.val_accuracy,
            train_accuracy = snapshot.train_accuracy,
            val_score = snapshot.val_score,
            train_score = snapshot.train_score,
            save_for_loss = decision.save_for_loss(),
            save_for_score = decision.save_for_score(),
            "validated epoch"
        );
        Ok(decision)
    }
}

fn compute(metric: &dyn Metric, outputs: &Outputs) -> Result<f64> {
    metric.compute(outputs)
}
