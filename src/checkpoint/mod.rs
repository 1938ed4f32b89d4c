//! Checkpoint selection
//!
//! Decides, per validated epoch, whether the current model state is worth
//! persisting for each tracked [`Objective`]. The objectives are evaluated
//! independently: a loss regression never blocks a score checkpoint and vice
//! versa.
//!
//! ## Usage
//!
//! ```rust
//! use registro::checkpoint::{BestTracker, CheckpointSelector};
//! use registro::ledger::MetricSnapshot;
//!
//! let mut best = BestTracker::new();
//! let snapshot = MetricSnapshot {
//!     epoch: 0,
//!     val_loss: 1.0,
//!     train_loss: 1.2,
//!     val_accuracy: 0.6,
//!     train_accuracy: 0.55,
//!     val_score: 0.5,
//!     train_score: 0.52,
//! };
//!
//! let decision = CheckpointSelector::evaluate(&snapshot, &mut best);
//! assert!(decision.save_for_loss() && decision.save_for_score());
//! assert!(decision.is_progress());
//! ```

mod record;
mod writer;

pub use record::CheckpointRecord;
pub use writer::{checkpoint_path, write_checkpoints};

use serde::{Deserialize, Serialize};

use crate::ledger::MetricSnapshot;
use crate::objective::Objective;

/// Running optimum for every tracked objective, scoped to one run.
///
/// Values are indexed by [`Objective::index`]. `best_loss` only ever
/// decreases and `best_score` only ever increases. The per-epoch improvement
/// flags are recomputed on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestTracker {
    best: [f64; Objective::COUNT],
    improved: [bool; Objective::COUNT],
}

impl Default for BestTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BestTracker {
    /// Tracker with every objective at its worst possible value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            best: Objective::ALL.map(Objective::initial_best),
            improved: [false; Objective::COUNT],
        }
    }

    /// Best validation loss so far (`+inf` before any evaluation).
    #[must_use]
    pub const fn best_loss(&self) -> f64 {
        self.best(Objective::Loss)
    }

    /// Best validation score so far (`0.0` before any improvement).
    #[must_use]
    pub const fn best_score(&self) -> f64 {
        self.best(Objective::Score)
    }

    /// Whether the last evaluation improved the loss.
    #[must_use]
    pub const fn loss_improved_this_epoch(&self) -> bool {
        self.improved(Objective::Loss)
    }

    /// Whether the last evaluation improved the score.
    #[must_use]
    pub const fn score_improved_this_epoch(&self) -> bool {
        self.improved(Objective::Score)
    }

    /// Best value for `objective`.
    #[must_use]
    pub const fn best(&self, objective: Objective) -> f64 {
        self.best[objective.index()]
    }

    /// Whether the last evaluation improved `objective`.
    #[must_use]
    pub const fn improved(&self, objective: Objective) -> bool {
        self.improved[objective.index()]
    }

    /// Offer a candidate value; updates the best and the flag, returns the flag.
    fn offer(&mut self, objective: Objective, candidate: f64) -> bool {
        let i = objective.index();
        let improved = objective.improves(candidate, self.best[i]);
        if improved {
            self.best[i] = candidate;
        }
        self.improved[i] = improved;
        improved
    }
}

/// Which checkpoints to persist for the epoch just validated.
///
/// Only meaningful immediately after the validation that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointDecision {
    saves: [bool; Objective::COUNT],
}

impl CheckpointDecision {
    /// Decision persisting exactly `objectives`.
    #[must_use]
    pub fn selecting(objectives: &[Objective]) -> Self {
        let mut decision = Self::default();
        for objective in objectives {
            decision.saves[objective.index()] = true;
        }
        decision
    }

    /// Whether anything should be persisted at all.
    #[must_use]
    pub fn is_progress(&self) -> bool {
        self.saves.contains(&true)
    }

    /// Whether `objective` should be persisted.
    #[must_use]
    pub const fn saves(&self, objective: Objective) -> bool {
        self.saves[objective.index()]
    }

    /// The loss objective improved (ties included).
    #[must_use]
    pub const fn save_for_loss(&self) -> bool {
        self.saves(Objective::Loss)
    }

    /// The score objective strictly improved.
    #[must_use]
    pub const fn save_for_score(&self) -> bool {
        self.saves(Objective::Score)
    }

    /// Objectives to persist, in checkpoint-write order.
    pub fn objectives(&self) -> impl Iterator<Item = Objective> + '_ {
        Objective::ALL.into_iter().filter(|objective| self.saves(*objective))
    }
}

/// Stateless selector applying every objective's comparator to a snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckpointSelector;

impl CheckpointSelector {
    /// Compare `snapshot` against `best`, update `best` in place and return
    /// what to persist.
    pub fn evaluate(snapshot: &MetricSnapshot, best: &mut BestTracker) -> CheckpointDecision {
        let mut decision = CheckpointDecision::default();
        for objective in Objective::ALL {
            decision.saves[objective.index()] = best.offer(objective, objective.value(snapshot));
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(epoch: u64, val_loss: f64, val_score: f64) -> MetricSnapshot {
        MetricSnapshot {
            epoch,
            val_loss,
            train_loss: 0.3,
            val_accuracy: 0.5,
            train_accuracy: 0.5,
            val_score,
            train_score: 0.5,
        }
    }

    fn run(losses: &[f64], scores: &[f64]) -> Vec<(bool, bool)> {
        let mut best = BestTracker::new();
        losses
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(epoch, (&loss, &score))| {
                let d = CheckpointSelector::evaluate(&snapshot(epoch as u64, loss, score), &mut best);
                (d.save_for_loss(), d.save_for_score())
            })
            .collect()
    }

    #[test]
    fn test_initial_tracker() {
        let best = BestTracker::new();
        assert!(best.best_loss().is_infinite());
        assert!(best.best_score().abs() < f64::EPSILON);
        assert!(!best.loss_improved_this_epoch());
        assert!(!best.score_improved_this_epoch());
    }

    #[test]
    fn test_three_epoch_sequence() {
        let decisions = run(&[1.0, 0.9, 0.95], &[0.5, 0.4, 0.6]);
        assert_eq!(decisions, vec![(true, true), (true, false), (false, true)]);
    }

    #[test]
    fn test_loss_tie_saves_score_tie_does_not() {
        let decisions = run(&[0.5, 0.5], &[0.7, 0.7]);
        assert_eq!(decisions, vec![(true, true), (true, false)]);
    }

    #[test]
    fn test_flags_are_not_carried_over() {
        let mut best = BestTracker::new();
        CheckpointSelector::evaluate(&snapshot(0, 1.0, 0.9), &mut best);
        assert!(best.loss_improved_this_epoch());
        CheckpointSelector::evaluate(&snapshot(1, 2.0, 0.1), &mut best);
        assert!(!best.loss_improved_this_epoch());
        assert!(!best.score_improved_this_epoch());
        assert!((best.best_loss() - 1.0).abs() < f64::EPSILON);
        assert!((best.best_score() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decision_objectives() {
        let both = CheckpointDecision::selecting(&Objective::ALL);
        assert_eq!(both.objectives().collect::<Vec<_>>(), Objective::ALL.to_vec());
        assert!(both.save_for_loss() && both.save_for_score());

        let score_only = CheckpointDecision::selecting(&[Objective::Score]);
        assert_eq!(score_only.objectives().collect::<Vec<_>>(), vec![Objective::Score]);
        assert!(!score_only.save_for_loss());
        assert!(score_only.is_progress());

        let none = CheckpointDecision::default();
        assert!(!none.is_progress());
        assert_eq!(none.objectives().count(), 0);
    }

    #[test]
    fn test_tracker_and_decision_agree_per_objective() {
        let mut best = BestTracker::new();
        CheckpointSelector::evaluate(&snapshot(0, 1.0, 0.8), &mut best);
        let decision = CheckpointSelector::evaluate(&snapshot(1, 0.7, 0.6), &mut best);

        for objective in Objective::ALL {
            assert_eq!(decision.saves(objective), best.improved(objective), "{objective}");
        }
        assert!((best.best(Objective::Loss) - 0.7).abs() < f64::EPSILON);
        assert!((best.best(Objective::Score) - 0.8).abs() < f64::EPSILON);
    }
}
