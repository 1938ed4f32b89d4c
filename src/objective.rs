//! Tracked objectives and their comparison policies
//!
//! Each objective is a tag carrying its own comparator, starting value,
//! snapshot field and checkpoint file stem. The comparators are deliberately
//! asymmetric:
//!
//! | Objective | Direction | Tie counts as improvement |
//! |-----------|-----------|---------------------------|
//! | Loss      | minimize  | yes (`candidate <= best`) |
//! | Score     | maximize  | no  (`candidate > best`)  |
//!
//! A plateaued loss keeps refreshing its checkpoint; a plateaued score does not.

use serde::{Deserialize, Serialize};

use crate::ledger::MetricSnapshot;

/// Loss-style comparison: lower is better, ties count as progress.
#[must_use]
pub fn improves_minimized(candidate: f64, best: f64) -> bool {
    candidate <= best
}

/// Score-style comparison: higher is better, ties are not progress.
#[must_use]
pub fn improves_maximized(candidate: f64, best: f64) -> bool {
    candidate > best
}

/// Comparison strategy for one objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// Lower is better, ties improve.
    Minimize,
    /// Higher is better, strict improvement only.
    Maximize,
}

impl Comparator {
    /// Whether `candidate` improves on `best` under this strategy.
    #[must_use]
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Self::Minimize => improves_minimized(candidate, best),
            Self::Maximize => improves_maximized(candidate, best),
        }
    }
}

/// An independently tracked objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Objective {
    /// Validation loss.
    Loss,
    /// Validation ranking score (ROC-AUC).
    Score,
}

impl Objective {
    /// Every tracked objective, in checkpoint-write order.
    pub const ALL: [Self; 2] = [Self::Loss, Self::Score];

    /// Number of tracked objectives.
    pub const COUNT: usize = Self::ALL.len();

    /// Position in [`Objective::ALL`], used to index per-objective state.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Comparison strategy.
    #[must_use]
    pub const fn comparator(self) -> Comparator {
        match self {
            Self::Loss => Comparator::Minimize,
            Self::Score => Comparator::Maximize,
        }
    }

    /// Running-best starting value: the worst value the metric can take.
    #[must_use]
    pub const fn initial_best(self) -> f64 {
        match self {
            Self::Loss => f64::INFINITY,
            Self::Score => 0.0,
        }
    }

    /// The snapshot field this objective tracks.
    #[must_use]
    pub const fn value(self, snapshot: &MetricSnapshot) -> f64 {
        match self {
            Self::Loss => snapshot.val_loss,
            Self::Score => snapshot.val_score,
        }
    }

    /// Checkpoint file stem under the run directory.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Loss => "weights_loss",
            Self::Score => "weights_roc",
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Loss => "loss",
            Self::Score => "score",
        }
    }

    /// Whether `candidate` improves on `best` for this objective.
    #[must_use]
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        self.comparator().improves(candidate, best)
    }
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_policy() {
        assert!(improves_minimized(5.0, 5.0));
        assert!(!improves_maximized(0.8, 0.8));
    }

    #[test]
    fn test_strict_directions() {
        assert!(improves_minimized(0.4, 0.5));
        assert!(!improves_minimized(0.6, 0.5));
        assert!(improves_maximized(0.9, 0.8));
        assert!(!improves_maximized(0.7, 0.8));
    }

    #[test]
    fn test_first_observation_beats_initial_loss() {
        let loss = Objective::Loss;
        assert!(loss.improves(1e12, loss.initial_best()));
    }

    #[test]
    fn test_zero_score_does_not_beat_initial_score() {
        let score = Objective::Score;
        assert!(!score.improves(0.0, score.initial_best()));
        assert!(score.improves(0.01, score.initial_best()));
    }

    #[test]
    fn test_nan_never_improves() {
        assert!(!Objective::Loss.improves(f64::NAN, f64::INFINITY));
        assert!(!Objective::Score.improves(f64::NAN, 0.0));
    }

    #[test]
    fn test_index_matches_position_in_all() {
        for (position, objective) in Objective::ALL.into_iter().enumerate() {
            assert_eq!(objective.index(), position);
        }
        assert_eq!(Objective::COUNT, 2);
    }

    #[test]
    fn test_file_stems_are_distinct() {
        assert_eq!(Objective::Loss.file_stem(), "weights_loss");
        assert_eq!(Objective::Score.file_stem(), "weights_roc");
    }
}
