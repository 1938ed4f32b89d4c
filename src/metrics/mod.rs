//! Loss and metric collaborators
//!
//! The orchestrator does not own any metric formula. It accumulates the
//! predictions and targets of a validated epoch into [`Outputs`] and hands
//! them to the [`Metric`] implementations of a [`MetricSuite`]:
//!
//! - loss: `(predictions, targets) -> scalar >= 0`
//! - accuracy and score: `(predictions, targets) -> scalar in [0, 1]`
//!
//! Reference implementations are provided for classification: [`CrossEntropy`],
//! [`MeanSquaredError`], [`Accuracy`] and [`RocAuc`]. Failures propagate as
//! [`Error::MetricComputation`](crate::Error::MetricComputation); no default
//! value is ever substituted.

mod classification;
mod loss;

pub use classification::{Accuracy, RocAuc};
pub use loss::{CrossEntropy, MeanSquaredError};

use crate::{Error, Result};

/// Row-major predictions and targets for one split, `width` values per row.
///
/// Rows are accumulated batch by batch during an epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Outputs {
    width: usize,
    predictions: Vec<f64>,
    targets: Vec<f64>,
}

impl Outputs {
    /// Empty accumulator for rows of `width` values (e.g. number of classes).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `width` is zero.
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidInput("output width must be positive".to_string()));
        }
        Ok(Self {
            width,
            predictions: Vec::new(),
            targets: Vec::new(),
        })
    }

    /// Build directly from flat row-major buffers.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Outputs::push_batch`].
    pub fn from_rows(width: usize, predictions: Vec<f64>, targets: Vec<f64>) -> Result<Self> {
        let mut outputs = Self::new(width)?;
        outputs.push_batch(&predictions, &targets)?;
        Ok(outputs)
    }

    /// Append one batch of rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the buffers differ in length or are
    /// not a whole number of rows.
    pub fn push_batch(&mut self, predictions: &[f64], targets: &[f64]) -> Result<()> {
        if predictions.len() != targets.len() {
            return Err(Error::InvalidInput(format!(
                "predictions ({}) and targets ({}) differ in length",
                predictions.len(),
                targets.len()
            )));
        }
        if predictions.len() % self.width != 0 {
            return Err(Error::InvalidInput(format!(
                "batch of {} values is not a multiple of width {}",
                predictions.len(),
                self.width
            )));
        }
        self.predictions.extend_from_slice(predictions);
        self.targets.extend_from_slice(targets);
        Ok(())
    }

    /// Values per row.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows accumulated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predictions.len() / self.width
    }

    /// Whether no rows have been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Flat predictions.
    #[must_use]
    pub fn predictions(&self) -> &[f64] {
        &self.predictions
    }

    /// Flat targets.
    #[must_use]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// `(prediction_row, target_row)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = (&[f64], &[f64])> {
        self.predictions
            .chunks_exact(self.width)
            .zip(self.targets.chunks_exact(self.width))
    }

    /// Drop all rows, keeping the width.
    pub fn clear(&mut self) {
        self.predictions.clear();
        self.targets.clear();
    }
}

/// Train and validation outputs for one triggered epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationBundle {
    /// Outputs collected during the training pass.
    pub train: Outputs,
    /// Outputs collected during the validation pass.
    pub val: Outputs,
}

impl ValidationBundle {
    /// Empty bundle for rows of `width` values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `width` is zero.
    pub fn new(width: usize) -> Result<Self> {
        Ok(Self {
            train: Outputs::new(width)?,
            val: Outputs::new(width)?,
        })
    }

    /// Drop all rows of both splits.
    pub fn clear(&mut self) {
        self.train.clear();
        self.val.clear();
    }
}

/// A `(predictions, targets) -> scalar` collaborator.
pub trait Metric {
    /// Name used in errors and logs.
    fn name(&self) -> &str;

    /// Compute the metric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MetricComputation`] when the value is undefined for
    /// these outputs (e.g. no rows, or a single-class batch for ROC-AUC).
    fn compute(&self, outputs: &Outputs) -> Result<f64>;
}

impl<M: Metric + ?Sized> Metric for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn compute(&self, outputs: &Outputs) -> Result<f64> {
        (**self).compute(outputs)
    }
}

/// Adapter turning a closure into a [`Metric`].
pub struct FnMetric<F> {
    name: String,
    f: F,
}

impl<F> FnMetric<F>
where
    F: Fn(&Outputs) -> Result<f64>,
{
    /// Wrap `f` under `name`.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Metric for FnMetric<F>
where
    F: Fn(&Outputs) -> Result<f64>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, outputs: &Outputs) -> Result<f64> {
        (self.f)(outputs)
    }
}

impl<F> std::fmt::Debug for FnMetric<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMetric").field("name", &self.name).finish_non_exhaustive()
    }
}

/// The three collaborators a validation pass needs.
pub struct MetricSuite {
    loss: Box<dyn Metric>,
    accuracy: Box<dyn Metric>,
    score: Box<dyn Metric>,
}

impl MetricSuite {
    /// Suite from explicit collaborators.
    pub fn new(
        loss: impl Metric + 'static,
        accuracy: impl Metric + 'static,
        score: impl Metric + 'static,
    ) -> Self {
        Self {
            loss: Box::new(loss),
            accuracy: Box::new(accuracy),
            score: Box::new(score),
        }
    }

    /// Softmax cross-entropy, argmax accuracy and macro ROC-AUC.
    #[must_use]
    pub fn classification() -> Self {
        Self::new(CrossEntropy, Accuracy, RocAuc)
    }

    /// Loss collaborator.
    #[must_use]
    pub fn loss(&self) -> &dyn Metric {
        self.loss.as_ref()
    }

    /// Accuracy collaborator.
    #[must_use]
    pub fn accuracy(&self) -> &dyn Metric {
        self.accuracy.as_ref()
    }

    /// Secondary ranking-score collaborator.
    #[must_use]
    pub fn score(&self) -> &dyn Metric {
        self.score.as_ref()
    }
}

impl Default for MetricSuite {
    fn default() -> Self {
        Self::classification()
    }
}

impl std::fmt::Debug for MetricSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricSuite")
            .field("loss", &self.loss.name())
            .field("accuracy", &self.accuracy.name())
            .field("score", &self.score.name())
            .finish()
    }
}

/// Index of the largest value; the first one wins on ties.
pub(crate) fn argmax(row: &[f64]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
            if v > best_v {
                (i, v)
            } else {
                (best_i, best_v)
            }
        })
        .0
}

/// Fail on empty outputs with the metric's name.
pub(crate) fn require_rows(metric: &str, outputs: &Outputs) -> Result<()> {
    if outputs.is_empty() {
        return Err(Error::metric(metric, "no rows to evaluate"));
    }
    Ok(())
}
