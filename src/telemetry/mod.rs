//! Scalar telemetry
//!
//! Each validated epoch emits one scalar per metric per split to a
//! [`ScalarSink`]. Emission is fire-and-forget: sinks cannot fail the run.
//!
//! ## Series
//!
//! ```text
//! Loss/Train        Loss/Validation
//! Accuracy/Train    Accuracy/Validation
//! ROC/Train         ROC/Validation
//! ```
//!
//! The step is the 0-based epoch index.

mod record;
mod store;

pub use record::ScalarRecord;
pub use store::ScalarStore;

use crate::ledger::MetricSnapshot;

/// Training loss series.
pub const LOSS_TRAIN: &str = "Loss/Train";
/// Validation loss series.
pub const LOSS_VALIDATION: &str = "Loss/Validation";
/// Training accuracy series.
pub const ACCURACY_TRAIN: &str = "Accuracy/Train";
/// Validation accuracy series.
pub const ACCURACY_VALIDATION: &str = "Accuracy/Validation";
/// Training score series.
pub const SCORE_TRAIN: &str = "ROC/Train";
/// Validation score series.
pub const SCORE_VALIDATION: &str = "ROC/Validation";

/// Destination for scalar time series (a dashboard writer, a log, memory).
pub trait ScalarSink {
    /// Record `value` for `series` at `step`.
    fn emit_scalar(&mut self, series: &str, value: f64, step: u64);
}

impl<S: ScalarSink + ?Sized> ScalarSink for &mut S {
    fn emit_scalar(&mut self, series: &str, value: f64, step: u64) {
        (**self).emit_scalar(series, value, step);
    }
}

impl<S: ScalarSink + ?Sized> ScalarSink for Box<S> {
    fn emit_scalar(&mut self, series: &str, value: f64, step: u64) {
        (**self).emit_scalar(series, value, step);
    }
}

/// Discards everything (no telemetry configured).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ScalarSink for NullSink {
    fn emit_scalar(&mut self, _series: &str, _value: f64, _step: u64) {}
}

/// Forwards every scalar to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ScalarSink for LogSink {
    fn emit_scalar(&mut self, series: &str, value: f64, step: u64) {
        tracing::info!(target: "registro::telemetry", series, value, step, "scalar");
    }
}

/// Emit the six per-split scalars of `snapshot` at its epoch.
pub fn emit_snapshot<S: ScalarSink + ?Sized>(sink: &mut S, snapshot: &MetricSnapshot) {
    let step = snapshot.epoch;
    sink.emit_scalar(LOSS_TRAIN, snapshot.train_loss, step);
    sink.emit_scalar(LOSS_VALIDATION, snapshot.val_loss, step);
    sink.emit_scalar(ACCURACY_TRAIN, snapshot.train_accuracy, step);
    sink.emit_scalar(ACCURACY_VALIDATION, snapshot.val_accuracy, step);
    sink.emit_scalar(SCORE_TRAIN, snapshot.train_score, step);
    sink.emit_scalar(SCORE_VALIDATION, snapshot.val_score, step);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_snapshot_writes_six_series() {
        let mut store = ScalarStore::new();
        let snapshot = MetricSnapshot {
            epoch: 7,
            val_loss: 0.4,
            train_loss: 0.3,
            val_accuracy: 0.8,
            train_accuracy: 0.85,
            val_score: 0.9,
            train_score: 0.92,
        };

        emit_snapshot(&mut store, &snapshot);

        assert_eq!(store.len(), 6);
        assert_eq!(store.series_names().len(), 6);
        let val_roc = store.series(SCORE_VALIDATION);
        assert_eq!(val_roc.len(), 1);
        assert_eq!(val_roc[0].step(), 7);
        assert!((val_roc[0].value() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sinks_through_indirection() {
        fn emit_one<S: ScalarSink>(mut sink: S) {
            sink.emit_scalar("a", 1.0, 0);
        }

        let mut store = ScalarStore::new();
        emit_one(&mut store);
        emit_one(Box::new(NullSink) as Box<dyn ScalarSink>);
        emit_one(LogSink);
        assert_eq!(store.len(), 1);
    }
}
