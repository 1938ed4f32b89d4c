//! Scalar Store - in-memory telemetry sink
//!
//! Keeps every emitted scalar so a run's curves can be inspected after the
//! fact (tests, notebooks, end-of-run reports).

use std::collections::BTreeSet;

use super::{ScalarRecord, ScalarSink};

/// In-memory store of emitted scalars.
///
/// `series` returns points ordered by step regardless of emission order.
#[derive(Debug, Default, Clone)]
pub struct ScalarStore {
    records: Vec<ScalarRecord>,
}

impl ScalarStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of recorded points across all series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Add a record.
    pub fn add(&mut self, record: ScalarRecord) {
        self.records.push(record);
    }

    /// Points of one series, sorted by step.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use registro::telemetry::{ScalarSink, ScalarStore};
    ///
    /// let mut store = ScalarStore::new();
    /// store.emit_scalar("Loss/Train", 0.5, 2);
    /// store.emit_scalar("Loss/Train", 0.9, 0);
    ///
    /// let curve = store.series("Loss/Train");
    /// assert_eq!(curve[0].step(), 0);
    /// assert_eq!(curve[1].step(), 2);
    /// ```
    #[must_use]
    pub fn series(&self, series: &str) -> Vec<ScalarRecord> {
        let mut points: Vec<ScalarRecord> = self
            .records
            .iter()
            .filter(|r| r.series() == series)
            .cloned()
            .collect();
        points.sort_by_key(ScalarRecord::step);
        points
    }

    /// Latest-step value of a series, if any.
    #[must_use]
    pub fn last_value(&self, series: &str) -> Option<f64> {
        self.records
            .iter()
            .filter(|r| r.series() == series)
            .max_by_key(|r| r.step())
            .map(ScalarRecord::value)
    }

    /// Distinct series names, sorted.
    #[must_use]
    pub fn series_names(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(ScalarRecord::series)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl ScalarSink for ScalarStore {
    fn emit_scalar(&mut self, series: &str, value: f64, step: u64) {
        self.add(ScalarRecord::new(series, step, value));
    }
}
