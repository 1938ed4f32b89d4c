//! Scalar Record - one telemetry data point

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scalar Record represents a single emitted scalar.
///
/// Designed for time-series storage: `series` partitions the data, `step`
/// orders it, and `timestamp` correlates it with wall-clock time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalarRecord {
    series: String,
    step: u64,
    value: f64,
    timestamp: DateTime<Utc>,
}

impl ScalarRecord {
    /// Create a new scalar record stamped with the current time.
    ///
    /// # Arguments
    ///
    /// * `series` - Series name (e.g., "Loss/Validation")
    /// * `step` - 0-based epoch index
    /// * `value` - Scalar value
    #[must_use]
    pub fn new(series: impl Into<String>, step: u64, value: f64) -> Self {
        Self {
            series: series.into(),
            step,
            value,
            timestamp: Utc::now(),
        }
    }

    /// Get the series name.
    #[must_use]
    pub fn series(&self) -> &str {
        &self.series
    }

    /// Get the step.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Get the value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the emission timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
