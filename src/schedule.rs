//! Validation cadence
//!
//! Validation is expensive, so it only fires on every Nth epoch (1-indexed).
//! With no frequency configured it fires every epoch.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// Decides whether the validation pass runs for a given 0-based epoch index.
///
/// ## Example
///
/// ```rust
/// use std::num::NonZeroU64;
/// use registro::schedule::should_run;
///
/// let every_second = NonZeroU64::new(2);
/// assert!(!should_run(0, every_second));
/// assert!(should_run(1, every_second));
/// assert!(should_run(0, None));
/// ```
#[must_use]
pub const fn should_run(epoch: u64, frequency: Option<NonZeroU64>) -> bool {
    match frequency {
        // (epoch + 1) % f == 0, without overflowing at u64::MAX.
        Some(freq) => epoch % freq.get() == freq.get() - 1,
        None => true,
    }
}

/// Stateless trigger wrapping a configured frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSchedule {
    frequency: Option<NonZeroU64>,
}

impl TriggerSchedule {
    /// Validate on every epoch.
    #[must_use]
    pub const fn every_epoch() -> Self {
        Self { frequency: None }
    }

    /// Validate on the Nth, 2Nth, 3Nth... epoch.
    #[must_use]
    pub const fn every(frequency: NonZeroU64) -> Self {
        Self {
            frequency: Some(frequency),
        }
    }

    /// Build from an optional frequency.
    #[must_use]
    pub const fn new(frequency: Option<NonZeroU64>) -> Self {
        Self { frequency }
    }

    /// Configured frequency, `None` meaning every epoch.
    #[must_use]
    pub const fn frequency(&self) -> Option<NonZeroU64> {
        self.frequency
    }

    /// Whether the validation pass should run for `epoch` (0-based).
    #[must_use]
    pub const fn should_run(&self, epoch: u64) -> bool {
        should_run(epoch, self.frequency)
    }
}
