//! Reference loss functions

use super::{require_rows, Metric, Outputs};
use crate::{Error, Result};

/// Softmax cross-entropy of logit rows against target distributions.
///
/// Per row: `-sum_k t_k * log_softmax(z)_k`, averaged over rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropy;

impl Metric for CrossEntropy {
    fn name(&self) -> &str {
        "cross_entropy"
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, outputs: &Outputs) -> Result<f64> {
        require_rows(self.name(), outputs)?;

        let mut total = 0.0;
        for (logits, target) in outputs.rows() {
            let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if !max.is_finite() {
                return Err(Error::metric(self.name(), "non-finite logits"));
            }
            let log_sum_exp = max + logits.iter().map(|z| (z - max).exp()).sum::<f64>().ln();
            total -= logits
                .iter()
                .zip(target)
                .map(|(z, t)| t * (z - log_sum_exp))
                .sum::<f64>();
        }
        Ok(total / outputs.len() as f64)
    }
}

/// Mean of squared differences over every value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaredError;

impl Metric for MeanSquaredError {
    fn name(&self) -> &str {
        "mean_squared_error"
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, outputs: &Outputs) -> Result<f64> {
        require_rows(self.name(), outputs)?;
        let sum: f64 = outputs
            .predictions()
            .iter()
            .zip(outputs.targets())
            .map(|(p, t)| (p - t).powi(2))
            .sum();
        Ok(sum / outputs.predictions().len() as f64)
    }
}
