//! Classification metrics: argmax accuracy and macro ROC-AUC

use super::{argmax, require_rows, Metric, Outputs};
use crate::{Error, Result};

/// Fraction of rows whose predicted argmax matches the target argmax.
///
/// Targets are one-hot (or soft) label rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accuracy;

impl Metric for Accuracy {
    fn name(&self) -> &str {
        "accuracy"
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, outputs: &Outputs) -> Result<f64> {
        require_rows(self.name(), outputs)?;
        let correct = outputs
            .rows()
            .filter(|(prediction, target)| argmax(prediction) == argmax(target))
            .count();
        Ok(correct as f64 / outputs.len() as f64)
    }
}

/// Macro-averaged one-vs-rest ROC-AUC.
///
/// A column is positive for a row when its target is `>= 0.5`. Columns with
/// no positives or no negatives are skipped; if every column is skipped the
/// score is undefined and computation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RocAuc;

impl Metric for RocAuc {
    fn name(&self) -> &str {
        "roc_auc"
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, outputs: &Outputs) -> Result<f64> {
        require_rows(self.name(), outputs)?;
        if outputs.predictions().iter().any(|v| !v.is_finite()) {
            return Err(Error::metric(self.name(), "non-finite prediction"));
        }

        let per_class: Vec<f64> = (0..outputs.width())
            .filter_map(|column| {
                let (scores, labels): (Vec<f64>, Vec<bool>) = outputs
                    .rows()
                    .map(|(prediction, target)| (prediction[column], target[column] >= 0.5))
                    .unzip();
                binary_auc(&scores, &labels)
            })
            .collect();

        if per_class.is_empty() {
            return Err(Error::metric(
                self.name(),
                "only one class present in targets; ROC-AUC is undefined",
            ));
        }
        Ok(per_class.iter().sum::<f64>() / per_class.len() as f64)
    }
}

/// Mann-Whitney AUC with average ranks for tied scores.
///
/// `None` when either class is absent.
#[allow(clippy::cast_precision_loss)]
fn binary_auc(scores: &[f64], labels: &[bool]) -> Option<f64> {
    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1 ..= end share their mean.
        let rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = order[start..end].iter().filter(|&&i| labels[i]).count();
        positive_rank_sum += rank * tied_positives as f64;
        start = end;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(width: usize, predictions: &[f64], targets: &[f64]) -> Outputs {
        Outputs::from_rows(width, predictions.to_vec(), targets.to_vec()).unwrap()
    }

    #[test]
    fn test_accuracy_argmax() {
        let o = outputs(
            2,
            &[0.9, 0.1, 0.2, 0.8, 0.6, 0.4, 0.3, 0.7],
            &[1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
        );
        assert!((Accuracy.compute(&o).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_empty_fails() {
        let o = Outputs::new(2).unwrap();
        assert!(matches!(
            Accuracy.compute(&o),
            Err(Error::MetricComputation { .. })
        ));
    }

    #[test]
    fn test_auc_perfect_and_inverted() {
        let perfect = outputs(1, &[0.1, 0.2, 0.8, 0.9], &[0.0, 0.0, 1.0, 1.0]);
        assert!((RocAuc.compute(&perfect).unwrap() - 1.0).abs() < 1e-12);

        let inverted = outputs(1, &[0.9, 0.8, 0.2, 0.1], &[0.0, 0.0, 1.0, 1.0]);
        assert!(RocAuc.compute(&inverted).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_auc_ties_count_half() {
        let tied = outputs(1, &[0.5, 0.5], &[0.0, 1.0]);
        assert!((RocAuc.compute(&tied).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_auc_known_value() {
        // Pairs (pos, neg): (0.35 vs 0.1) win, (0.35 vs 0.4) lose,
        // (0.8 vs 0.1) win, (0.8 vs 0.4) win -> 3/4.
        let o = outputs(1, &[0.1, 0.4, 0.35, 0.8], &[0.0, 0.0, 1.0, 1.0]);
        assert!((RocAuc.compute(&o).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_auc_macro_average_over_classes() {
        // Class 0 perfectly ranked (1.0), class 1 inverted (0.0).
        let o = outputs(
            2,
            &[0.9, 0.9, 0.1, 0.1],
            &[1.0, 0.0, 0.0, 1.0],
        );
        assert!((RocAuc.compute(&o).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class_batch_fails() {
        let o = outputs(2, &[0.9, 0.1, 0.7, 0.3], &[1.0, 1.0, 1.0, 1.0]);
        let err = RocAuc.compute(&o).unwrap_err();
        assert!(matches!(err, Error::MetricComputation { ref metric, .. } if metric == "roc_auc"));
    }

    #[test]
    fn test_auc_rejects_nan() {
        let o = outputs(1, &[f64::NAN, 0.2], &[0.0, 1.0]);
        assert!(RocAuc.compute(&o).is_err());
    }
}
