//! Binary classification metrics

use serde::Serialize;

/// Area under the ROC curve via the rank-sum statistic
///
/// Tied scores receive their average rank. Returns NaN when only one class is
/// present.
pub fn roc_auc(y_true: &[f64], scores: &[f64]) -> f64 {
    let n_pos = y_true.iter().filter(|&&y| y == 1.0).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; the tie group spans i..=j
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if y_true[idx] == 1.0 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    (rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64)
}

/// Points of the ROC curve, one per distinct threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// ROC curve starting at (0, 0) with an infinite threshold
pub fn roc_curve(y_true: &[f64], scores: &[f64]) -> RocCurve {
    let n_pos = y_true.iter().filter(|&&y| y == 1.0).count() as f64;
    let n_neg = y_true.len() as f64 - n_pos;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut curve = RocCurve {
        fpr: vec![0.0],
        tpr: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };

    let mut tp = 0.0;
    let mut fp = 0.0;
    for (k, &idx) in order.iter().enumerate() {
        if y_true[idx] == 1.0 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_group = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if last_of_group {
            curve.fpr.push(if n_neg > 0.0 { fp / n_neg } else { 0.0 });
            curve.tpr.push(if n_pos > 0.0 { tp / n_pos } else { 0.0 });
            curve.thresholds.push(scores[idx]);
        }
    }

    curve
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[f64], y_pred: &[f64]) -> Self {
        let mut cm = Self {
            true_negative: 0,
            false_positive: 0,
            false_negative: 0,
            true_positive: 0,
        };
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == 1.0, p == 1.0) {
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_positive += 1,
                (true, false) => cm.false_negative += 1,
                (true, true) => cm.true_positive += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        ratio(
            (self.true_negative + self.true_positive) as f64,
            self.total() as f64,
        )
    }
}

/// Precision, recall and F1 of one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn new(tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = ratio(tp as f64, (tp + fp) as f64);
        let recall = ratio(tp as f64, (tp + fn_) as f64);
        Self {
            precision,
            recall,
            f1: ratio(2.0 * precision * recall, precision + recall),
            support: tp + fn_,
        }
    }
}

/// Zero when the denominator is zero
fn ratio(num: f64, denom: f64) -> f64 {
    if denom == 0.0 {
        0.0
    } else {
        num / denom
    }
}

/// Per-class metrics plus accuracy and macro/weighted averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub negative: ClassMetrics,
    pub positive: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let negative = ClassMetrics::new(cm.true_negative, cm.false_negative, cm.false_positive);
        let positive = ClassMetrics::new(cm.true_positive, cm.false_positive, cm.false_negative);
        let support = negative.support + positive.support;

        let average = |weight_neg: f64, weight_pos: f64| ClassMetrics {
            precision: weight_neg * negative.precision + weight_pos * positive.precision,
            recall: weight_neg * negative.recall + weight_pos * positive.recall,
            f1: weight_neg * negative.f1 + weight_pos * positive.f1,
            support,
        };

        let w_neg = ratio(negative.support as f64, support as f64);
        let w_pos = ratio(positive.support as f64, support as f64);

        Self {
            negative,
            positive,
            accuracy: cm.accuracy(),
            macro_avg: average(0.5, 0.5),
            weighted_avg: average(w_neg, w_pos),
        }
    }
}

/// Reliability diagram data over uniform probability bins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationCurve {
    /// Observed positive fraction per non-empty bin
    pub prob_true: Vec<f64>,
    /// Mean predicted probability per non-empty bin
    pub prob_pred: Vec<f64>,
}

/// Bin predictions into `n_bins` equal-width bins over [0, 1]; empty bins
/// are omitted
pub fn calibration_curve(y_true: &[f64], proba: &[f64], n_bins: usize) -> CalibrationCurve {
    let n_bins = n_bins.max(1);
    let mut sum_true = vec![0.0; n_bins];
    let mut sum_pred = vec![0.0; n_bins];
    let mut counts = vec![0usize; n_bins];

    for (&y, &p) in y_true.iter().zip(proba.iter()) {
        let bin = ((p * n_bins as f64) as usize).min(n_bins - 1);
        sum_true[bin] += y;
        sum_pred[bin] += p;
        counts[bin] += 1;
    }

    let mut curve = CalibrationCurve {
        prob_true: Vec::new(),
        prob_pred: Vec::new(),
    };
    for b in 0..n_bins {
        if counts[b] > 0 {
            curve.prob_true.push(sum_true[b] / counts[b] as f64);
            curve.prob_pred.push(sum_pred[b] / counts[b] as f64);
        }
    }
    curve
}

/// Mean and population standard deviation of fold scores
pub fn mean_std(scores: &[f64]) -> (f64, f64) {
    if scores.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auc_perfect_and_reversed() {
        let y = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(roc_auc(&y, &[0.1, 0.2, 0.8, 0.9]), 1.0);
        assert_eq!(roc_auc(&y, &[0.9, 0.8, 0.2, 0.1]), 0.0);
    }

    #[test]
    fn test_auc_ties_count_half() {
        let y = [0.0, 1.0];
        assert_eq!(roc_auc(&y, &[0.5, 0.5]), 0.5);

        // one of four pairs tied, three correctly ordered
        let y = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(roc_auc(&y, &[0.1, 0.5, 0.5, 0.9]), 0.875);
    }

    #[test]
    fn test_auc_single_class_is_nan() {
        assert!(roc_auc(&[1.0, 1.0], &[0.2, 0.4]).is_nan());
    }

    #[test]
    fn test_roc_curve_endpoints() {
        let y = [0.0, 1.0, 0.0, 1.0];
        let curve = roc_curve(&y, &[0.1, 0.4, 0.35, 0.8]);
        assert_eq!(curve.fpr[0], 0.0);
        assert_eq!(curve.tpr[0], 0.0);
        assert_eq!(*curve.fpr.last().unwrap(), 1.0);
        assert_eq!(*curve.tpr.last().unwrap(), 1.0);
        assert_eq!(curve.fpr.len(), 5);
        assert!(curve.thresholds[0].is_infinite());
    }

    #[test]
    fn test_confusion_and_report() {
        let y_true = [0.0, 0.0, 0.0, 1.0, 1.0];
        let y_pred = [0.0, 0.0, 1.0, 1.0, 0.0];
        let cm = ConfusionMatrix::from_predictions(&y_true, &y_pred);
        assert_eq!(cm.true_negative, 2);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.false_negative, 1);
        assert_eq!(cm.true_positive, 1);
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);

        let report = ClassificationReport::from_confusion(&cm);
        assert!((report.positive.precision - 0.5).abs() < 1e-12);
        assert!((report.positive.recall - 0.5).abs() < 1e-12);
        assert!((report.negative.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.negative.support, 3);
        assert_eq!(report.weighted_avg.support, 5);
        let expected_macro = (report.negative.f1 + report.positive.f1) / 2.0;
        assert!((report.macro_avg.f1 - expected_macro).abs() < 1e-12);
    }

    #[test]
    fn test_report_handles_no_positive_predictions() {
        let cm = ConfusionMatrix::from_predictions(&[0.0, 1.0], &[0.0, 0.0]);
        let report = ClassificationReport::from_confusion(&cm);
        assert_eq!(report.positive.precision, 0.0);
        assert_eq!(report.positive.f1, 0.0);
    }

    #[test]
    fn test_calibration_curve_skips_empty_bins() {
        let y = [0.0, 1.0, 1.0, 1.0];
        let p = [0.05, 0.15, 0.95, 1.0];
        let curve = calibration_curve(&y, &p, 10);
        assert_eq!(curve.prob_true, vec![0.0, 1.0, 1.0]);
        assert_eq!(curve.prob_pred.len(), 3);
        assert!((curve.prob_pred[2] - 0.975).abs() < 1e-12);
    }

    #[test]
    fn test_mean_std() {
        let (m, s) = mean_std(&[0.8, 0.9, 1.0]);
        assert!((m - 0.9).abs() < 1e-12);
        assert!((s - (0.02f64 / 3.0).sqrt()).abs() < 1e-12);
    }
}
