//! Evaluation metrics for binary predictions.
//!
//! Class 0 = non-adhesion, class 1 = adhesion.
use std::fmt;

const CLASS_NAMES: [&str; 2] = ["Non-adhesion", "Adhesion"];

/// Fraction of positions where `predictions` equals `labels`.
pub fn accuracy(labels: &[u8], predictions: &[u8]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = labels
        .iter()
        .zip(predictions)
        .filter(|(l, p)| l == p)
        .count();
    correct as f64 / labels.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_count: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn new(labels: &[u8], predictions: &[u8]) -> Self {
        let mut cm = Self::default();
        for (&label, &pred) in labels.iter().zip(predictions) {
            match (label > 0, pred > 0) {
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_count += 1,
                (true, true) => cm.tp += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_count + self.tp
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  TN: {:4}  FP: {:4}", self.tn, self.fp)?;
        write!(f, "  FN: {:4}  TP: {:4}", self.fn_count, self.tp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassMetrics {
    fn new(true_pos: usize, false_pos: usize, false_neg: usize) -> Self {
        let precision = ratio(true_pos, true_pos + false_pos);
        let recall = ratio(true_pos, true_pos + false_neg);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support: true_pos + false_neg,
        }
    }
}

/// Per-class precision, recall and F1 with accuracy and averages.
///
/// Undefined ratios (no predicted or no true samples of a class) are 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn new(labels: &[u8], predictions: &[u8]) -> Self {
        let cm = ConfusionMatrix::new(labels, predictions);
        let classes = [
            ClassMetrics::new(cm.tn, cm.fn_count, cm.fp),
            ClassMetrics::new(cm.tp, cm.fp, cm.fn_count),
        ];
        let total = cm.total();
        let average = |weight: &dyn Fn(&ClassMetrics) -> f64| {
            let norm: f64 = classes.iter().map(weight).sum();
            let mean = |field: fn(&ClassMetrics) -> f64| {
                if norm == 0.0 {
                    0.0
                } else {
                    classes.iter().map(|c| field(c) * weight(c)).sum::<f64>() / norm
                }
            };
            ClassMetrics {
                precision: mean(|c| c.precision),
                recall: mean(|c| c.recall),
                f1: mean(|c| c.f1),
                support: total,
            }
        };
        let macro_avg = average(&|_| 1.0);
        let weighted_avg = average(&|c| c.support as f64);
        Self {
            classes,
            accuracy: ratio(cm.tn + cm.tp, total),
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = "weighted avg".len();
        let row = |f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics| {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name,
                m.precision,
                m.recall,
                m.f1,
                m.support,
                width = width
            )
        };
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            width = width
        )?;
        writeln!(f)?;
        for (name, metrics) in CLASS_NAMES.iter().zip(&self.classes) {
            row(f, name, metrics)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.macro_avg.support,
            width = width
        )?;
        row(f, "macro avg", &self.macro_avg)?;
        row(f, "weighted avg", &self.weighted_avg)
    }
}

/// Area under the ROC curve, from the rank-sum of the positive scores.
///
/// Tied scores share their average rank. `None` when either class is absent.
pub fn roc_auc(labels: &[u8], scores: &[f32]) -> Option<f64> {
    let n_pos = labels.iter().filter(|&&l| l > 0).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 || labels.len() != scores.len() {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    let mut ranks = vec![0f64; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1..=end share their mean
        let rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }

    let pos_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(&l, _)| l > 0)
        .map(|(_, r)| r)
        .sum();
    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos * n_neg) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix() {
        let labels = [1, 1, 1, 0, 0, 0];
        let preds = [1, 0, 1, 0, 1, 0];
        let cm = ConfusionMatrix::new(&labels, &preds);
        assert_eq!((cm.tn, cm.fp, cm.fn_count, cm.tp), (2, 1, 1, 2));
        assert_eq!(cm.to_string(), "  TN:    2  FP:    1\n  FN:    1  TP:    2");
        assert!((accuracy(&labels, &preds) - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_report() {
        // 4 negatives all right, 4 positives with one missed
        let labels = [0, 0, 0, 0, 1, 1, 1, 1];
        let preds = [0, 0, 0, 0, 1, 1, 1, 0];
        let report = ClassificationReport::new(&labels, &preds);
        let [neg, pos] = report.classes;
        assert!((neg.precision - 0.8).abs() < 1e-12);
        assert_eq!(neg.recall, 1.0);
        assert_eq!(pos.precision, 1.0);
        assert_eq!(pos.recall, 0.75);
        assert_eq!((neg.support, pos.support), (4, 4));
        assert_eq!(report.accuracy, 0.875);
        assert!((report.macro_avg.precision - 0.9).abs() < 1e-12);
        assert_eq!(report.weighted_avg.support, 8);

        let text = report.to_string();
        assert!(text.contains("Non-adhesion       0.80      1.00      0.89         4"));
        assert!(text.contains("    Adhesion       1.00      0.75      0.86         4"));
        assert!(text.contains("    accuracy                           0.88         8"));
    }

    #[test]
    fn test_report_without_predictions_of_a_class() {
        let report = ClassificationReport::new(&[0, 1], &[0, 0]);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
    }

    #[test]
    fn test_roc_auc() {
        assert_eq!(roc_auc(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&[0, 0, 1, 1], &[0.9, 0.8, 0.2, 0.1]), Some(0.0));
        assert_eq!(roc_auc(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]), Some(0.75));
        // every score tied
        assert_eq!(roc_auc(&[0, 1, 0, 1], &[0.5; 4]), Some(0.5));
        assert_eq!(roc_auc(&[1, 1], &[0.2, 0.3]), None);
    }
}
