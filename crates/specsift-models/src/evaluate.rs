//! Accuracy, confusion matrices, and plain-text classification reports.

use ndarray::Array2;

/// Fraction of predictions matching the truth; 0.0 for empty input.
pub fn accuracy(truth: &[usize], pred: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth
        .iter()
        .zip(pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    hits as f64 / truth.len() as f64
}

/// Confusion matrix with truth on rows and predictions on columns.
/// Out-of-range class indices are ignored.
pub fn confusion_matrix(truth: &[usize], pred: &[usize], n_classes: usize) -> Array2<u64> {
    let mut matrix = Array2::<u64>::zeros((n_classes, n_classes));
    for (&t, &p) in truth.iter().zip(pred.iter()) {
        if t < n_classes && p < n_classes {
            matrix[(t, p)] += 1;
        }
    }
    matrix
}

/// Text report with per-class precision/recall/F1/support, overall
/// accuracy, and the confusion matrix.
pub fn classification_report(truth: &[usize], pred: &[usize], class_names: &[String]) -> String {
    let n_classes = class_names.len();
    let matrix = confusion_matrix(truth, pred, n_classes);

    let name_width = class_names
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut out = String::new();
    out.push_str(&format!(
        "{:>name_width$}  precision  recall  f1-score  support\n",
        "class",
        name_width = name_width
    ));

    for (idx, name) in class_names.iter().enumerate() {
        let support: u64 = matrix.row(idx).sum();
        let predicted: u64 = matrix.column(idx).sum();
        let correct = matrix[(idx, idx)];

        let precision = ratio(correct, predicted);
        let recall = ratio(correct, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        out.push_str(&format!(
            "{:>name_width$}  {:>9.4}  {:>6.4}  {:>8.4}  {:>7}\n",
            name,
            precision,
            recall,
            f1,
            support,
            name_width = name_width
        ));
    }

    let acc = accuracy(truth, pred);
    out.push_str(&format!("\nAccuracy: {:.4}\n", acc));
    out.push_str("Confusion matrix (rows = truth):\n");
    for row in matrix.rows() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:>6}", v)).collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_matches() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn confusion_matrix_rows_are_truth() {
        let m = confusion_matrix(&[0, 0, 1, 1], &[0, 1, 1, 1], 2);
        assert_eq!(m[(0, 0)], 1);
        assert_eq!(m[(0, 1)], 1);
        assert_eq!(m[(1, 0)], 0);
        assert_eq!(m[(1, 1)], 2);
    }

    #[test]
    fn report_mentions_every_class_and_accuracy() {
        let names = vec!["hdpe".to_string(), "pvc".to_string()];
        let report = classification_report(&[0, 1, 1, 0], &[0, 1, 0, 0], &names);
        assert!(report.contains("hdpe"));
        assert!(report.contains("pvc"));
        assert!(report.contains("Accuracy: 0.7500"));
        assert!(report.contains("Confusion matrix"));
    }

    #[test]
    fn perfect_prediction_gives_unit_scores() {
        let names = vec!["a".to_string(), "b".to_string()];
        let report = classification_report(&[0, 1], &[0, 1], &names);
        assert!(report.contains("Accuracy: 1.0000"));
    }
}
