//! Accuracy metrics and the confusion matrix

use cloudclass_core::{Error, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counts of (true label, predicted label) pairs over a fixed label set.
///
/// Rows are true labels, columns are predictions, both in label order.
/// Every class of the label set gets a row and column even when it never
/// occurs in the data. Rendering is an external collaborator's job; the raw
/// counts are exposed through [`ConfusionMatrix::matrix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Array2<usize>,
}

impl ConfusionMatrix {
    /// Build from aligned truth/prediction sequences over labels `0..n_classes`
    pub fn from_labels(
        y_true: &Array1<usize>,
        y_pred: &Array1<usize>,
        n_classes: usize,
    ) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(Error::InvalidInput(format!(
                "{} true labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        let mut counts = Array2::zeros((n_classes, n_classes));
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            if t >= n_classes || p >= n_classes {
                return Err(Error::InvalidInput(format!(
                    "label {} outside the fixed label set 0..{}",
                    t.max(p),
                    n_classes
                )));
            }
            counts[[t, p]] += 1;
        }
        Ok(Self { counts })
    }

    pub fn n_classes(&self) -> usize {
        self.counts.nrows()
    }

    /// Number of samples with true label `t` predicted as `p`
    pub fn count(&self, t: usize, p: usize) -> usize {
        self.counts[[t, p]]
    }

    /// Per-class true-label totals
    pub fn row_sums(&self) -> Vec<usize> {
        self.counts
            .rows()
            .into_iter()
            .map(|row| row.sum())
            .collect()
    }

    /// Total number of counted samples
    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    /// Raw counts, rows = true labels, columns = predictions
    pub fn matrix(&self) -> &Array2<usize> {
        &self.counts
    }
}

/// Fraction of exact matches between truth and prediction
pub fn overall_accuracy(y_true: &Array1<usize>, y_pred: &Array1<usize>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(Error::InvalidInput(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(Error::InvalidInput(
            "cannot score an empty label vector".to_string(),
        ));
    }
    let matches = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(matches as f64 / y_true.len() as f64)
}

/// Unweighted mean of per-class recall, over the classes that actually
/// appear in the truth vector.
///
/// Corrects for class-size imbalance; the computation never assumes the
/// classes are equally sized.
pub fn balanced_accuracy(
    y_true: &Array1<usize>,
    y_pred: &Array1<usize>,
    n_classes: usize,
) -> Result<f64> {
    if y_true.is_empty() {
        return Err(Error::InvalidInput(
            "cannot score an empty label vector".to_string(),
        ));
    }
    let confusion = ConfusionMatrix::from_labels(y_true, y_pred, n_classes)?;

    let mut recall_sum = 0.0;
    let mut present = 0usize;
    for class in 0..n_classes {
        let truths: usize = (0..n_classes).map(|p| confusion.count(class, p)).sum();
        if truths > 0 {
            recall_sum += confusion.count(class, class) as f64 / truths as f64;
            present += 1;
        }
    }
    Ok(recall_sum / present as f64)
}

/// Metrics bundle for one prediction run
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub overall_accuracy: f64,
    pub balanced_accuracy: f64,
    pub confusion: ConfusionMatrix,
}

/// Overall accuracy, balanced accuracy and the confusion matrix in one call
pub fn evaluate(
    y_true: &Array1<usize>,
    y_pred: &Array1<usize>,
    n_classes: usize,
) -> Result<Evaluation> {
    Ok(Evaluation {
        overall_accuracy: overall_accuracy(y_true, y_pred)?,
        balanced_accuracy: balanced_accuracy(y_true, y_pred, n_classes)?,
        confusion: ConfusionMatrix::from_labels(y_true, y_pred, n_classes)?,
    })
}

/// Scoring metric identifier used by model selection
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Scoring {
    Accuracy,
    BalancedAccuracy,
}

impl Scoring {
    /// Score predictions against truth; `n_classes` fixes the label set for
    /// balanced accuracy.
    pub fn score(
        self,
        y_true: &Array1<usize>,
        y_pred: &Array1<usize>,
        n_classes: usize,
    ) -> Result<f64> {
        match self {
            Scoring::Accuracy => overall_accuracy(y_true, y_pred),
            Scoring::BalancedAccuracy => balanced_accuracy(y_true, y_pred, n_classes),
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scoring::Accuracy => f.write_str("accuracy"),
            Scoring::BalancedAccuracy => f.write_str("balanced_accuracy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_confusion_matrix_shape_and_sums() {
        let y_true = array![0, 0, 1, 2, 3, 4, 4];
        let y_pred = array![0, 1, 1, 2, 3, 4, 0];
        let confusion = ConfusionMatrix::from_labels(&y_true, &y_pred, 5).unwrap();

        assert_eq!(confusion.n_classes(), 5);
        assert_eq!(confusion.total(), 7);
        // row sums mirror the true-label counts
        assert_eq!(confusion.row_sums(), vec![2, 1, 1, 1, 2]);
        assert_eq!(confusion.count(0, 1), 1);
        assert_eq!(confusion.count(4, 0), 1);
    }

    #[test]
    fn test_absent_class_keeps_its_row() {
        let y_true = array![0, 0, 1];
        let y_pred = array![0, 0, 1];
        let confusion = ConfusionMatrix::from_labels(&y_true, &y_pred, 5).unwrap();
        assert_eq!(confusion.n_classes(), 5);
        assert_eq!(confusion.row_sums(), vec![2, 1, 0, 0, 0]);
    }

    #[test]
    fn test_overall_accuracy() {
        let y_true = array![0, 1, 2, 3];
        let y_pred = array![0, 1, 0, 3];
        assert_relative_eq!(overall_accuracy(&y_true, &y_pred).unwrap(), 0.75);
    }

    #[test]
    fn test_balanced_accuracy_weights_classes_equally() {
        // class 0: 4 samples, 2 correct; class 1: 1 sample, 1 correct
        let y_true = array![0, 0, 0, 0, 1];
        let y_pred = array![0, 0, 1, 1, 1];
        assert_relative_eq!(overall_accuracy(&y_true, &y_pred).unwrap(), 0.6);
        assert_relative_eq!(
            balanced_accuracy(&y_true, &y_pred, 2).unwrap(),
            0.75
        );
    }

    #[test]
    fn test_balanced_accuracy_skips_absent_classes() {
        let y_true = array![0, 0, 1, 1];
        let y_pred = array![0, 0, 1, 0];
        assert_relative_eq!(
            balanced_accuracy(&y_true, &y_pred, 5).unwrap(),
            0.75
        );
    }

    #[test]
    fn test_perfect_predictions() {
        let y = array![0, 1, 2, 3, 4];
        let result = evaluate(&y, &y, 5).unwrap();
        assert_relative_eq!(result.overall_accuracy, 1.0);
        assert_relative_eq!(result.balanced_accuracy, 1.0);
        assert_eq!(result.confusion.total(), 5);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let y_true = array![0, 1];
        let y_pred = array![0];
        assert!(overall_accuracy(&y_true, &y_pred).is_err());
        assert!(ConfusionMatrix::from_labels(&y_true, &y_pred, 2).is_err());
    }

    #[test]
    fn test_out_of_range_label_rejected() {
        let y_true = array![0, 7];
        let y_pred = array![0, 1];
        assert!(matches!(
            ConfusionMatrix::from_labels(&y_true, &y_pred, 5),
            Err(Error::InvalidInput(_))
        ));
    }
}
