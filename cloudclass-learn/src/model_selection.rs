//! Train/test splitting, cross-validation folds, and learning curves

use crate::classifier::{Classifier, FittedClassifier};
use crate::evaluate::overall_accuracy;
use cloudclass_core::{Error, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use rayon::prelude::*;

pub(crate) fn take_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    x.select(Axis(0), indices)
}

pub(crate) fn take_labels(y: &Array1<usize>, indices: &[usize]) -> Array1<usize> {
    Array1::from_iter(indices.iter().map(|&i| y[i]))
}

/// Train/test partition of a feature matrix and its labels
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub y_train: Array1<usize>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<usize>,
}

/// Shuffle the rows with a fixed seed and keep the first `train_ratio`
/// fraction as training data.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<usize>,
    train_ratio: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if x.nrows() != y.len() {
        return Err(Error::InvalidInput(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(Error::InvalidInput(format!(
            "train ratio must lie in (0, 1), got {}",
            train_ratio
        )));
    }

    let n = x.nrows();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let n_train = ((n as f64) * train_ratio).round() as usize;
    if n_train == 0 || n_train == n {
        return Err(Error::InvalidInput(format!(
            "train ratio {} leaves an empty partition for {} samples",
            train_ratio, n
        )));
    }

    let (train_idx, test_idx) = indices.split_at(n_train);
    Ok(TrainTestSplit {
        x_train: take_rows(x, train_idx),
        y_train: take_labels(y, train_idx),
        x_test: take_rows(x, test_idx),
        y_test: take_labels(y, test_idx),
    })
}

/// Deterministic stratified k-fold.
///
/// Each class's samples are dealt round-robin across the folds in input
/// order, so every fold carries every class even when the labels arrive in
/// contiguous blocks.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    pub n_folds: usize,
}

impl StratifiedKFold {
    pub fn new(n_folds: usize) -> Self {
        Self { n_folds }
    }

    /// (train, test) index pairs, one per fold
    pub fn split(
        &self,
        y: &Array1<usize>,
        n_classes: usize,
    ) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_folds < 2 {
            return Err(Error::InvalidInput(
                "cross-validation needs at least 2 folds".to_string(),
            ));
        }
        if y.len() < self.n_folds {
            return Err(Error::InvalidInput(format!(
                "{} folds requested for {} samples",
                self.n_folds,
                y.len()
            )));
        }

        let mut fold_of = vec![0usize; y.len()];
        let mut seen = vec![0usize; n_classes];
        for (i, &label) in y.iter().enumerate() {
            if label >= n_classes {
                return Err(Error::InvalidInput(format!(
                    "label {} outside the fixed label set 0..{}",
                    label, n_classes
                )));
            }
            fold_of[i] = seen[label] % self.n_folds;
            seen[label] += 1;
        }

        let mut folds = Vec::with_capacity(self.n_folds);
        for fold in 0..self.n_folds {
            let mut train = Vec::new();
            let mut test = Vec::new();
            for (i, &f) in fold_of.iter().enumerate() {
                if f == fold {
                    test.push(i);
                } else {
                    train.push(i);
                }
            }
            if test.is_empty() || train.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "fold {} is empty for {} samples in {} folds",
                    fold,
                    y.len(),
                    self.n_folds
                )));
            }
            folds.push((train, test));
        }
        Ok(folds)
    }
}

/// Repeated random train/test partitions, the cross-validator behind
/// learning curves.
#[derive(Debug, Clone, Copy)]
pub struct ShuffleSplit {
    pub n_splits: usize,
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for ShuffleSplit {
    /// 10 splits holding out 20%
    fn default() -> Self {
        Self {
            n_splits: 10,
            test_ratio: 0.2,
            seed: 0,
        }
    }
}

impl ShuffleSplit {
    /// (train, test) index pairs, one per split
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits == 0 {
            return Err(Error::InvalidInput(
                "shuffle split needs at least one split".to_string(),
            ));
        }
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(Error::InvalidInput(format!(
                "test ratio must lie in (0, 1), got {}",
                self.test_ratio
            )));
        }
        let n_test = ((n_samples as f64) * self.test_ratio).round() as usize;
        if n_test == 0 || n_test >= n_samples {
            return Err(Error::InvalidInput(format!(
                "test ratio {} leaves an empty partition for {} samples",
                self.test_ratio, n_samples
            )));
        }

        Ok((0..self.n_splits)
            .map(|split| {
                let mut indices: Vec<usize> = (0..n_samples).collect();
                indices.shuffle(&mut StdRng::seed_from_u64(
                    self.seed.wrapping_add(split as u64),
                ));
                let test = indices[..n_test].to_vec();
                let train = indices[n_test..].to_vec();
                (train, test)
            })
            .collect())
    }
}

/// Overall-accuracy scores across increasing training-set sizes.
///
/// `train_scores[i][j]` and `test_scores[i][j]` hold the scores for size
/// `train_sizes[i]` on split `j`.
#[derive(Debug, Clone)]
pub struct LearningCurve {
    pub train_sizes: Vec<usize>,
    pub train_scores: Vec<Vec<f64>>,
    pub test_scores: Vec<Vec<f64>>,
}

impl LearningCurve {
    pub fn train_mean_std(&self) -> (Vec<f64>, Vec<f64>) {
        mean_std_rows(&self.train_scores)
    }

    pub fn test_mean_std(&self) -> (Vec<f64>, Vec<f64>) {
        mean_std_rows(&self.test_scores)
    }
}

fn mean_std_rows(rows: &[Vec<f64>]) -> (Vec<f64>, Vec<f64>) {
    let mut means = Vec::with_capacity(rows.len());
    let mut stds = Vec::with_capacity(rows.len());
    for row in rows {
        let n = row.len() as f64;
        let mean = row.iter().sum::<f64>() / n;
        let var = row.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        means.push(mean);
        stds.push(var.sqrt());
    }
    (means, stds)
}

/// Fit `classifier` on growing prefixes of every shuffle split's training
/// rows and score overall accuracy on the seen rows and the held-out rows.
///
/// Splits are independent and run on the rayon pool; the outputs are
/// deterministic for a fixed classifier seed and split seed.
pub fn learning_curve<C>(
    classifier: &C,
    x: &Array2<f64>,
    y: &Array1<usize>,
    train_fractions: &[f64],
    cv: &ShuffleSplit,
) -> Result<LearningCurve>
where
    C: Classifier + Sync,
{
    if train_fractions.is_empty() {
        return Err(Error::InvalidInput(
            "learning curve needs at least one training fraction".to_string(),
        ));
    }
    for &fraction in train_fractions {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::InvalidInput(format!(
                "train fraction must lie in (0, 1], got {}",
                fraction
            )));
        }
    }
    if x.nrows() != y.len() {
        return Err(Error::InvalidInput(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }

    let splits = cv.split(x.nrows())?;
    let full_train = splits[0].0.len();
    let train_sizes: Vec<usize> = train_fractions
        .iter()
        .map(|f| (((full_train as f64) * f).round() as usize).clamp(1, full_train))
        .collect();

    // per split, one (train score, test score) pair per size
    let per_split: Vec<Vec<(f64, f64)>> = splits
        .par_iter()
        .map(|(train, test)| -> Result<Vec<(f64, f64)>> {
            let x_test = take_rows(x, test);
            let y_test = take_labels(y, test);
            train_sizes
                .iter()
                .map(|&size| {
                    let subset = &train[..size];
                    let x_sub = take_rows(x, subset);
                    let y_sub = take_labels(y, subset);
                    let fitted = classifier.fit(&x_sub, &y_sub)?;
                    let train_score = overall_accuracy(&y_sub, &fitted.predict(&x_sub))?;
                    let test_score = overall_accuracy(&y_test, &fitted.predict(&x_test))?;
                    Ok((train_score, test_score))
                })
                .collect()
        })
        .collect::<Result<_>>()?;

    let mut train_scores = vec![Vec::with_capacity(per_split.len()); train_sizes.len()];
    let mut test_scores = vec![Vec::with_capacity(per_split.len()); train_sizes.len()];
    for split_scores in &per_split {
        for (size_idx, &(train, test)) in split_scores.iter().enumerate() {
            train_scores[size_idx].push(train);
            test_scores[size_idx].push(test);
        }
    }

    Ok(LearningCurve {
        train_sizes,
        train_scores,
        test_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{RandomForestClassifier, RandomForestParams};
    use ndarray::Array2;

    fn block_labels(per_class: usize, n_classes: usize) -> Array1<usize> {
        Array1::from_iter((0..per_class * n_classes).map(|i| i / per_class))
    }

    fn toy_features(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 3), |(i, j)| (i * 3 + j) as f64)
    }

    #[test]
    fn test_split_is_deterministic_and_complete() {
        let x = toy_features(20);
        let y = block_labels(10, 2);

        let a = train_test_split(&x, &y, 0.6, 101).unwrap();
        let b = train_test_split(&x, &y, 0.6, 101).unwrap();
        assert_eq!(a.x_train, b.x_train);
        assert_eq!(a.y_test, b.y_test);

        assert_eq!(a.x_train.nrows(), 12);
        assert_eq!(a.x_test.nrows(), 8);

        // every original row lands on exactly one side
        let mut firsts: Vec<f64> = a
            .x_train
            .column(0)
            .iter()
            .chain(a.x_test.column(0).iter())
            .copied()
            .collect();
        firsts.sort_by(|p, q| p.partial_cmp(q).unwrap());
        let expected: Vec<f64> = (0..20).map(|i| (i * 3) as f64).collect();
        assert_eq!(firsts, expected);
    }

    #[test]
    fn test_split_different_seeds_differ() {
        let x = toy_features(40);
        let y = block_labels(20, 2);
        let a = train_test_split(&x, &y, 0.5, 0).unwrap();
        let b = train_test_split(&x, &y, 0.5, 1).unwrap();
        assert_ne!(a.y_train, b.y_train);
    }

    #[test]
    fn test_split_rejects_bad_ratio() {
        let x = toy_features(10);
        let y = block_labels(5, 2);
        assert!(train_test_split(&x, &y, 0.0, 0).is_err());
        assert!(train_test_split(&x, &y, 1.0, 0).is_err());
    }

    #[test]
    fn test_stratified_folds_cover_all_classes() {
        let y = block_labels(20, 3);
        let folds = StratifiedKFold::new(5).split(&y, 3).unwrap();
        assert_eq!(folds.len(), 5);

        let mut test_total = 0;
        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), y.len());
            test_total += test.len();
            for class in 0..3 {
                assert!(
                    test.iter().any(|&i| y[i] == class),
                    "class {} missing from a test fold",
                    class
                );
                assert!(train.iter().any(|&i| y[i] == class));
            }
        }
        // folds partition the samples
        assert_eq!(test_total, y.len());
    }

    #[test]
    fn test_stratified_fold_validation() {
        let y = block_labels(10, 2);
        assert!(StratifiedKFold::new(1).split(&y, 2).is_err());
        assert!(StratifiedKFold::new(30).split(&y, 2).is_err());
    }

    #[test]
    fn test_shuffle_split_sizes() {
        let splits = ShuffleSplit::default().split(50).unwrap();
        assert_eq!(splits.len(), 10);
        for (train, test) in &splits {
            assert_eq!(test.len(), 10);
            assert_eq!(train.len(), 40);
        }
    }

    #[test]
    fn test_learning_curve_shapes() {
        // four separated clusters so small prefixes still fit cleanly
        let n_per_class = 15;
        let x = Array2::from_shape_fn((n_per_class * 4, 2), |(i, j)| {
            let class = i / n_per_class;
            let offset = (i % n_per_class) as f64 * 0.01;
            match (class, j) {
                (0, 0) => offset,
                (1, 0) => 10.0 + offset,
                (2, 0) => offset,
                (3, 0) => 10.0 + offset,
                (0, 1) | (1, 1) => offset,
                _ => 10.0 + offset,
            }
        });
        let y = block_labels(n_per_class, 4);

        let classifier = RandomForestClassifier::new(RandomForestParams {
            n_estimators: 10,
            max_depth: 6,
            min_samples_leaf: 1,
            min_samples_split: 2,
            seed: 7,
        });
        let cv = ShuffleSplit {
            n_splits: 4,
            test_ratio: 0.25,
            seed: 3,
        };
        let curve = learning_curve(&classifier, &x, &y, &[0.5, 1.0], &cv).unwrap();

        assert_eq!(curve.train_sizes.len(), 2);
        assert_eq!(curve.train_sizes[1], 45);
        assert_eq!(curve.train_scores.len(), 2);
        assert_eq!(curve.train_scores[0].len(), 4);
        assert_eq!(curve.test_scores[1].len(), 4);

        let (test_means, _) = curve.test_mean_std();
        // more training data should not hurt on cleanly separable clusters
        assert!(test_means[1] >= test_means[0] - 0.1);

        // deterministic end to end
        let again = learning_curve(&classifier, &x, &y, &[0.5, 1.0], &cv).unwrap();
        assert_eq!(curve.test_scores, again.test_scores);
    }
}
