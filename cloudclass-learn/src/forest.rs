//! Random forest classification
//!
//! Bootstrap-aggregated CART trees with Gini splits and per-split feature
//! subsampling. Tree training is parallel; each tree derives its RNG from
//! the forest seed and its own index, so results do not depend on worker
//! scheduling.

use crate::classifier::{Classifier, FittedClassifier};
use crate::tree::{DecisionTree, TreeConfig};
use cloudclass_core::{Error, Result};
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters of a random-forest classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            max_depth: 20,
            min_samples_leaf: 2,
            min_samples_split: 10,
            seed: 42,
        }
    }
}

/// Random forest configuration
#[derive(Debug, Clone, Copy)]
pub struct RandomForestClassifier {
    pub params: RandomForestParams,
}

impl RandomForestClassifier {
    pub fn new(params: RandomForestParams) -> Self {
        Self { params }
    }
}

impl Classifier for RandomForestClassifier {
    type Fitted = FittedForest;

    fn fit(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<FittedForest> {
        if self.params.n_estimators == 0 {
            return Err(Error::InvalidInput(
                "forest needs at least one estimator".to_string(),
            ));
        }
        if self.params.max_depth == 0 || self.params.min_samples_leaf == 0 {
            return Err(Error::InvalidInput(
                "max_depth and min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(Error::InvalidInput(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(Error::InvalidInput("empty training set".to_string()));
        }

        let n = x.nrows();
        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        let labels = y.to_vec();
        let config = TreeConfig {
            max_depth: self.params.max_depth,
            min_samples_leaf: self.params.min_samples_leaf,
            min_samples_split: self.params.min_samples_split,
            n_classes,
            max_features: ((x.ncols() as f64).sqrt().round() as usize).max(1),
        };

        let trees: Vec<DecisionTree> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(self.params.seed.wrapping_add(t as u64));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, &labels, bootstrap, &config, &mut rng)
            })
            .collect();

        Ok(FittedForest { trees, n_classes })
    }
}

/// Trained forest; read-only after fit
#[derive(Debug, Clone)]
pub struct FittedForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl FittedForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

impl FittedClassifier for FittedForest {
    fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        Array1::from_iter(x.rows().into_iter().map(|row| {
            let mut votes = vec![0usize; self.n_classes.max(1)];
            for tree in &self.trees {
                votes[tree.predict_row(&row)] += 1;
            }
            // lowest label wins ties
            let mut best = 0;
            for (class, &count) in votes.iter().enumerate() {
                if count > votes[best] {
                    best = class;
                }
            }
            best
        }))
    }
}
