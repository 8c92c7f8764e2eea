//! The fit/predict contract shared by all classifier families

use cloudclass_core::Result;
use ndarray::{Array1, Array2};

/// An unfitted classifier configuration.
///
/// `fit` takes a feature matrix (rows = samples) and an aligned vector of
/// integer labels and produces an immutable trained state. Configurations
/// with internal randomness must be fully determined by their seed.
pub trait Classifier {
    /// Trained state produced by [`Classifier::fit`]
    type Fitted: FittedClassifier;

    /// Train on the rows of `x` with aligned labels `y`
    fn fit(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<Self::Fitted>;
}

/// A trained model. Prediction never mutates the state, so a fitted model
/// can be shared across threads and invoked any number of times.
pub trait FittedClassifier: Send + Sync {
    /// Predict a label for every row of `x`
    fn predict(&self, x: &Array2<f64>) -> Array1<usize>;
}
