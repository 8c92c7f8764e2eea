//! Support vector machine classification via one-vs-rest linfa models
//!
//! linfa's SVM is binary, so the multiclass classifier trains one binary
//! model per class and predicts by the largest per-class decision value.
//! Decision functions are reconstructed from each model's `alpha`/`rho`
//! together with the training matrix, which keeps prediction independent of
//! the backing library's internal representation.

use crate::classifier::{Classifier, FittedClassifier};
use cloudclass_core::{Error, Result};
use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

// Additive constant of the polynomial kernel, matching what training passes
// to linfa.
const POLY_CONSTANT: f64 = 1.0;

/// Kernel family of an [`SvmClassifier`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SvmKernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { degree: u32 },
}

/// Parameters of a C-classification SVM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    pub kernel: SvmKernel,
    pub c: f64,
}

impl SvmParams {
    pub fn linear(c: f64) -> Self {
        Self {
            kernel: SvmKernel::Linear,
            c,
        }
    }

    pub fn rbf(gamma: f64, c: f64) -> Self {
        Self {
            kernel: SvmKernel::Rbf { gamma },
            c,
        }
    }

    pub fn poly(degree: u32, c: f64) -> Self {
        Self {
            kernel: SvmKernel::Poly { degree },
            c,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(Error::InvalidInput(format!(
                "SVM regularization C must be positive, got {}",
                self.c
            )));
        }
        match self.kernel {
            SvmKernel::Rbf { gamma } if !(gamma.is_finite() && gamma > 0.0) => Err(
                Error::InvalidInput(format!("rbf gamma must be positive, got {}", gamma)),
            ),
            SvmKernel::Poly { degree } if degree == 0 => Err(Error::InvalidInput(
                "polynomial degree must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Multiclass SVM configuration
#[derive(Debug, Clone, Copy)]
pub struct SvmClassifier {
    pub params: SvmParams,
}

impl SvmClassifier {
    pub fn new(params: SvmParams) -> Self {
        Self { params }
    }
}

impl Classifier for SvmClassifier {
    type Fitted = FittedSvm;

    fn fit(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<FittedSvm> {
        self.params.validate()?;
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

        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        let mut decisions = Vec::with_capacity(n_classes);

        for class in 0..n_classes {
            let targets = Array1::from_iter(y.iter().map(|&label| label == class));
            let dataset = Dataset::new(x.clone(), targets);

            let params = Svm::<f64, bool>::params().pos_neg_weights(self.params.c, self.params.c);
            let params = match self.params.kernel {
                SvmKernel::Linear => params.linear_kernel(),
                // linfa's gaussian kernel is exp(-d^2 / eps), so eps = 1/gamma
                SvmKernel::Rbf { gamma } => params.gaussian_kernel(1.0 / gamma),
                SvmKernel::Poly { degree } => {
                    params.polynomial_kernel(POLY_CONSTANT, degree as f64)
                }
            };

            let model = params
                .fit(&dataset)
                .map_err(|e| Error::Classifier(e.to_string()))?;
            decisions.push(DecisionFn::from_model(&model, x, self.params.kernel));
        }

        Ok(FittedSvm {
            kernel: self.params.kernel,
            support: x.clone(),
            decisions,
        })
    }
}

// Per-class decision function reconstructed from a fitted binary model.
#[derive(Debug, Clone)]
enum DecisionFn {
    // f(x) = w.x - rho
    Linear { weights: Array1<f64>, rho: f64 },
    // f(x) = sum_i alpha_i k(x, x_i) - rho over the training rows
    Kernel { alpha: Vec<f64>, rho: f64 },
}

impl DecisionFn {
    fn from_model(model: &Svm<f64, bool>, support: &Array2<f64>, kernel: SvmKernel) -> Self {
        let alpha = model.alpha.clone();
        let rho = model.rho;
        match kernel {
            SvmKernel::Linear => {
                // collapse the support expansion into a single weight vector
                let mut weights = Array1::zeros(support.ncols());
                for (i, &a) in alpha.iter().enumerate() {
                    weights.scaled_add(a, &support.row(i));
                }
                DecisionFn::Linear { weights, rho }
            }
            SvmKernel::Rbf { .. } | SvmKernel::Poly { .. } => DecisionFn::Kernel { alpha, rho },
        }
    }

    fn eval(&self, kernel: SvmKernel, support: &Array2<f64>, x: &ArrayView1<'_, f64>) -> f64 {
        match self {
            DecisionFn::Linear { weights, rho } => weights.dot(x) - rho,
            DecisionFn::Kernel { alpha, rho } => {
                let sum: f64 = alpha
                    .iter()
                    .enumerate()
                    .map(|(i, &a)| a * kernel_value(kernel, &support.row(i), x))
                    .sum();
                sum - rho
            }
        }
    }
}

// Kernel evaluation matching what linfa computed during training.
fn kernel_value(kernel: SvmKernel, a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    match kernel {
        SvmKernel::Linear => a.dot(b),
        SvmKernel::Rbf { gamma } => {
            let sq_dist: f64 = a
                .iter()
                .zip(b.iter())
                .map(|(p, q)| (p - q) * (p - q))
                .sum();
            (-gamma * sq_dist).exp()
        }
        SvmKernel::Poly { degree } => (a.dot(b) + POLY_CONSTANT).powi(degree as i32),
    }
}

/// Trained multiclass SVM; read-only after fit
#[derive(Debug, Clone)]
pub struct FittedSvm {
    kernel: SvmKernel,
    support: Array2<f64>,
    decisions: Vec<DecisionFn>,
}

impl FittedSvm {
    /// Number of classes seen during training
    pub fn n_classes(&self) -> usize {
        self.decisions.len()
    }

    /// Per-class decision values for one sample row
    pub fn decision_values(&self, x: &ArrayView1<'_, f64>) -> Vec<f64> {
        self.decisions
            .iter()
            .map(|d| d.eval(self.kernel, &self.support, x))
            .collect()
    }
}

impl FittedClassifier for FittedSvm {
    fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        Array1::from_iter(x.rows().into_iter().map(|row| {
            let values = self.decision_values(&row);
            argmax(&values)
        }))
    }
}

// First index wins ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
