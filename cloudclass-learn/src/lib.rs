//! # Cloudclass Learn
//!
//! Supervised classification over point-cloud descriptors: dataset assembly
//! with positional block labels, SVM and random-forest classifiers behind a
//! single fit/predict interface, accuracy metrics with confusion matrices,
//! train/test splitting and learning curves, and a multi-metric grid search
//! with a pluggable refit policy.

pub mod dataset;
pub mod classifier;
pub mod svm;
mod tree;
pub mod forest;
pub mod evaluate;
pub mod model_selection;
pub mod grid_search;

pub use classifier::*;
pub use dataset::*;
pub use evaluate::*;
pub use forest::*;
pub use grid_search::*;
pub use model_selection::*;
pub use svm::*;
