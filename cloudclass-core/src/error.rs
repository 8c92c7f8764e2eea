//! Error types for cloudclass

use thiserror::Error;

/// Main error type for cloudclass operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("point cloud has {got} points, at least {min} required")]
    InsufficientPoints { got: usize, min: usize },

    #[error("degenerate geometry: covariance has no well-defined principal axes")]
    DegenerateGeometry,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("sample {index}: {source}")]
    Sample {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("dataset has {total} samples, expected {num_classes} classes of {samples_per_class}")]
    DatasetSizeMismatch {
        total: usize,
        num_classes: usize,
        samples_per_class: usize,
    },

    #[error("classifier error: {0}")]
    Classifier(String),

    #[error("hyperparameter grid is empty")]
    EmptyGrid,

    #[error("refit policy did not select a candidate")]
    NoFeasibleCandidate,
}

/// Result type alias for cloudclass operations
pub type Result<T> = std::result::Result<T, Error>;
