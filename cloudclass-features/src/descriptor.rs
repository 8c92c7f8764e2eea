//! The descriptor vector emitted for every point-cloud sample

use serde::{Deserialize, Serialize};

/// Number of entries in a flattened [`FeatureVector`]
pub const FEATURE_DIM: usize = 9;

/// Positional names of the flattened descriptor, for external renderers.
/// The order matches [`FeatureVector::to_array`].
pub const FEATURE_NAMES: [&str; FEATURE_DIM] = [
    "highest_z",
    "point_variance",
    "relative_height",
    "length",
    "width",
    "bbox_volume",
    "lambda1",
    "planarity",
    "sphericity",
];

/// Eigenvalues of the covariance of a centered point cloud, sorted descending
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Eigenvalues {
    pub l1: f64,
    pub l2: f64,
    pub l3: f64,
}

/// Fixed-length geometric/statistical descriptor of one point-cloud sample.
///
/// Downstream consumers index the flattened form by position, so the field
/// order here and in [`FeatureVector::to_array`] is a contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Maximum z over the raw (uncentered) points
    pub highest_z: f64,
    /// Squared deviations from the per-axis means, pooled over all three
    /// axes and divided by the point count
    pub point_variance: f64,
    /// max(z) - min(z)
    pub relative_height: f64,
    /// Larger of the two horizontal bounding-box extents
    pub length: f64,
    /// Smaller of the two horizontal bounding-box extents
    pub width: f64,
    /// width * length * relative_height
    pub bbox_volume: f64,
    /// Leading covariance eigenvalue
    pub lambda1: f64,
    /// (lambda2 - lambda3) / lambda1
    pub planarity: f64,
    /// lambda3 / lambda1
    pub sphericity: f64,
}

impl FeatureVector {
    /// Flatten to the positional layout named by [`FEATURE_NAMES`]
    pub fn to_array(&self) -> [f64; FEATURE_DIM] {
        [
            self.highest_z,
            self.point_variance,
            self.relative_height,
            self.length,
            self.width,
            self.bbox_volume,
            self.lambda1,
            self.planarity,
            self.sphericity,
        ]
    }
}

impl From<FeatureVector> for [f64; FEATURE_DIM] {
    fn from(v: FeatureVector) -> Self {
        v.to_array()
    }
}
