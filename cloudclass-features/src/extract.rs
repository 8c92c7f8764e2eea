//! Descriptor extraction from raw point clouds

use crate::descriptor::{Eigenvalues, FeatureVector};
use cloudclass_core::{Error, PointCloud, Result};
use nalgebra::Matrix3;
use rayon::prelude::*;

/// Minimum number of points for a well-posed 3x3 covariance
pub const MIN_POINTS: usize = 3;

// Relative tolerance under which the covariance is treated as rank deficient
const DEGENERACY_TOL: f64 = 1e-12;

/// Compute the 9-dimensional descriptor of a single point-cloud sample.
///
/// The points are centered per axis, the eigenvalues of their covariance
/// yield the shape measures, and the remaining entries come from the
/// axis-aligned bounding box and the pooled per-axis dispersion of the raw
/// coordinates. The horizontal extents are ordered by magnitude, so the
/// result does not depend on which axis happens to be the wider one.
///
/// # Errors
/// * [`Error::InsufficientPoints`] for fewer than [`MIN_POINTS`] points
/// * [`Error::InvalidInput`] if any coordinate is non-finite
/// * [`Error::DegenerateGeometry`] if the points are coincident or
///   perfectly collinear
pub fn calculate_features(cloud: &PointCloud) -> Result<FeatureVector> {
    if cloud.len() < MIN_POINTS {
        return Err(Error::InsufficientPoints {
            got: cloud.len(),
            min: MIN_POINTS,
        });
    }
    for (i, p) in cloud.iter().enumerate() {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "non-finite coordinate at point {}",
                i
            )));
        }
    }

    let eig = covariance_eigenvalues(cloud)?;
    let planarity = (eig.l2 - eig.l3) / eig.l1;
    let sphericity = eig.l3 / eig.l1;

    // bounding-box statistics use the raw, uncentered coordinates
    let (lo, hi) = cloud.bounding_box().expect("cloud is non-empty");
    let highest_z = hi.z;
    let relative_height = hi.z - lo.z;
    let extent_x = hi.x - lo.x;
    let extent_y = hi.y - lo.y;
    let width = extent_x.min(extent_y);
    let length = extent_x.max(extent_y);
    let bbox_volume = width * length * relative_height;

    let point_variance = pooled_variance(cloud);

    Ok(FeatureVector {
        highest_z,
        point_variance,
        relative_height,
        length,
        width,
        bbox_volume,
        lambda1: eig.l1,
        planarity,
        sphericity,
    })
}

/// Eigenvalues of the sample covariance of the mean-centered points,
/// sorted descending.
///
/// Fails with [`Error::DegenerateGeometry`] when the covariance has rank
/// below 2 (coincident or perfectly collinear points), which is where the
/// eigenvalue-ratio shape measures stop being meaningful.
pub fn covariance_eigenvalues(cloud: &PointCloud) -> Result<Eigenvalues> {
    if cloud.len() < MIN_POINTS {
        return Err(Error::InsufficientPoints {
            got: cloud.len(),
            min: MIN_POINTS,
        });
    }

    let n = cloud.len() as f64;
    let centroid = cloud.centroid().expect("cloud is non-empty");

    let mut cov = Matrix3::zeros();
    for p in cloud.iter() {
        let d = p - centroid;
        cov += d * d.transpose();
    }
    cov /= n - 1.0;

    let eigen = cov.symmetric_eigen();
    let mut values = [
        eigen.eigenvalues.x,
        eigen.eigenvalues.y,
        eigen.eigenvalues.z,
    ];
    values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    // vanishing eigenvalues can come out slightly negative
    let [l1, l2, l3] = values.map(|v| v.max(0.0));

    if l1 <= 0.0 || l2 <= l1 * DEGENERACY_TOL {
        return Err(Error::DegenerateGeometry);
    }

    Ok(Eigenvalues { l1, l2, l3 })
}

// Squared deviations from the per-axis means, summed over every point and
// all three axes, divided by the point count (not by 3N).
fn pooled_variance(cloud: &PointCloud) -> f64 {
    let n = cloud.len() as f64;
    let centroid = cloud.centroid().expect("cloud is non-empty");
    let sum: f64 = cloud.iter().map(|p| (p - centroid).norm_squared()).sum();
    sum / n
}

/// Extract descriptors for every sample, preserving input order.
///
/// Samples are independent, so extraction runs on the rayon pool. A failure
/// on any sample fails the whole batch with the sample index attached;
/// dropping samples silently would break positional label alignment
/// downstream.
pub fn calculate_features_batch(clouds: &[PointCloud]) -> Result<Vec<FeatureVector>> {
    clouds
        .par_iter()
        .enumerate()
        .map(|(index, cloud)| {
            calculate_features(cloud).map_err(|source| Error::Sample {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}
