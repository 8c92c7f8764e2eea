//! Point cloud container and basic geometry queries

use crate::point::Point3d;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// An ordered collection of 3D points, immutable once loaded.
///
/// Samples arrive already parsed into numeric rows; file I/O is the caller's
/// concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<Point3d>,
}

impl PointCloud {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<Point3d>) -> Self {
        Self { points }
    }

    /// Create a point cloud from parsed (x, y, z) rows
    pub fn from_rows(rows: &[[f64; 3]]) -> Self {
        Self {
            points: rows
                .iter()
                .map(|&[x, y, z]| Point3d::new(x, y, z))
                .collect(),
        }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: Point3d) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, Point3d> {
        self.points.iter()
    }

    /// Axis-aligned bounding box, `None` for an empty cloud
    pub fn bounding_box(&self) -> Option<(Point3d, Point3d)> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;

        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Per-axis mean of the points, `None` for an empty cloud
    pub fn centroid(&self) -> Option<Point3d> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let sum = self
            .points
            .iter()
            .fold(Point3d::origin(), |acc, p| acc + p.coords);
        Some(sum / n)
    }
}

impl Index<usize> for PointCloud {
    type Output = Point3d;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IntoIterator for PointCloud {
    type Item = Point3d;
    type IntoIter = std::vec::IntoIter<Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3d;
    type IntoIter = std::slice::Iter<'a, Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl Extend<Point3d> for PointCloud {
    fn extend<I: IntoIterator<Item = Point3d>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl FromIterator<Point3d> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3d>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_rows_preserves_order() {
        let cloud = PointCloud::from_rows(&[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[0], Point3d::new(0.0, 1.0, 2.0));
        assert_eq!(cloud[1], Point3d::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_bounding_box() {
        let cloud = PointCloud::from_rows(&[
            [0.0, 0.0, 0.0],
            [2.0, -1.0, 3.0],
            [1.0, 5.0, -2.0],
        ]);
        let (min, max) = cloud.bounding_box().unwrap();
        assert_eq!(min, Point3d::new(0.0, -1.0, -2.0));
        assert_eq!(max, Point3d::new(2.0, 5.0, 3.0));
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(PointCloud::new().bounding_box().is_none());
        assert!(PointCloud::new().centroid().is_none());
    }

    #[test]
    fn test_centroid() {
        let cloud = PointCloud::from_rows(&[[0.0, 0.0, 0.0], [2.0, 4.0, 6.0]]);
        let c = cloud.centroid().unwrap();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 2.0);
        assert_relative_eq!(c.z, 3.0);
    }
}
