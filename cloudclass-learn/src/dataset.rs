//! Dataset assembly from ordered point-cloud samples

use cloudclass_core::{Error, PointCloud, Result};
use cloudclass_features::{calculate_features_batch, FEATURE_DIM};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Block layout of an ordered sample collection: `num_classes` contiguous
/// blocks of `samples_per_class` samples, block `i` carrying label `i`.
///
/// The layout is explicit so the positional-labeling contract with the
/// loader is validated rather than assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLayout {
    pub num_classes: usize,
    pub samples_per_class: usize,
}

impl DatasetLayout {
    pub fn new(num_classes: usize, samples_per_class: usize) -> Self {
        Self {
            num_classes,
            samples_per_class,
        }
    }

    /// Total number of samples the layout describes
    pub fn total(&self) -> usize {
        self.num_classes * self.samples_per_class
    }
}

impl Default for DatasetLayout {
    /// 5 classes of 100 samples each
    fn default() -> Self {
        Self::new(5, 100)
    }
}

/// Feature matrix and aligned label vector for a full sample collection
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Array2<f64>,
    pub labels: Array1<usize>,
    pub layout: DatasetLayout,
}

impl Dataset {
    /// Extract descriptors for every sample and attach block labels.
    ///
    /// Sample order is preserved, and `labels[i] == i / samples_per_class`
    /// holds for every sample regardless of how the caller enumerated its
    /// inputs. A per-sample extraction failure fails the whole batch.
    pub fn assemble(clouds: &[PointCloud], layout: DatasetLayout) -> Result<Self> {
        if layout.num_classes == 0 || layout.samples_per_class == 0 {
            return Err(Error::InvalidInput(
                "dataset layout must have at least one class and one sample per class".to_string(),
            ));
        }
        if clouds.len() != layout.total() {
            return Err(Error::DatasetSizeMismatch {
                total: clouds.len(),
                num_classes: layout.num_classes,
                samples_per_class: layout.samples_per_class,
            });
        }

        log::debug!("extracting descriptors for {} samples", clouds.len());
        let descriptors = calculate_features_batch(clouds)?;

        let mut data = Vec::with_capacity(clouds.len() * FEATURE_DIM);
        for descriptor in &descriptors {
            data.extend_from_slice(&descriptor.to_array());
        }
        let features = Array2::from_shape_vec((clouds.len(), FEATURE_DIM), data)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let labels =
            Array1::from_iter((0..clouds.len()).map(|i| i / layout.samples_per_class));

        Ok(Self {
            features,
            labels,
            layout,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Descriptor row and label of sample `i`
    pub fn sample(&self, i: usize) -> (ArrayView1<'_, f64>, usize) {
        (self.features.row(i), self.labels[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudclass_core::Point3d;

    // a small tetrahedron shifted so every sample is distinct
    fn sample_cloud(offset: f64) -> PointCloud {
        PointCloud::from_points(vec![
            Point3d::new(offset, 0.0, 0.0),
            Point3d::new(offset + 1.0, 0.0, 0.0),
            Point3d::new(offset, 1.0, 0.0),
            Point3d::new(offset, 0.0, 1.0),
        ])
    }

    #[test]
    fn test_block_labels() {
        let clouds: Vec<PointCloud> = (0..500).map(|i| sample_cloud(i as f64)).collect();
        let dataset = Dataset::assemble(&clouds, DatasetLayout::default()).unwrap();

        assert_eq!(dataset.n_samples(), 500);
        assert_eq!(dataset.n_features(), FEATURE_DIM);
        for i in 0..500 {
            assert_eq!(dataset.labels[i], i / 100);
        }
    }

    #[test]
    fn test_size_mismatch() {
        let clouds: Vec<PointCloud> = (0..42).map(|i| sample_cloud(i as f64)).collect();
        let err = Dataset::assemble(&clouds, DatasetLayout::new(5, 10)).unwrap_err();
        assert!(matches!(
            err,
            Error::DatasetSizeMismatch {
                total: 42,
                num_classes: 5,
                samples_per_class: 10,
            }
        ));
    }

    #[test]
    fn test_failing_sample_fails_batch() {
        let mut clouds: Vec<PointCloud> = (0..6).map(|i| sample_cloud(i as f64)).collect();
        clouds[3] = PointCloud::from_rows(&[[0.0; 3], [1.0, 0.0, 0.0]]);

        match Dataset::assemble(&clouds, DatasetLayout::new(3, 2)) {
            Err(Error::Sample { index, .. }) => assert_eq!(index, 3),
            other => panic!("expected sample failure, got {:?}", other.map(|d| d.n_samples())),
        }
    }

    #[test]
    fn test_sample_accessor() {
        let clouds: Vec<PointCloud> = (0..4).map(|i| sample_cloud(i as f64)).collect();
        let dataset = Dataset::assemble(&clouds, DatasetLayout::new(2, 2)).unwrap();
        let (row, label) = dataset.sample(3);
        assert_eq!(row.len(), FEATURE_DIM);
        assert_eq!(label, 1);
    }
}
