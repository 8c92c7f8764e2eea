//! # Cloudclass Features
//!
//! Converts a segmented point-cloud object into a fixed-length descriptor
//! combining eigenvalue-based shape measures (planarity, sphericity) with
//! bounding-box and dispersion statistics. Descriptors feed the classifiers
//! in `cloudclass-learn`.

pub mod descriptor;
pub mod extract;

pub use descriptor::*;
pub use extract::*;
