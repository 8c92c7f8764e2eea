//! Core data structures and types for cloudclass
//!
//! This crate provides the fundamental types shared by the feature-extraction
//! and classification crates: 3D points, point clouds, the semantic label set,
//! and the common error type.

pub mod point;
pub mod point_cloud;
pub mod label;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use label::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Point3, Vector3};
