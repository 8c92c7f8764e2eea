//! Semantic class labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of semantic classes, in label-index order.
///
/// All label vectors in this workspace use the 0-indexed encoding below;
/// callers working with 1-indexed conventions must normalize before handing
/// labels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassLabel {
    Building = 0,
    Car = 1,
    Fence = 2,
    Pole = 3,
    Tree = 4,
}

impl ClassLabel {
    /// All classes, ordered by label index
    pub const ALL: [ClassLabel; 5] = [
        ClassLabel::Building,
        ClassLabel::Car,
        ClassLabel::Fence,
        ClassLabel::Pole,
        ClassLabel::Tree,
    ];

    /// Number of semantic classes
    pub const COUNT: usize = Self::ALL.len();

    /// Label for a given index, `None` if out of range
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Integer label used in feature matrices and confusion matrices
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name used by external renderers
    pub fn name(self) -> &'static str {
        match self {
            ClassLabel::Building => "building",
            ClassLabel::Car => "car",
            ClassLabel::Fence => "fence",
            ClassLabel::Pole => "pole",
            ClassLabel::Tree => "tree",
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
