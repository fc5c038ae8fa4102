use crate::core::types::Number;
use serde::{Deserialize, Serialize};
use valuable::Valuable;

/// Cost parameters for building a [KdTree](super::KdTree)
#[derive(Copy, Clone, Debug, PartialEq, Valuable, Serialize, Deserialize)]
pub struct KdTreeOpts {
    /// Maximum depth of the tree. [None] picks one from the primitive count
    pub max_depth: Option<usize>,
    /// Nodes with at most this many primitives always become leaves
    pub max_leaf_size: usize,
    /// Relative cost of stepping through an interior node
    pub traversal_cost: Number,
    /// Relative cost of testing one primitive
    pub intersect_cost: Number,
    /// Cost reduction (`0..=1`) for splits that leave one side empty
    pub empty_bonus: Number,
}

impl Default for KdTreeOpts {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_leaf_size: 1,
            traversal_cost: 0.8,
            intersect_cost: 1.0,
            empty_bonus: 0.33,
        }
    }
}

impl KdTreeOpts {
    /// The depth limit to use for `prim_count` primitives
    pub fn depth_for(&self, prim_count: usize) -> usize {
        self.max_depth
            .unwrap_or_else(|| (7. + 1.66 * (prim_count.max(1) as Number).log2()) as usize)
    }
}
