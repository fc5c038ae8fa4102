//! Spatial acceleration structures used to answer ray queries against the scene's primitives

pub mod kdtree;
pub mod opts;
mod traverse;

pub use self::{kdtree::KdTree, opts::KdTreeOpts, traverse::FilteredHit};
