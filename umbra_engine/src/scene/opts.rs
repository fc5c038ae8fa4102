use crate::accel::KdTreeOpts;
use crate::core::types::Number;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use valuable::Valuable;

/// Distance shadow rays skip before they can hit anything, when not set explicitly
pub const DEFAULT_SHADOW_BIAS: Number = 0.0005;
/// Minimum distance along a secondary ray, when not set explicitly
pub const DEFAULT_RAY_MIN_DIST: Number = 0.00005;

/// Which primitives the spatial index is built over
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, Valuable, Serialize, Deserialize)]
pub enum RenderMode {
    /// Only basic triangle meshes and their instances
    #[default]
    Triangle,
    /// Generic meshes and standalone objects
    Universal,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Valuable, Serialize, Deserialize)]
pub struct SceneOpts {
    pub mode: RenderMode,
    pub kd_tree: KdTreeOpts,
    /// [None] uses [DEFAULT_SHADOW_BIAS]
    pub shadow_bias: Option<Number>,
    /// [None] uses [DEFAULT_RAY_MIN_DIST]
    pub ray_min_dist: Option<Number>,
}
