//! The material boundary. Shading models live outside the engine; the core only needs
//! a handle per face, an index for auxiliary passes, and transparency for shadow rays.

use crate::core::types::{Colour, Vector3};
use crate::render::state::RenderState;
use crate::shared::intersect::SurfacePoint;
use crate::shared::ComponentRequirements;
use std::sync::Arc;

/// Shared, opaque handle to a material
pub type MaterialRef = Arc<dyn Material>;

pub trait Material: ComponentRequirements {
    /// Absolute material index, written back by shadow queries for auxiliary passes
    fn abs_index(&self) -> u32;

    /// Whether shadow rays may pass through this material
    fn is_transparent(&self) -> bool { false }

    /// Colour filter applied to light passing through the surface at `sp` in direction `wo`.
    ///
    /// Only called when [Self::is_transparent] is `true`.
    /// Implementations may use the scratch buffer in `state`, which belongs to the calling thread.
    fn transparency(&self, _state: &mut RenderState, _sp: &SurfacePoint, _wo: Vector3) -> Colour { Colour::BLACK }
}
