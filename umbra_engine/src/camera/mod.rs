use crate::core::types::Number;
use crate::shared::ray::Ray;
use crate::shared::ComponentRequirements;
use std::sync::Arc;

/// Shared handle to a camera; the renderer's view table and the scene both hold one
pub type CameraRef = Arc<dyn Camera>;

/// A camera, as seen by the core. Projection models live outside the engine
pub trait Camera: ComponentRequirements {
    /// Image size in pixels, as `(width, height)`
    fn resolution(&self) -> (u32, u32);

    /// Generates the primary ray through the film position `(x, y)`, in pixels
    fn shoot_ray(&self, x: Number, y: Number) -> Ray;
}
