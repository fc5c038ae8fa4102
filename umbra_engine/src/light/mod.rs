use crate::scene::Scene;
use crate::shared::ComponentRequirements;

/// A light source. Sampling lives with the integrators; the core only manages the light list
pub trait Light: ComponentRequirements {
    /// Called on every update, once the spatial index is current, so the light can fit itself to the scene bounds
    fn init(&mut self, _scene: &Scene) {}

    /// Disabled lights are rejected when added to a scene
    fn is_enabled(&self) -> bool { true }
}
