use crate::core::types::Colour;
use crate::shared::ray::Ray;
use crate::shared::ComponentRequirements;
use std::sync::Arc;

pub type BackgroundRef = Arc<dyn Background>;

/// What a ray sees when it escapes the scene
pub trait Background: ComponentRequirements {
    fn eval(&self, ray: &Ray) -> Colour;
}
