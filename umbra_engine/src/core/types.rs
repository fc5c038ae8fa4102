use crate::core::colour::ColourRgb;

/// Numeric type used for graphics calculations in the engine
pub type Channel = f32;
pub type Colour = ColourRgb;

/// Numeric type used for most calculations in the engine
pub type Number = f64;
pub type Vector2 = glam::DVec2;
pub type Vector3 = glam::DVec3;
pub type Point2 = glam::DVec2;
pub type Point3 = glam::DVec3;
pub type Matrix4 = glam::DMat4;
