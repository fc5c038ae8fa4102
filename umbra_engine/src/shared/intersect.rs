use crate::core::types::{Number, Point2, Point3, Vector3};
use crate::material::MaterialRef;
use derivative::Derivative;
use std::cmp::Ordering;

/// The raw result of a ray hitting a single primitive, before any surface data is derived
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PrimitiveHit {
    /// Distance along the ray that the hit occurred
    pub dist: Number,
    /// Barycentric weight of the second vertex
    pub u: Number,
    /// Barycentric weight of the third vertex
    pub v: Number,
}

impl PartialOrd for PrimitiveHit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Number::partial_cmp(&self.dist, &other.dist) }
}

/// Full surface description at a ray hit, handed to shading
#[derive(Clone, Debug, Derivative)]
#[derivative(PartialEq)]
pub struct SurfacePoint {
    /// The position in world coordinates of the intersection
    pub pos: Point3,
    /// Distance along the ray that the intersection occurred
    pub dist: Number,
    /// Normal of the face plane.
    ///
    /// # Invariants
    ///  - Must be normalised
    pub geometric_normal: Vector3,
    /// Interpolated shading normal; equal to [Self::geometric_normal] for flat faces
    pub normal: Vector3,
    /// Whether the ray hit the side the geometric normal points towards
    pub front_face: bool,
    /// Texture coordinates, if the mesh carries them
    pub uv: Option<Point2>,
    /// Original (untransformed) coordinates, if the mesh carries them
    pub orco: Option<Point3>,
    /// Pass index of the object that was hit
    pub object_index: u32,
    #[derivative(PartialEq = "ignore")]
    pub material: Option<MaterialRef>,
}
