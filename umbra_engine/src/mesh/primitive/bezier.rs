use crate::core::types::Number;
use crate::material::MaterialRef;
use crate::mesh::primitive::{intersect_triangle, Primitive};
use crate::mesh::MeshData;
use crate::shared::aabb::{Aabb, AABB_PADDING};
use crate::shared::intersect::{PrimitiveHit, SurfacePoint};
use crate::shared::interval::Interval;
use crate::shared::ray::Ray;
use derivative::Derivative;
use std::sync::Arc;

/// A triangle whose corners each follow a quadratic bezier path over the ray's sample time
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct BezierTrianglePrimitive {
    #[derivative(Debug = "ignore")]
    mesh: Arc<MeshData>,
    face: usize,
    object_index: u32,
    aabb: Aabb,
}

impl BezierTrianglePrimitive {
    pub fn new(mesh: Arc<MeshData>, face: usize, object_index: u32) -> Self {
        // A quadratic bezier never leaves the hull of its control points
        let aabb = Aabb::encompass_points(
            mesh.faces()[face]
                .vertices
                .iter()
                .flat_map(|&i| &mesh.points()[i as usize..i as usize + 3]),
        )
        .min_padded(AABB_PADDING);
        Self {
            mesh,
            face,
            object_index,
            aabb,
        }
    }
}

impl Primitive for BezierTrianglePrimitive {
    fn aabb(&self) -> Aabb { self.aabb }

    fn intersect(&self, ray: &Ray, interval: &Interval<Number>) -> Option<PrimitiveHit> {
        let face = &self.mesh.faces()[self.face];
        intersect_triangle(self.mesh.bezier_corners(face, ray.time()), ray, interval)
    }

    fn surface(&self, ray: &Ray, hit: &PrimitiveHit) -> SurfacePoint {
        let corners = self
            .mesh
            .bezier_corners(&self.mesh.faces()[self.face], ray.time());
        self.mesh
            .surface(self.face, corners, ray, hit, None, self.object_index)
    }

    fn material(&self) -> Option<&MaterialRef> { self.mesh.faces()[self.face].material.as_ref() }

    fn object_index(&self) -> u32 { self.object_index }
}
