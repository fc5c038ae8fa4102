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

/// One face of a triangle (or generic triangle) mesh
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct TrianglePrimitive {
    #[derivative(Debug = "ignore")]
    mesh: Arc<MeshData>,
    face: usize,
    object_index: u32,
    aabb: Aabb,
}

impl TrianglePrimitive {
    pub fn new(mesh: Arc<MeshData>, face: usize, object_index: u32) -> Self {
        let aabb = Aabb::encompass_points(mesh.corners(&mesh.faces()[face], None)).min_padded(AABB_PADDING);
        Self {
            mesh,
            face,
            object_index,
            aabb,
        }
    }

    pub fn face(&self) -> usize { self.face }
}

impl Primitive for TrianglePrimitive {
    fn aabb(&self) -> Aabb { self.aabb }

    fn intersect(&self, ray: &Ray, interval: &Interval<Number>) -> Option<PrimitiveHit> {
        let face = &self.mesh.faces()[self.face];
        intersect_triangle(self.mesh.corners(face, None), ray, interval)
    }

    fn surface(&self, ray: &Ray, hit: &PrimitiveHit) -> SurfacePoint {
        let corners = self.mesh.corners(&self.mesh.faces()[self.face], None);
        self.mesh
            .surface(self.face, corners, ray, hit, None, self.object_index)
    }

    fn material(&self) -> Option<&MaterialRef> { self.mesh.faces()[self.face].material.as_ref() }

    fn object_index(&self) -> u32 { self.object_index }
}
