use crate::core::types::Number;
use crate::material::MaterialRef;
use crate::mesh::primitive::{intersect_triangle, Primitive};
use crate::mesh::transform::ObjectTransform;
use crate::mesh::MeshData;
use crate::shared::aabb::{Aabb, AABB_PADDING};
use crate::shared::intersect::{PrimitiveHit, SurfacePoint};
use crate::shared::interval::Interval;
use crate::shared::ray::Ray;
use derivative::Derivative;
use std::sync::Arc;

/// A face of a base triangle mesh, seen through an instance's transform.
///
/// The base vertex data is shared, never copied; corners are transformed on the fly
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct InstancedTrianglePrimitive {
    #[derivative(Debug = "ignore")]
    mesh: Arc<MeshData>,
    face: usize,
    transform: Arc<ObjectTransform>,
    object_index: u32,
    aabb: Aabb,
}

impl InstancedTrianglePrimitive {
    pub fn new(mesh: Arc<MeshData>, face: usize, transform: Arc<ObjectTransform>, object_index: u32) -> Self {
        let corners = mesh.corners(&mesh.faces()[face], Some(&*transform));
        Self {
            aabb: Aabb::encompass_points(corners).min_padded(AABB_PADDING),
            mesh,
            face,
            transform,
            object_index,
        }
    }
}

impl Primitive for InstancedTrianglePrimitive {
    fn aabb(&self) -> Aabb { self.aabb }

    fn intersect(&self, ray: &Ray, interval: &Interval<Number>) -> Option<PrimitiveHit> {
        let face = &self.mesh.faces()[self.face];
        intersect_triangle(self.mesh.corners(face, Some(&*self.transform)), ray, interval)
    }

    fn surface(&self, ray: &Ray, hit: &PrimitiveHit) -> SurfacePoint {
        let corners = self.mesh.corners(&self.mesh.faces()[self.face], Some(&*self.transform));
        self.mesh
            .surface(self.face, corners, ray, hit, Some(&*self.transform), self.object_index)
    }

    fn material(&self) -> Option<&MaterialRef> { self.mesh.faces()[self.face].material.as_ref() }

    fn object_index(&self) -> u32 { self.object_index }
}
