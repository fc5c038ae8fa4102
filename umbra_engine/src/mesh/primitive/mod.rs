//! Primitives are the smallest units the spatial index stores and tests rays against

use crate::core::types::{Number, Point3, Vector3};
use crate::material::MaterialRef;
use crate::shared::aabb::Aabb;
use crate::shared::intersect::{PrimitiveHit, SurfacePoint};
use crate::shared::interval::Interval;
use crate::shared::ray::Ray;
use crate::shared::ComponentRequirements;
use enum_dispatch::enum_dispatch;
use num_traits::Zero;

pub mod bezier;
pub mod dynamic;
pub mod instance;
pub mod triangle;

pub use self::{
    bezier::BezierTrianglePrimitive, dynamic::DynamicPrimitive, instance::InstancedTrianglePrimitive,
    triangle::TrianglePrimitive,
};

#[enum_dispatch]
pub trait Primitive: ComponentRequirements {
    /// World-space bounds, covering every sample time for moving primitives
    fn aabb(&self) -> Aabb;

    /// Tests the ray against the primitive, only accepting hits whose distance lies in `interval`
    fn intersect(&self, ray: &Ray, interval: &Interval<Number>) -> Option<PrimitiveHit>;

    /// Reconstructs the full surface for a hit previously returned by [Self::intersect] for the same ray
    fn surface(&self, ray: &Ray, hit: &PrimitiveHit) -> SurfacePoint;

    fn material(&self) -> Option<&MaterialRef>;

    /// Pass index of the object this primitive belongs to
    fn object_index(&self) -> u32;
}

/// An optimised implementation of [Primitive].
///
/// By using an enum, we can replace dynamic-dispatch with static dispatch.
/// Standalone objects that bring their own primitive types use the [DynamicPrimitive] variant.
#[enum_dispatch(Primitive)]
#[derive(Clone, Debug)]
pub enum PrimitiveInstance {
    TrianglePrimitive,
    InstancedTrianglePrimitive,
    BezierTrianglePrimitive,
    DynamicPrimitive,
}

/// Ray-triangle test, returning the distance and the barycentric weights of `v1` and `v2`
pub(crate) fn intersect_triangle(
    [v0, v1, v2]: [Point3; 3],
    ray: &Ray,
    interval: &Interval<Number>,
) -> Option<PrimitiveHit> {
    /*
    CREDITS:

    Title: "Ray-Tracing: Rendering a Triangle (Möller-Trumbore algorithm)"
    Author: Scratchapixel
    URL: <https://www.scratchapixel.com/lessons/3d-basic-rendering/ray-tracing-rendering-a-triangle/moller-trumbore-ray-triangle-intersection.html>
    */

    let v0v1 = v1 - v0;
    let v0v2 = v2 - v0;
    let p_vec = Vector3::cross(ray.dir(), v0v2);
    let det = v0v1.dot(p_vec);

    // ray and triangle are parallel, or the triangle is degenerate
    if det.is_zero() {
        return None;
    }

    let inv_det = 1. / det;

    let t_vec = ray.pos() - v0;
    let u = Vector3::dot(t_vec, p_vec) * inv_det;
    if !(0. ..=1.).contains(&u) {
        return None;
    }

    let q_vec = Vector3::cross(t_vec, v0v1);
    let v = Vector3::dot(ray.dir(), q_vec) * inv_det;
    if v < 0. || u + v > 1. {
        return None;
    }
    let dist = Vector3::dot(v0v2, q_vec) * inv_det;

    if !interval.contains(&dist) {
        return None;
    }

    Some(PrimitiveHit { dist, u, v })
}
