//! Helpers for moving instanced geometry between object space and world space
//!
//! # Terminology
//!
//! ## Transform
//! The 4x4 matrix from object-space to world-space; e.g. [Matrix4::from_scale()] with a scale of
//! `Vector3::splat(2.)` would cause the object to appear twice as large.
//!
//! ## Inverse Transform
//! The matrix inverse of `transform`: world-space back to object-space.

use crate::core::types::{Matrix4, Point3, Vector3};
use crate::shared::ray::Ray;
use getset::CopyGetters;

/// A struct that holds a [Matrix4], its inverse, and the matrix used for normals
#[derive(Copy, Clone, Debug, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ObjectTransform {
    transform: Matrix4,
    inv_transform: Matrix4,
    /// Inverse-transpose of `transform`; keeps normals perpendicular under non-uniform scale
    normal_transform: Matrix4,
}

impl ObjectTransform {
    /// Creates a new transform. Returns [None] if the matrix can't be inverted
    pub fn new(transform: Matrix4) -> Option<Self> {
        let det = transform.determinant();
        if det == 0. || !det.is_finite() {
            return None;
        }
        let inv_transform = transform.inverse();
        Some(Self {
            transform,
            inv_transform,
            normal_transform: inv_transform.transpose(),
        })
    }

    pub fn point(&self, p: Point3) -> Point3 { self.transform.transform_point3(p) }

    /// Transforms a normal into world space, renormalising it
    pub fn normal(&self, n: Vector3) -> Vector3 { self.normal_transform.transform_vector3(n).normalize_or_zero() }

    /// Transforms the incoming ray from world-space to object-space, using the inverse transform
    ///
    /// The direction is renormalised, so distances along the returned ray are object-space distances.
    pub fn incoming_ray(&self, incoming_ray: &Ray) -> Ray {
        Ray::new(
            self.inv_transform.transform_point3(incoming_ray.pos()),
            self.inv_transform.transform_vector3(incoming_ray.dir()),
        )
        .with_time(incoming_ray.time())
    }
}
