use std::borrow::Borrow;

use getset::*;

use crate::core::types::{Number, Point3, Vector3};
use crate::shared::interval::Interval;
use crate::shared::math::Axis;
use crate::shared::ray::Ray;

/// Minimum thickness of a primitive's box; keeps flat triangles hittable by the slab test
pub const AABB_PADDING: Number = 1e-7;

/// An **Axis-Aligned Bounding Box** (AABB)
///
/// The box spans between the two corners `min` and `max`'
#[derive(CopyGetters, Copy, Clone, Debug, PartialEq, Default)]
#[getset(get_copy = "pub")]
pub struct Aabb {
    /// The lower corner of the [Aabb]; the corner with the smallest coordinates
    min: Point3,
    /// The upper corner of the [Aabb]; the corner with the largest coordinates
    max: Point3,
    /// The difference between [min](fn@Self::min) and [max](fn@Self::max); how large the [Aabb] is
    size: Vector3,
    area: Number,
}

// region Constructors

impl Aabb {
    /// Creates a new [Aabb] from two points, which do *not* have to be sorted by min/max
    pub fn new(a: impl Into<Point3>, b: impl Into<Point3>) -> Self {
        let (a, b) = (a.into(), b.into());
        let min = Point3::min(a, b);
        let max = Point3::max(a, b);
        let size = max - min;
        let area = ((size.x * size.y) + (size.y * size.z) + (size.z * size.x)) * 2.;
        Self { min, max, size, area }
    }

    pub fn new_centred(centre: impl Into<Point3>, size: impl Into<Vector3>) -> Self {
        let (centre, size) = (centre.into(), size.into());
        Self::new(centre - size / 2., centre + size / 2.)
    }

    /// Returns an [Aabb] that surrounds the two given boxes
    pub fn encompass(a: impl Borrow<Self>, b: impl Borrow<Self>) -> Self {
        let (a, b) = (a.borrow(), b.borrow());
        Self::new(Point3::min(a.min, b.min), Point3::max(a.max, b.max))
    }

    /// [Self::encompass] but for an arbitrary number of boxes. Empty iterators have no bounds
    pub fn encompass_iter<B: Borrow<Self>>(iter: impl IntoIterator<Item = B>) -> Option<Self> {
        iter.into_iter()
            .map(|b| *b.borrow())
            .reduce(|a, b| Self::encompass(a, b))
    }

    /// [Self::encompass] but for an arbitrary number of points
    pub fn encompass_points<B: Borrow<Point3>>(iter: impl IntoIterator<Item = B>) -> Self {
        let mut min = Point3::splat(Number::INFINITY);
        let mut max = Point3::splat(Number::NEG_INFINITY);
        for p in iter.into_iter() {
            let p = *p.borrow();
            min = min.min(p);
            max = max.max(p);
        }
        Self::new(min, max)
    }

    /// Ensures that an AABB has all sides of at least `thresh` thickness.
    /// If any side widths between corners are less than this threshold, the [Aabb] will
    /// be expanded (away from the centre) to fit.
    pub fn min_padded(&self, thresh: Number) -> Self {
        let centre = self.min + self.size / 2.;
        Self::new_centred(centre, self.size.max(Vector3::splat(thresh)))
    }

    /// Splits the box with a plane perpendicular to `axis`, returning the `(below, above)` halves
    pub fn split(&self, axis: Axis, pos: Number) -> (Self, Self) {
        let (mut below_max, mut above_min) = (self.max, self.min);
        below_max[axis.index()] = pos;
        above_min[axis.index()] = pos;
        (Self::new(self.min, below_max), Self::new(above_min, self.max))
    }
}

// endregion Constructors

// region Helper

impl Aabb {
    /// The axis along which the box is widest
    pub fn longest_axis(&self) -> Axis {
        let s = self.size;
        if s.x >= s.y && s.x >= s.z {
            Axis::X
        } else if s.y >= s.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    pub fn centre(&self) -> Point3 { self.min + self.size / 2. }
}

// endregion Helper

// region Impl

impl Aabb {
    /// Returns the distances at which the ray enters and leaves the box, clipped to `interval`.
    ///
    /// Returns [None] if the ray misses the box, or the overlap lies outside the interval
    pub fn hit_range(&self, ray: &Ray, interval: &Interval<Number>) -> Option<(Number, Number)> {
        /*
        CREDITS:

        Author: Tavianator
        URL:
            - <https://tavianator.com/cgit/dimension.git/tree/libdimension/bvh/bvh.c#n196>
            - <https://tavianator.com/2011/ray_box.html>
        */

        // Rays parallel to an axis produce infinities here, which still compare correctly:
        // outside the slab gives tmin == inf or tmax == -inf, inside leaves both unchanged.

        let tx1 = (self.min.x - ray.pos().x) * ray.inv_dir().x;
        let tx2 = (self.max.x - ray.pos().x) * ray.inv_dir().x;

        let mut tmin = Number::min(tx1, tx2);
        let mut tmax = Number::max(tx1, tx2);

        let ty1 = (self.min.y - ray.pos().y) * ray.inv_dir().y;
        let ty2 = (self.max.y - ray.pos().y) * ray.inv_dir().y;

        tmin = Number::max(tmin, Number::min(ty1, ty2));
        tmax = Number::min(tmax, Number::max(ty1, ty2));

        let tz1 = (self.min.z - ray.pos().z) * ray.inv_dir().z;
        let tz2 = (self.max.z - ray.pos().z) * ray.inv_dir().z;

        tmin = Number::max(tmin, Number::min(tz1, tz2));
        tmax = Number::min(tmax, Number::max(tz1, tz2));

        let clipped = Interval::from(tmin..=tmax) & *interval;
        match clipped {
            Interval {
                start: Some(start),
                end: Some(end),
            } if start <= end => Some((start, end)),
            _ => None,
        }
    }
}

// endregion Impl
