use crate::core::types::{Number, Point3, Vector3};
use crate::shared::intersect::SurfacePoint;
use crate::shared::interval::Interval;
use crate::shared::ray::Ray;
use approx::*;
use std::borrow::Borrow;

macro_rules! debug_assert_only {
    () => {
        if cfg!(not(debug_assertions)) {
            return;
        }
    };
}

pub const EPSILON: Number = 1e-6;
pub const RELATIVE: Number = 1e-3;

#[inline(always)]
#[track_caller]
pub fn number(val: impl Borrow<Number>) {
    debug_assert_only!();

    let val = val.borrow();
    assert!(!val.is_nan(), "should not be nan; val: {val}");
}

#[inline(always)]
#[track_caller]
pub fn normal3(n: impl Borrow<Vector3>) {
    debug_assert_only!();
    let n = n.borrow();
    vector3(n);
    assert!(
        n.is_normalized(),
        "should be normalised; vec: {n:?}, len: {:?}",
        n.length()
    );
}

#[inline(always)]
#[track_caller]
pub fn point3(v: impl Borrow<Point3>) {
    debug_assert_only!();
    let v = v.borrow();
    assert!(!v.is_nan(), "should not be nan; vec: {v:?}");
}

#[inline(always)]
#[track_caller]
pub fn vector3(v: impl Borrow<Vector3>) {
    debug_assert_only!();
    let v = v.borrow();
    assert!(!v.is_nan(), "should not be nan; vec: {v:?}");
}

#[inline(always)]
#[track_caller]
pub fn ray(r: impl Borrow<Ray>) {
    debug_assert_only!();
    let r = r.borrow();
    point3(r.pos());
    normal3(r.dir());
}

/// Asserts that a surface point is consistent with the ray that produced it
#[inline(always)]
#[track_caller]
pub fn surface(ray: impl Borrow<Ray>, sp: impl Borrow<SurfacePoint>, interval: impl Borrow<Interval<Number>>) {
    debug_assert_only!();

    let (ray, sp, interval) = (ray.borrow(), sp.borrow(), interval.borrow());

    point3(sp.pos);
    number(sp.dist);
    assert!(
        interval.contains(&sp.dist),
        "surface dist {} not in interval {}",
        sp.dist,
        interval
    );
    assert!(
        Point3::relative_eq(&sp.pos, &ray.at(sp.dist), EPSILON, RELATIVE),
        "surface position doesn't match ray at hit dist; pos: {pos:?}, dist: {dist}, ray: {ray:?}",
        pos = sp.pos,
        dist = sp.dist,
    );

    normal3(sp.geometric_normal);
    normal3(sp.normal);
}
