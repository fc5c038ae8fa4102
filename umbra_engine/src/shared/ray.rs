use crate::core::types::{Number, Point3, Vector3};

/// A ray with a parametric validity range and a sample time.
///
/// A negative `tmax` means the ray is unbounded.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Ray {
    pos: Point3,
    dir: Vector3,
    inv_dir: Vector3,
    tmin: Number,
    tmax: Number,
    time: Number,
}

impl Ray {
    pub fn new(pos: Point3, dir: Vector3) -> Self {
        let dir = dir.normalize();
        Self {
            pos,
            dir,
            inv_dir: dir.recip(),
            tmin: 0.,
            tmax: -1.,
            time: 0.,
        }
    }

    pub fn with_range(self, tmin: Number, tmax: Number) -> Self { Self { tmin, tmax, ..self } }

    pub fn with_time(self, time: Number) -> Self { Self { time, ..self } }

    pub fn with_pos(self, pos: Point3) -> Self { Self { pos, ..self } }

    /// World-space coordinate of the ray
    #[inline(always)]
    pub fn pos(&self) -> Point3 { self.pos }

    /// Direction vector of the ray.
    ///
    /// # Requirements
    /// Must be normalised
    #[inline(always)]
    pub fn dir(&self) -> Vector3 { self.dir }

    /// Component-wise reciprocal of [Self::dir]; axis-parallel rays produce infinities
    #[inline(always)]
    pub fn inv_dir(&self) -> Vector3 { self.inv_dir }

    #[inline(always)]
    pub fn tmin(&self) -> Number { self.tmin }

    #[inline(always)]
    pub fn tmax(&self) -> Number { self.tmax }

    /// Sample time in `0..=1`, used by moving primitives
    #[inline(always)]
    pub fn time(&self) -> Number { self.time }

    /// The furthest distance this ray may travel
    pub fn max_dist(&self) -> Number {
        if self.tmax < 0. {
            Number::INFINITY
        } else {
            self.tmax
        }
    }

    /// Gets the position at a given distance along the ray
    ///
    /// `pos + (t * dir)`
    pub fn at(&self, t: Number) -> Point3 { self.pos + (self.dir * t) }
}
