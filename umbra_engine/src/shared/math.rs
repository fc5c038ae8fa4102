use crate::core::types::{Number, Vector3};
use strum_macros::Display;

/// One of the three coordinate axes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Cycles to the next axis, wrapping `Z` back to `X`
    pub fn next(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::Z,
            Self::Z => Self::X,
        }
    }
}

/// Sine of the angle between two vectors, in `0..=1`.
///
/// Zero-length inputs give `0`
pub fn sin_from_vectors(a: Vector3, b: Vector3) -> Number {
    let denom = a.length() * b.length();
    if denom <= 0. {
        return 0.;
    }
    (a.cross(b).length() / denom).min(1.)
}

/// Builds two tangent vectors `(u, v)` that form a right-handed orthonormal basis with `n`.
///
/// `n` must be normalised.
pub fn orthonormal_basis(n: Vector3) -> (Vector3, Vector3) {
    if n.x == 0. && n.y == 0. {
        let u = if n.z < 0. { -Vector3::X } else { Vector3::X };
        return (u, Vector3::Y);
    }
    let d = 1. / Number::sqrt(n.x * n.x + n.y * n.y);
    let u = Vector3::new(n.y * d, -n.x * d, 0.);
    let v = n.cross(u);
    (u, v)
}
