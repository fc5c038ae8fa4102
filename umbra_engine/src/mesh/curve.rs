//! Expands a polyline of strand points into a closed triangular tube

use crate::core::targets::MESH;
use crate::core::types::{Number, Point2, Vector3};
use crate::material::MaterialRef;
use crate::mesh::data::Face;
use crate::mesh::{MeshData, MeshError};
use crate::shared::math::orthonormal_basis;
use serde::{Deserialize, Serialize};
use tracing::trace;
use valuable::Valuable;

/// Radius profile of a strand
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Valuable)]
pub struct StrandShape {
    /// Radius at the first point
    pub start: Number,
    /// Radius at the last point
    pub end: Number,
    /// Bias of the interpolation in `-1..=1`. Negative values stay close to `start` for longer,
    /// positive values move away from `start` sooner; `0` is linear
    pub shape: Number,
}

impl StrandShape {
    /// Tube radius at point `i` of a strand with `n` points
    pub fn radius(&self, i: usize, n: usize) -> Number {
        let last = (n - 1) as Number;
        let t = if self.shape < 0. {
            (i as Number / last).powf(1. + self.shape)
        } else {
            1. - ((n - i - 1) as Number / last).powf(1. - self.shape)
        };
        self.start + t * (self.end - self.start)
    }
}

/// Appends the tube around the mesh's current points: two extra points per strand point,
/// a six-face ring per segment, and a cap at each end.
///
/// The existing points are the centreline. Each ring face gets 1-D UVs that run from `0` to `1` along the strand.
/// Returns the index of the last face added.
pub(crate) fn tessellate(
    data: &mut MeshData,
    strand: StrandShape,
    material: Option<MaterialRef>,
) -> Result<usize, MeshError> {
    let n = data.points.len();
    if n < 2 {
        return Err(MeshError::TooFewCurvePoints { count: n });
    }
    trace!(target: MESH, points = n, ?strand, "tessellating strand");

    // Ring offsets; segment direction comes from the next point, the last point reuses the previous frame
    let (mut u, mut v) = orthonormal_basis(Vector3::Z);
    let side = 1.5 / Number::sqrt(3.);
    for i in 0..n {
        let o = data.points[i];
        if i < n - 1 {
            if let Some(dir) = (data.points[i + 1] - o).try_normalize() {
                (u, v) = orthonormal_basis(dir);
            }
        }
        let r = strand.radius(i, n);
        let a = o - (0.5 * r * v) - (side * r * u);
        let b = o - (0.5 * r * v) + (side * r * u);
        data.points.push(a);
        data.points.push(b);
    }

    let push_uv = |data: &mut MeshData, s: Number| {
        data.uv_values.push(Point2::splat(s));
        (data.uv_values.len() - 1) as u32
    };
    let push_face = |data: &mut MeshData, vertices: [usize; 3], uvs: [u32; 3]| {
        data.faces
            .push(Face::new(vertices.map(|i| i as u32), material.clone()));
        data.uv_offsets.extend(uvs);
        data.faces.len() - 1
    };

    let step = 1. / (n - 1) as Number;
    let mut iv = 0;
    for i in 0..n - 1 {
        let su = i as Number * step;
        let iu = push_uv(data, su);
        iv = push_uv(data, su + step);

        let (a1, a2) = (i, 2 * i + n);
        let a3 = a2 + 1;
        let (b1, b2) = (i + 1, a2 + 2);
        let b3 = b2 + 1;

        if i == 0 {
            push_face(data, [a1, a3, a2], [iu; 3]);
        }
        push_face(data, [a1, b2, b1], [iu, iv, iv]);
        push_face(data, [a1, a2, b2], [iu, iu, iv]);
        push_face(data, [a2, b3, b2], [iu, iv, iv]);
        push_face(data, [a2, a3, b3], [iu, iu, iv]);
        push_face(data, [b3, a3, a1], [iv, iu, iu]);
        push_face(data, [b3, a1, b1], [iv, iu, iv]);
    }

    let i = n - 1;
    let last_face = push_face(data, [i, 2 * i + n, 2 * i + n + 1], [iv; 3]);
    Ok(last_face)
}
