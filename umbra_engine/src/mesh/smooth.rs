//! Turns face normals into per-vertex normals.
//!
//! Each face contributes to a vertex in proportion to the sine of its corner angle there,
//! so thin slivers barely affect the result.

use crate::core::targets::SMOOTH;
use crate::core::types::{Number, Vector3};
use crate::mesh::MeshData;
use crate::shared::math::sin_from_vectors;
use puffin::profile_function;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Smoothing angles at or above this merge every face at a vertex
pub const FULL_SMOOTH_ANGLE: Number = 180.;
/// Smoothing angles at or below this are treated as "no smoothing"
pub const MIN_SMOOTH_ANGLE: Number = 0.1;
/// Two candidate vertex normals closer than this (by dot product) share a slot
const DUPLICATE_NORMAL_DOT: Number = 0.999;

/// Outcome of [smooth_normals]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Smoothed {
    /// Normals were computed, and the mesh is now smooth
    Computed,
    /// The angle was too small to smooth anything; the mesh is unchanged
    Skipped,
    /// The mesh already carries a normal per point, which are kept as they are
    Exported,
}

/// Sine weights of the three corners of a face
fn corner_weights(data: &MeshData, vertices: [u32; 3]) -> [Number; 3] {
    let [a, b, c] = vertices.map(|i| data.points[i as usize]);
    [
        sin_from_vectors(b - a, c - a),
        sin_from_vectors(a - b, c - b),
        sin_from_vectors(a - c, b - c),
    ]
}

/// Replaces the mesh's normals with smoothed vertex normals.
///
/// With `angle_deg >= 180` every vertex gets one normal shared by all its faces.
/// Between the limits, faces at a vertex are only merged with neighbours whose normals are within the angle,
/// and a corner with no such neighbour is left unassigned (flat).
///
/// A mesh whose exported normals cover every point keeps them, and is only marked smooth.
///
/// The mesh must already be finished, so that face normals are known.
pub fn smooth_normals(data: &mut MeshData, angle_deg: Number) -> Smoothed {
    profile_function!();

    if data.normals_exported && data.normals.len() == data.points.len() {
        debug!(target: SMOOTH, "mesh has exported normals, keeping them");
        data.is_smooth = true;
        return Smoothed::Exported;
    }

    if angle_deg <= MIN_SMOOTH_ANGLE {
        debug!(target: SMOOTH, angle_deg, "smoothing angle too small, skipping");
        return Smoothed::Skipped;
    }

    let point_count = data.points.len();
    data.normals.clear();
    data.faces.iter_mut().for_each(|f| f.normals = [None; 3]);

    if angle_deg >= FULL_SMOOTH_ANGLE {
        data.normals.resize(point_count, Vector3::ZERO);
        for face_idx in 0..data.faces.len() {
            let vertices = data.faces[face_idx].vertices;
            let weights = corner_weights(data, vertices);
            let face_normal = data.faces[face_idx].normal;
            for (&v, w) in vertices.iter().zip(weights) {
                data.normals[v as usize] += face_normal * w;
            }
            data.faces[face_idx].normals = vertices.map(Some);
        }
        data.normals
            .iter_mut()
            .for_each(|n| *n = n.normalize_or_zero());
    } else {
        let cos_angle = angle_deg.to_radians().cos();

        // Incident faces and corner weights, per vertex
        let mut incident: Vec<SmallVec<[(usize, Number); 8]>> = vec![SmallVec::new(); point_count];
        for (face_idx, face) in data.faces.iter().enumerate() {
            for (&v, w) in face.vertices.iter().zip(corner_weights(data, face.vertices)) {
                incident[v as usize].push((face_idx, w));
            }
        }

        for (vertex, faces) in incident.iter().enumerate() {
            // Normal slots already emitted for this vertex
            let mut emitted = SmallVec::<[u32; 4]>::new();
            for (j, &(face_idx, weight)) in faces.iter().enumerate() {
                let face_normal = data.faces[face_idx].normal;
                let mut normal = face_normal * weight;
                let mut grouped = false;
                for (k, &(other_idx, other_weight)) in faces.iter().enumerate() {
                    if k == j {
                        continue;
                    }
                    let other_normal = data.faces[other_idx].normal;
                    if face_normal.dot(other_normal) > cos_angle {
                        grouped = true;
                        normal += other_normal * other_weight;
                    }
                }
                if !grouped {
                    continue;
                }

                let normal = normal.normalize_or_zero();
                let slot = match emitted
                    .iter()
                    .copied()
                    .find(|&slot| data.normals[slot as usize].dot(normal) > DUPLICATE_NORMAL_DOT)
                {
                    Some(slot) => slot,
                    None => {
                        data.normals.push(normal);
                        let slot = (data.normals.len() - 1) as u32;
                        emitted.push(slot);
                        slot
                    }
                };

                let face = &mut data.faces[face_idx];
                if let Some(corner) = face.vertices.iter().position(|&v| v as usize == vertex) {
                    face.normals[corner] = Some(slot);
                }
            }
        }
    }

    data.is_smooth = true;
    trace!(target: SMOOTH, angle_deg, normals = data.normals.len(), "smoothed mesh");
    Smoothed::Computed
}
