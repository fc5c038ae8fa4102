use crate::core::types::{Number, Point2, Point3, Vector3};
use crate::material::MaterialRef;
use crate::mesh::transform::ObjectTransform;
use crate::mesh::{MeshError, MeshKind};
use crate::shared::intersect::{PrimitiveHit, SurfacePoint};
use crate::shared::ray::Ray;
use derivative::Derivative;
use getset::{CopyGetters, Getters};
use std::array;

/// A single face of a mesh
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Face {
    /// Offsets into the owning mesh's point sequence
    pub vertices: [u32; 3],
    /// Per-corner offsets into the owning mesh's normal sequence. Unassigned corners use the face normal
    pub normals: [Option<u32>; 3],
    /// Geometric normal, computed when the mesh is finished
    pub normal: Vector3,
    #[derivative(Debug = "ignore")]
    pub material: Option<MaterialRef>,
}

impl Face {
    pub fn new(vertices: [u32; 3], material: Option<MaterialRef>) -> Self {
        Self {
            vertices,
            normals: [None; 3],
            normal: Vector3::ZERO,
            material,
        }
    }
}

/// Sequence lengths of a [MeshData] at some point during construction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct DataLengths {
    points: usize,
    faces: usize,
    uv_offsets: usize,
    uv_values: usize,
}

/// Vertex, normal, face and UV storage for a mesh
///
/// When the mesh has orco, `points` interleaves each position with its original coordinate,
/// and face vertex offsets are doubled to skip over the orco entries.
/// Bezier meshes store three control points per logical vertex, and faces reference the first of each triple.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct MeshData {
    #[getset(get_copy = "pub")]
    kind: MeshKind,
    #[getset(get = "pub")]
    pub(crate) points: Vec<Point3>,
    #[getset(get = "pub")]
    pub(crate) normals: Vec<Vector3>,
    #[getset(get = "pub")]
    pub(crate) faces: Vec<Face>,
    /// Three offsets into `uv_values` per face, in face order
    #[getset(get = "pub")]
    pub(crate) uv_offsets: Vec<u32>,
    #[getset(get = "pub")]
    pub(crate) uv_values: Vec<Point2>,
    #[getset(get_copy = "pub")]
    has_orco: bool,
    #[getset(get_copy = "pub")]
    has_uv: bool,
    #[getset(get_copy = "pub")]
    pub(crate) is_smooth: bool,
    #[getset(get_copy = "pub")]
    pub(crate) normals_exported: bool,
}

impl MeshData {
    pub fn new(kind: MeshKind, vertex_count: usize, face_count: usize, has_orco: bool, has_uv: bool) -> Self {
        // Orco is stored interleaved, and bezier meshes carry three control points per vertex
        let point_count = match kind {
            MeshKind::Bezier => vertex_count * 3,
            _ if has_orco => vertex_count * 2,
            _ => vertex_count,
        };
        Self {
            kind,
            points: Vec::with_capacity(point_count),
            normals: Vec::new(),
            faces: Vec::with_capacity(face_count),
            uv_offsets: Vec::with_capacity(if has_uv { face_count * 3 } else { 0 }),
            uv_values: Vec::new(),
            has_orco,
            has_uv,
            is_smooth: false,
            normals_exported: false,
        }
    }

    /// How many consecutive points a face vertex offset spans
    pub fn stride(&self) -> usize {
        match self.kind {
            MeshKind::Bezier => 3,
            _ if self.has_orco => 2,
            _ => 1,
        }
    }

    pub(crate) fn lengths(&self) -> DataLengths {
        DataLengths {
            points: self.points.len(),
            faces: self.faces.len(),
            uv_offsets: self.uv_offsets.len(),
            uv_values: self.uv_values.len(),
        }
    }

    /// Drops everything appended since `lengths` was taken
    pub(crate) fn truncate(&mut self, lengths: DataLengths) {
        self.points.truncate(lengths.points);
        self.faces.truncate(lengths.faces);
        self.uv_offsets.truncate(lengths.uv_offsets);
        self.uv_values.truncate(lengths.uv_values);
    }

    /// Checks every face against the stored sequences, then computes the face normals
    pub fn finish(&mut self) -> Result<(), MeshError> {
        if self.has_uv && self.uv_offsets.len() != self.faces.len() * 3 {
            return Err(MeshError::UvOffsetMismatch {
                expected: self.faces.len() * 3,
                actual: self.uv_offsets.len(),
            });
        }

        let stride = self.stride();
        for (face_idx, face) in self.faces.iter().enumerate() {
            for index in face.vertices {
                if index as usize + stride > self.points.len() {
                    return Err(MeshError::InvalidVertexIndex {
                        face: face_idx,
                        index,
                        count: self.points.len(),
                    });
                }
            }
            for index in face.normals.into_iter().flatten() {
                if index as usize >= self.normals.len() {
                    return Err(MeshError::InvalidNormalIndex {
                        face: face_idx,
                        index,
                        count: self.normals.len(),
                    });
                }
            }
            if self.has_uv {
                for &index in &self.uv_offsets[face_idx * 3..face_idx * 3 + 3] {
                    if index as usize >= self.uv_values.len() {
                        return Err(MeshError::InvalidUvIndex {
                            face: face_idx,
                            index,
                            count: self.uv_values.len(),
                        });
                    }
                }
            }
        }

        for face in &mut self.faces {
            let [a, b, c] = face.vertices.map(|i| self.points[i as usize]);
            face.normal = (b - a).cross(c - a).normalize_or_zero();
        }
        Ok(())
    }

    /// Corner positions of a face, optionally moved into world space
    pub(crate) fn corners(&self, face: &Face, transform: Option<&ObjectTransform>) -> [Point3; 3] {
        let p = face.vertices.map(|i| self.points[i as usize]);
        match transform {
            None => p,
            Some(t) => p.map(|p| t.point(p)),
        }
    }

    /// Reconstructs the surface at a hit on face `face_idx`, whose (world-space) corners were `corners`
    pub(crate) fn surface(
        &self,
        face_idx: usize,
        corners: [Point3; 3],
        ray: &Ray,
        hit: &PrimitiveHit,
        transform: Option<&ObjectTransform>,
        object_index: u32,
    ) -> SurfacePoint {
        let face = &self.faces[face_idx];
        let [a, b, c] = corners;
        let geometric_normal = (b - a).cross(c - a).normalize_or_zero();
        let w = [1. - hit.u - hit.v, hit.u, hit.v];
        let blend3 = |v: [Point3; 3]| v[0] * w[0] + v[1] * w[1] + v[2] * w[2];

        let normal = if self.is_smooth || self.normals_exported {
            let corner_normals: [Vector3; 3] = array::from_fn(|k| match face.normals[k] {
                Some(n) => {
                    let n = self.normals[n as usize];
                    transform.map_or(n, |t| t.normal(n))
                }
                None => geometric_normal,
            });
            blend3(corner_normals).try_normalize().unwrap_or(geometric_normal)
        } else {
            geometric_normal
        };

        let uv = self.has_uv.then(|| {
            let offsets = &self.uv_offsets[face_idx * 3..face_idx * 3 + 3];
            let uvs: [Point2; 3] = array::from_fn(|k| self.uv_values[offsets[k] as usize]);
            uvs[0] * w[0] + uvs[1] * w[1] + uvs[2] * w[2]
        });

        let orco = (self.has_orco && self.kind != MeshKind::Bezier)
            .then(|| blend3(face.vertices.map(|i| self.points[i as usize + 1])));

        SurfacePoint {
            pos: ray.at(hit.dist),
            dist: hit.dist,
            geometric_normal,
            normal,
            front_face: ray.dir().dot(geometric_normal) < 0.,
            uv,
            orco,
            object_index,
            material: face.material.clone(),
        }
    }

    /// Blends the three control points of each face corner at time `t`, as a quadratic bezier
    pub(crate) fn bezier_corners(&self, face: &Face, t: Number) -> [Point3; 3] {
        let (b0, b1, b2) = ((1. - t) * (1. - t), 2. * t * (1. - t), t * t);
        face.vertices.map(|i| {
            let i = i as usize;
            self.points[i] * b0 + self.points[i + 1] * b1 + self.points[i + 2] * b2
        })
    }
}
