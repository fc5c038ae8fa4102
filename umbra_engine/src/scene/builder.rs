//! The construction protocol that turns a stream of builder calls into scene objects.
//!
//! Calls nest as `Ready -> Geometry -> Object`. Every call checks the current state first, and a call made in the
//! wrong state fails without touching anything. The builder doesn't own the objects it builds; each call is handed
//! the [ObjectTable] to work on.

use crate::core::targets::BUILDER;
use crate::core::types::{Matrix4, Number, Point2, Point3, Vector3};
use crate::material::MaterialRef;
use crate::mesh::curve::{self, StrandShape};
use crate::mesh::data::Face;
use crate::mesh::smooth::{smooth_normals, Smoothed};
use crate::mesh::transform::ObjectTransform;
use crate::mesh::{
    GenericMesh, Geometry, GeometryObject, MeshData, MeshError, MeshFlags, MeshKind, ObjectKind, TriangleMesh,
    TriangleMeshInstance,
};
use crate::scene::object_table::{ObjectId, ObjectKey, ObjectRecord, ObjectTable};
use crate::scene::opts::RenderMode;
use bitflags::bitflags;
use smallvec::SmallVec;
use strum_macros::Display;
use thiserror::Error;
use tracing::{error, trace, warn};

/// Where in the construction protocol the builder currently is
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum BuildState {
    Ready,
    Geometry,
    Object,
}

bitflags! {
    /// What changed since the scene was last updated
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Changes: u32 {
        const GEOMETRY = 1 << 0;
        const LIGHT = 1 << 1;
        const OTHER = 1 << 2;
    }
}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum BuildError {
    #[error("{operation} needs the builder in state {expected}, but it is in state {actual}")]
    WrongState {
        operation: &'static str,
        expected: BuildState,
        actual: BuildState,
    },
    #[error("no object is under construction")]
    NoObject,
    #[error("no object with id {0}")]
    UnknownObject(ObjectId),
    #[error("object {0} is still under construction")]
    UnfinishedObject(ObjectId),
    #[error("object {id} is a {kind}, but a triangle mesh is required")]
    NotATriangleMesh { id: ObjectId, kind: ObjectKind },
    #[error("{operation} is only supported in {expected} mode")]
    WrongRenderMode {
        operation: &'static str,
        expected: RenderMode,
    },
    #[error("instance transform is not invertible")]
    SingularTransform,
    #[error("no free object ids left")]
    IdsExhausted,
    #[error("mesh already has the maximum number of UV values")]
    TooManyUvs,
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Parameters for [Builder::begin_tri_mesh]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MeshParams {
    /// Expected number of vertices, used to reserve storage
    pub vertices: usize,
    /// Expected number of faces, used to reserve storage
    pub faces: usize,
    pub has_orco: bool,
    pub has_uv: bool,
    pub kind: MeshKind,
    pub flags: MeshFlags,
    /// Pass index reported for hits on this mesh
    pub object_index: u32,
}

impl MeshParams {
    /// A plain, visible triangle mesh without orco or UVs
    pub fn triangles(vertices: usize, faces: usize) -> Self {
        Self {
            vertices,
            faces,
            has_orco: false,
            has_uv: false,
            kind: MeshKind::Triangle,
            flags: MeshFlags::empty(),
            object_index: 0,
        }
    }
}

/// The scene-construction state machine
#[derive(Clone, Debug)]
pub struct Builder {
    stack: SmallVec<[BuildState; 3]>,
    changes: Changes,
    /// The object being built, or the last one built once it has ended
    current: Option<ObjectKey>,
    /// Whether the current object interleaves orco with its points
    orco: bool,
    last_face: Option<usize>,
    mode: RenderMode,
}

impl Default for Builder {
    fn default() -> Self { Self::new() }
}

impl Builder {
    /// A builder in the `Ready` state. Every change flag starts set, so the first update does a full rebuild
    pub fn new() -> Self {
        Self {
            stack: SmallVec::new(),
            changes: Changes::all(),
            current: None,
            orco: false,
            last_face: None,
            mode: RenderMode::default(),
        }
    }

    pub fn state(&self) -> BuildState { self.stack.last().copied().unwrap_or(BuildState::Ready) }

    pub fn changes(&self) -> Changes { self.changes }

    pub fn mark_changed(&mut self, changes: Changes) { self.changes |= changes; }

    pub fn clear_changes(&mut self) { self.changes = Changes::empty(); }

    pub fn mode(&self) -> RenderMode { self.mode }

    pub fn set_mode(&mut self, mode: RenderMode) {
        if mode != self.mode {
            self.mode = mode;
            self.changes |= Changes::GEOMETRY;
        }
    }

    /// The object under construction, or the most recently finished one
    pub fn current(&self) -> Option<ObjectKey> { self.current }

    /// Index of the face most recently added to the current object
    pub fn last_face(&self) -> Option<usize> { self.last_face }

    fn require(&self, operation: &'static str, expected: BuildState) -> Result<(), BuildError> {
        let actual = self.state();
        if actual == expected {
            return Ok(());
        }
        warn!(target: BUILDER, operation, %expected, %actual, "builder call made in the wrong state");
        Err(BuildError::WrongState {
            operation,
            expected,
            actual,
        })
    }

    fn current_record<'t>(&self, table: &'t mut ObjectTable) -> Result<&'t mut ObjectRecord, BuildError> {
        self.current
            .and_then(|key| table.get_mut(key))
            .ok_or(BuildError::NoObject)
    }

    fn begin_object(&mut self, table: &mut ObjectTable, id: ObjectId, object: GeometryObject, orco: bool) -> ObjectKey {
        let key = table.insert_unfinished(id, object);
        self.stack.push(BuildState::Object);
        self.changes |= Changes::GEOMETRY;
        self.current = Some(key);
        self.orco = orco;
        self.last_face = None;
        key
    }

    // region Geometry block

    pub fn begin_geometry(&mut self) -> Result<(), BuildError> {
        self.require("begin_geometry", BuildState::Ready)?;
        self.stack.push(BuildState::Geometry);
        Ok(())
    }

    pub fn end_geometry(&mut self) -> Result<(), BuildError> {
        self.require("end_geometry", BuildState::Geometry)?;
        self.stack.pop();
        Ok(())
    }

    // endregion

    // region Meshes

    /// Starts a mesh under `id`, replacing any object that already has that id
    pub fn begin_tri_mesh(
        &mut self,
        table: &mut ObjectTable,
        id: ObjectId,
        params: MeshParams,
    ) -> Result<ObjectKey, BuildError> {
        self.require("begin_tri_mesh", BuildState::Geometry)?;
        trace!(target: BUILDER, %id, ?params, "begin mesh");

        let data = MeshData::new(params.kind, params.vertices, params.faces, params.has_orco, params.has_uv);
        let object = match params.kind {
            MeshKind::Triangle => GeometryObject::Triangle(TriangleMesh::new(data, params.flags, params.object_index)),
            MeshKind::VTriangle | MeshKind::Bezier => {
                GeometryObject::Generic(GenericMesh::new(data, params.flags, params.object_index))
            }
        };
        Ok(self.begin_object(table, id, object, params.has_orco))
    }

    /// Finishes the current mesh, validating its faces and computing face normals.
    ///
    /// On failure the mesh stays under construction, and is left out of the scene until a later call succeeds.
    pub fn end_tri_mesh(&mut self, table: &mut ObjectTable) -> Result<(), BuildError> {
        self.require("end_tri_mesh", BuildState::Object)?;
        let record = self.current_record(table)?;
        if let Err(err) = record.object_mut().finish() {
            error!(target: BUILDER, id = %record.id(), %err, "could not finish mesh");
            return Err(err.into());
        }
        self.finish_current(table);
        Ok(())
    }

    fn finish_current(&mut self, table: &mut ObjectTable) {
        if let Some(key) = self.current {
            table.mark_finished(key);
        }
        self.stack.pop();
    }

    /// Starts a curve under `id`. Vertices added afterwards form the curve's centreline
    pub fn begin_curve_mesh(
        &mut self,
        table: &mut ObjectTable,
        id: ObjectId,
        vertices: usize,
        object_index: u32,
    ) -> Result<ObjectKey, BuildError> {
        self.require("begin_curve_mesh", BuildState::Geometry)?;
        trace!(target: BUILDER, %id, vertices, "begin curve");

        let faces = 6 * vertices.saturating_sub(1) + 2;
        let mut data = MeshData::new(MeshKind::Triangle, vertices, faces, false, true);
        data.points.reserve(2 * vertices);
        let object = GeometryObject::Triangle(TriangleMesh::new(data, MeshFlags::empty(), object_index));
        Ok(self.begin_object(table, id, object, false))
    }

    /// Turns the centreline into a tube and finishes it. Returns the index of the last face.
    ///
    /// On failure the tube is taken off again, leaving the centreline as it was.
    pub fn end_curve_mesh(
        &mut self,
        table: &mut ObjectTable,
        material: Option<MaterialRef>,
        strand: StrandShape,
    ) -> Result<usize, BuildError> {
        self.require("end_curve_mesh", BuildState::Object)?;
        let record = self.current_record(table)?;
        let (id, kind) = (record.id(), record.object().kind());
        let GeometryObject::Triangle(mesh) = record.object_mut() else {
            error!(target: BUILDER, %id, %kind, "curve is not a triangle mesh");
            return Err(BuildError::NotATriangleMesh { id, kind });
        };

        let centreline = mesh.data().lengths();
        let last_face = match curve::tessellate(mesh.data_mut(), strand, material).and_then(|last| {
            mesh.finish()?;
            Ok(last)
        }) {
            Ok(last_face) => last_face,
            Err(err) => {
                error!(target: BUILDER, %id, %err, "could not build curve");
                mesh.data_mut().truncate(centreline);
                return Err(err.into());
            }
        };

        self.last_face = Some(last_face);
        self.finish_current(table);
        Ok(last_face)
    }

    // endregion

    // region Mesh contents

    /// Appends a vertex to the current object, returning its logical index.
    ///
    /// On a bezier mesh, every third vertex completes a control triple, and the middle point is converted
    /// in place into the quadratic bezier control point that makes the curve pass through it.
    /// On a mesh with orco, the position doubles as its own original coordinate.
    pub fn add_vertex(&mut self, table: &mut ObjectTable, p: Point3) -> Result<usize, BuildError> {
        self.require("add_vertex", BuildState::Object)?;
        let orco = self.orco;
        let record = self.current_record(table)?;
        let data = record.object_mut().data_mut().ok_or(BuildError::NoObject)?;

        let index = match data.kind() {
            MeshKind::Bezier => {
                let points = &mut data.points;
                points.push(p);
                let n = points.len();
                if n % 3 == 0 {
                    points[n - 2] = 2. * points[n - 2] - 0.5 * (points[n - 3] + points[n - 1]);
                }
                (n - 1) / 3
            }
            _ if orco => {
                data.points.extend([p, p]);
                (data.points.len() - 1) / 2
            }
            _ => {
                data.points.push(p);
                data.points.len() - 1
            }
        };
        record.last_vertex = Some(index);
        Ok(index)
    }

    /// Appends a vertex with its original coordinate. Meshes without orco, and bezier meshes, ignore `orco`
    pub fn add_vertex_with_orco(&mut self, table: &mut ObjectTable, p: Point3, orco: Point3) -> Result<usize, BuildError> {
        self.require("add_vertex", BuildState::Object)?;
        if !self.orco {
            return self.add_vertex(table, p);
        }
        let record = self.current_record(table)?;
        let data = record.object_mut().data_mut().ok_or(BuildError::NoObject)?;
        if data.kind() == MeshKind::Bezier {
            return self.add_vertex(table, p);
        }

        data.points.extend([p, orco]);
        let index = (data.points.len() - 1) / 2;
        record.last_vertex = Some(index);
        Ok(index)
    }

    /// Sets the exported normal of the most recently added vertex.
    ///
    /// Only supported in triangle mode, and only once per vertex: a normal that can't be placed is dropped with a
    /// warning, and `Ok(false)` is returned.
    pub fn add_normal(&mut self, table: &mut ObjectTable, n: Vector3) -> Result<bool, BuildError> {
        self.require("add_normal", BuildState::Object)?;
        if self.mode != RenderMode::Triangle {
            warn!(target: BUILDER, mode = %self.mode, "normal exporting is only supported in triangle mode");
            return Ok(false);
        }
        let record = self.current_record(table)?;
        let last_vertex = record.last_vertex;
        let data = record.object_mut().data_mut().ok_or(BuildError::NoObject)?;

        let point_count = data.points.len();
        let Some(vertex) = last_vertex.filter(|&v| point_count > v && point_count > data.normals.len()) else {
            warn!(target: BUILDER, ?last_vertex, normals = data.normals.len(), "dropping normal with no vertex to attach to");
            return Ok(false);
        };
        if data.normals.len() < point_count {
            data.normals.resize(point_count, Vector3::ZERO);
        }
        data.normals[vertex] = n;
        data.normals_exported = true;
        Ok(true)
    }

    /// Adds a face over the logical vertices `vertices`, returning its index
    pub fn add_face(
        &mut self,
        table: &mut ObjectTable,
        vertices: [u32; 3],
        material: Option<MaterialRef>,
    ) -> Result<usize, BuildError> {
        self.require("add_face", BuildState::Object)?;
        let orco = self.orco;
        let record = self.current_record(table)?;
        let data = record.object_mut().data_mut().ok_or(BuildError::NoObject)?;

        let mut face = match data.kind() {
            MeshKind::Bezier => Face::new(vertices.map(|v| 3 * v), material),
            _ if orco => Face::new(vertices.map(|v| 2 * v), material),
            _ => Face::new(vertices, material),
        };
        // Exported normals are stored per logical vertex
        if data.kind() == MeshKind::Triangle && data.normals_exported() {
            face.normals = vertices.map(Some);
        }
        data.faces.push(face);

        let index = data.faces.len() - 1;
        self.last_face = Some(index);
        Ok(index)
    }

    /// Adds a face along with three offsets into the mesh's UV values
    pub fn add_face_with_uv(
        &mut self,
        table: &mut ObjectTable,
        vertices: [u32; 3],
        uvs: [u32; 3],
        material: Option<MaterialRef>,
    ) -> Result<usize, BuildError> {
        let index = self.add_face(table, vertices, material)?;
        let data = self
            .current_record(table)?
            .object_mut()
            .data_mut()
            .ok_or(BuildError::NoObject)?;
        data.uv_offsets.extend(uvs);
        Ok(index)
    }

    /// Appends a UV value to the current object, returning its offset
    pub fn add_uv(&mut self, table: &mut ObjectTable, uv: Point2) -> Result<u32, BuildError> {
        self.require("add_uv", BuildState::Object)?;
        let data = self
            .current_record(table)?
            .object_mut()
            .data_mut()
            .ok_or(BuildError::NoObject)?;
        let Ok(offset) = u32::try_from(data.uv_values.len()) else {
            error!(target: BUILDER, count = data.uv_values.len(), "UV offsets no longer fit");
            return Err(BuildError::TooManyUvs);
        };
        data.uv_values.push(uv);
        Ok(offset)
    }

    // endregion

    // region Whole objects

    /// Smooths the normals of the mesh `target`, or of the last mesh built when [None].
    ///
    /// Meshes whose exported normals cover every point keep them. Otherwise only triangle meshes can be smoothed.
    pub fn smooth_mesh(
        &mut self,
        table: &mut ObjectTable,
        target: Option<ObjectId>,
        angle_deg: Number,
    ) -> Result<Smoothed, BuildError> {
        self.require("smooth_mesh", BuildState::Geometry)?;
        let key = match target {
            Some(id) => table.key(id).ok_or(BuildError::UnknownObject(id))?,
            None => self.current.ok_or(BuildError::NoObject)?,
        };
        let record = table.get_mut(key).ok_or(BuildError::NoObject)?;
        let (id, kind) = (record.id(), record.object().kind());
        if !record.is_finished() {
            warn!(target: BUILDER, %id, "can't smooth a mesh that is still under construction");
            return Err(BuildError::UnfinishedObject(id));
        }

        let exported = record
            .object()
            .data()
            .is_some_and(|d| d.normals_exported() && d.normals().len() == d.points().len());
        if !exported && kind != ObjectKind::TriangleMesh {
            error!(target: BUILDER, %id, %kind, "only triangle meshes can be smoothed");
            return Err(BuildError::NotATriangleMesh { id, kind });
        }

        let data = record.object_mut().data_mut().ok_or(BuildError::NotATriangleMesh { id, kind })?;
        let smoothed = smooth_normals(data, angle_deg);
        if smoothed == Smoothed::Computed {
            self.changes |= Changes::GEOMETRY;
        }
        Ok(smoothed)
    }

    /// Places a transformed copy of the triangle mesh `base`, returning the new instance's id
    pub fn add_instance(
        &mut self,
        table: &mut ObjectTable,
        base: ObjectId,
        transform: Matrix4,
    ) -> Result<ObjectId, BuildError> {
        if self.mode != RenderMode::Triangle {
            warn!(target: BUILDER, mode = %self.mode, "instances are only supported in triangle mode");
            return Err(BuildError::WrongRenderMode {
                operation: "add_instance",
                expected: RenderMode::Triangle,
            });
        }
        let Some(base_key) = table.key(base) else {
            error!(target: BUILDER, %base, "base mesh for instance doesn't exist");
            return Err(BuildError::UnknownObject(base));
        };
        let (kind, finished) = table
            .get(base_key)
            .map(|r| (r.object().kind(), r.is_finished()))
            .ok_or(BuildError::UnknownObject(base))?;
        if !finished {
            error!(target: BUILDER, %base, "instance base is still under construction");
            return Err(BuildError::UnfinishedObject(base));
        }
        if kind != ObjectKind::TriangleMesh {
            error!(target: BUILDER, %base, %kind, "instance base is not a triangle mesh");
            return Err(BuildError::NotATriangleMesh { id: base, kind });
        }
        let transform = ObjectTransform::new(transform).ok_or(BuildError::SingularTransform)?;
        let id = table.next_free_id().ok_or(BuildError::IdsExhausted)?;

        table.insert(id, GeometryObject::Instance(TriangleMeshInstance::new(base_key, transform)));
        self.changes |= Changes::GEOMETRY;
        trace!(target: BUILDER, %id, %base, "added instance");
        Ok(id)
    }

    /// Finishes and stores a standalone object under a fresh id. Standalone objects are indexed in universal mode
    pub fn add_object(&mut self, table: &mut ObjectTable, mut object: Box<dyn Geometry>) -> Result<ObjectId, BuildError> {
        object.finish()?;
        let id = table.next_free_id().ok_or(BuildError::IdsExhausted)?;
        table.insert_standalone(id, object);
        self.changes |= Changes::GEOMETRY;
        trace!(target: BUILDER, %id, "added standalone object");
        Ok(id)
    }

    // endregion
}
