//! The geometry object model: meshes as they are built, and the primitives they hand to the spatial index.
//!
//! Meshes keep their vertex data in an [Arc]-shared [MeshData]. Primitives gathered for an index hold
//! a clone of that [Arc], so editing a mesh after a build (e.g. smoothing it) copies on write instead of
//! mutating data an index may still be reading.

use crate::mesh::primitive::PrimitiveInstance;
use crate::shared::ComponentRequirements;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use valuable::Valuable;

pub mod curve;
pub mod data;
pub mod generic;
pub mod instance;
pub mod primitive;
pub mod smooth;
pub mod transform;
pub mod triangle;

pub use self::{data::MeshData, generic::GenericMesh, instance::TriangleMeshInstance, triangle::TriangleMesh};

/// Capability set shared by everything that can be placed into the spatial index
pub trait Geometry: ComponentRequirements {
    /// How many primitives [Self::primitives] will produce
    fn num_primitives(&self) -> usize;

    /// Appends this object's primitives to `out`
    fn primitives(&self, out: &mut Vec<PrimitiveInstance>);

    /// Validates the object and computes derived data. Called once construction is complete
    fn finish(&mut self) -> Result<(), MeshError> { Ok(()) }
}

/// Which primitive type a mesh's faces are turned into
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize, Valuable)]
pub enum MeshKind {
    /// Basic triangles, indexed in triangle mode
    Triangle,
    /// Generic triangles, indexed in universal mode
    VTriangle,
    /// Quadratic bezier triangles moving over the ray's sample time
    Bezier,
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MeshFlags: u32 {
        /// Never indexed
        const INVISIBLE = 1 << 0;
        /// Only used as the source of instances; not indexed itself
        const BASE_OBJECT = 1 << 1;
    }
}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum MeshError {
    #[error("face {face} references vertex {index}, but the mesh only has {count} points")]
    InvalidVertexIndex { face: usize, index: u32, count: usize },
    #[error("face {face} references normal {index}, but the mesh only has {count} normals")]
    InvalidNormalIndex { face: usize, index: u32, count: usize },
    #[error("face {face} references uv {index}, but the mesh only has {count} uv values")]
    InvalidUvIndex { face: usize, index: u32, count: usize },
    #[error("uv-offset count mismatch: expected {expected} (3 per face), got {actual}")]
    UvOffsetMismatch { expected: usize, actual: usize },
    #[error("a curve needs at least 2 points, got {count}")]
    TooFewCurvePoints { count: usize },
}

/// Tag for the kind of object stored in an object record
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Valuable)]
pub enum ObjectKind {
    TriangleMesh,
    GenericMesh,
    Instance,
}

/// A geometry object owned by the scene's object table
#[derive(Clone, Debug)]
pub enum GeometryObject {
    Triangle(TriangleMesh),
    Generic(GenericMesh),
    Instance(TriangleMeshInstance),
}

impl GeometryObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Triangle(_) => ObjectKind::TriangleMesh,
            Self::Generic(_) => ObjectKind::GenericMesh,
            Self::Instance(_) => ObjectKind::Instance,
        }
    }

    /// The vertex storage, if this object owns any
    pub fn data(&self) -> Option<&MeshData> {
        match self {
            Self::Triangle(m) => Some(m.data()),
            Self::Generic(m) => Some(m.data()),
            Self::Instance(_) => None,
        }
    }

    /// Mutable access to the vertex storage, copying it first if an index still shares it
    pub fn data_mut(&mut self) -> Option<&mut MeshData> {
        match self {
            Self::Triangle(m) => Some(m.data_mut()),
            Self::Generic(m) => Some(m.data_mut()),
            Self::Instance(_) => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Self::Triangle(m) => m.visible(),
            Self::Generic(m) => m.visible(),
            Self::Instance(_) => true,
        }
    }

    pub fn is_base_object(&self) -> bool {
        match self {
            Self::Triangle(m) => m.base_object(),
            Self::Generic(_) | Self::Instance(_) => false,
        }
    }

    pub fn finish(&mut self) -> Result<(), MeshError> {
        match self {
            Self::Triangle(m) => m.finish(),
            Self::Generic(m) => m.finish(),
            Self::Instance(_) => Ok(()),
        }
    }
}
