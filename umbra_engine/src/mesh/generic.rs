use crate::mesh::primitive::{BezierTrianglePrimitive, PrimitiveInstance, TrianglePrimitive};
use crate::mesh::{Geometry, MeshData, MeshError, MeshFlags, MeshKind};
use getset::CopyGetters;
use std::sync::Arc;

/// A mesh of generic primitives, indexed in universal mode.
///
/// Holds either generic triangles or bezier motion triangles, depending on its [MeshKind]
#[derive(Clone, Debug, CopyGetters)]
pub struct GenericMesh {
    data: Arc<MeshData>,
    #[getset(get_copy = "pub")]
    visible: bool,
    #[getset(get_copy = "pub")]
    object_index: u32,
}

impl GenericMesh {
    pub fn new(data: MeshData, flags: MeshFlags, object_index: u32) -> Self {
        Self {
            data: Arc::new(data),
            visible: !flags.contains(MeshFlags::INVISIBLE),
            object_index,
        }
    }

    pub fn data(&self) -> &MeshData { &self.data }

    pub fn data_mut(&mut self) -> &mut MeshData { Arc::make_mut(&mut self.data) }
}

impl Geometry for GenericMesh {
    fn num_primitives(&self) -> usize { self.data.faces().len() }

    fn primitives(&self, out: &mut Vec<PrimitiveInstance>) {
        let (data, index) = (&self.data, self.object_index);
        match data.kind() {
            MeshKind::Bezier => out.extend(
                (0..self.num_primitives()).map(|face| BezierTrianglePrimitive::new(data.clone(), face, index).into()),
            ),
            MeshKind::Triangle | MeshKind::VTriangle => out.extend(
                (0..self.num_primitives()).map(|face| TrianglePrimitive::new(data.clone(), face, index).into()),
            ),
        }
    }

    fn finish(&mut self) -> Result<(), MeshError> { self.data_mut().finish() }
}
