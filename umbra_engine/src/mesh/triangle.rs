use crate::mesh::primitive::{PrimitiveInstance, TrianglePrimitive};
use crate::mesh::{Geometry, MeshData, MeshError, MeshFlags};
use getset::CopyGetters;
use std::sync::Arc;

/// A mesh of basic triangles; the only kind indexed in triangle mode, and the only kind that can be instanced
#[derive(Clone, Debug, CopyGetters)]
pub struct TriangleMesh {
    data: Arc<MeshData>,
    #[getset(get_copy = "pub")]
    visible: bool,
    /// Base objects only exist to be instanced, and are not indexed themselves
    #[getset(get_copy = "pub")]
    base_object: bool,
    #[getset(get_copy = "pub")]
    object_index: u32,
}

impl TriangleMesh {
    pub fn new(data: MeshData, flags: MeshFlags, object_index: u32) -> Self {
        Self {
            data: Arc::new(data),
            visible: !flags.contains(MeshFlags::INVISIBLE),
            base_object: flags.contains(MeshFlags::BASE_OBJECT),
            object_index,
        }
    }

    pub fn data(&self) -> &MeshData { &self.data }

    pub fn data_mut(&mut self) -> &mut MeshData { Arc::make_mut(&mut self.data) }

    /// The shared handle to the vertex data, for primitives that reference it
    pub fn shared_data(&self) -> &Arc<MeshData> { &self.data }
}

impl Geometry for TriangleMesh {
    fn num_primitives(&self) -> usize { self.data.faces().len() }

    fn primitives(&self, out: &mut Vec<PrimitiveInstance>) {
        out.extend(
            (0..self.num_primitives()).map(|face| TrianglePrimitive::new(self.data.clone(), face, self.object_index).into()),
        );
    }

    fn finish(&mut self) -> Result<(), MeshError> { self.data_mut().finish() }
}
