use crate::mesh::primitive::{InstancedTrianglePrimitive, PrimitiveInstance};
use crate::mesh::transform::ObjectTransform;
use crate::mesh::TriangleMesh;
use crate::scene::object_table::ObjectKey;
use std::sync::Arc;

/// A transformed copy of a [TriangleMesh] that shares the base mesh's vertex data.
///
/// Only the base's key is stored; the base is resolved against the object table whenever primitives are gathered.
#[derive(Clone, Debug)]
pub struct TriangleMeshInstance {
    base: ObjectKey,
    transform: Arc<ObjectTransform>,
}

impl TriangleMeshInstance {
    pub fn new(base: ObjectKey, transform: ObjectTransform) -> Self {
        Self {
            base,
            transform: Arc::new(transform),
        }
    }

    pub fn base(&self) -> ObjectKey { self.base }

    pub fn transform(&self) -> &ObjectTransform { &self.transform }

    /// Appends one primitive per face of `base`, which must be the mesh [Self::base] refers to
    pub fn primitives(&self, base: &TriangleMesh, out: &mut Vec<PrimitiveInstance>) {
        let data = base.shared_data();
        out.extend((0..data.faces().len()).map(|face| {
            InstancedTrianglePrimitive::new(data.clone(), face, self.transform.clone(), base.object_index()).into()
        }));
    }
}
