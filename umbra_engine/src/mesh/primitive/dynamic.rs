use crate::core::types::Number;
use crate::material::MaterialRef;
use crate::mesh::primitive::Primitive;
use crate::shared::aabb::Aabb;
use crate::shared::intersect::{PrimitiveHit, SurfacePoint};
use crate::shared::interval::Interval;
use crate::shared::ray::Ray;
use std::sync::Arc;

/// A [Primitive] behind dynamic dispatch, for primitive types the engine doesn't know about
#[derive(Clone, Debug)]
pub struct DynamicPrimitive {
    pub inner: Arc<dyn Primitive>,
}

impl DynamicPrimitive {
    pub fn new(inner: impl Primitive + 'static) -> Self { Self { inner: Arc::new(inner) } }
}

impl Primitive for DynamicPrimitive {
    fn aabb(&self) -> Aabb { self.inner.aabb() }

    fn intersect(&self, ray: &Ray, interval: &Interval<Number>) -> Option<PrimitiveHit> {
        self.inner.intersect(ray, interval)
    }

    fn surface(&self, ray: &Ray, hit: &PrimitiveHit) -> SurfacePoint { self.inner.surface(ray, hit) }

    fn material(&self) -> Option<&MaterialRef> { self.inner.material() }

    fn object_index(&self) -> u32 { self.inner.object_index() }
}
