use crate::core::types::{Colour, Number};
use crate::mesh::primitive::{Primitive, PrimitiveInstance};
use crate::render::state::RenderState;
use crate::scene::Scene;
use crate::shared::intersect::SurfacePoint;
use crate::shared::interval::Interval;
use crate::shared::ray::Ray;
use crate::shared::validate;

/// Pass indices of whatever a shadow ray hit
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OccluderInfo {
    pub object_index: u32,
    pub material_index: Option<u32>,
}

impl OccluderInfo {
    fn of(prim: &PrimitiveInstance) -> Self {
        Self {
            object_index: prim.object_index(),
            material_index: prim.material().map(|m| m.abs_index()),
        }
    }
}

/// Outcome of a shadow query
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadowTest {
    pub shadowed: bool,
    /// Colour that reaches the end of the ray: white when nothing was hit, black when fully blocked
    pub filter: Colour,
    /// The last primitive the ray touched, even if it let light through
    pub occluder: Option<OccluderInfo>,
}

impl ShadowTest {
    const CLEAR: Self = Self {
        shadowed: false,
        filter: Colour::WHITE,
        occluder: None,
    };
}

impl Scene {
    /// Finds the closest surface along the ray, up to its `tmax`
    pub fn intersect(&self, ray: &Ray) -> Option<SurfacePoint> {
        validate::ray(ray);
        let index = self.index.as_deref()?;
        let (prim, hit) = index.nearest(ray, ray.max_dist())?;
        let surface = prim.surface(ray, &hit);
        validate::surface(ray, &surface, Interval::from(ray.tmin()..=ray.max_dist()));
        Some(surface)
    }

    /// Moves the ray's origin up to its `tmin`, and shortens the distance to match on both ends
    fn shadow_ray(state: &RenderState, ray: &Ray) -> (Ray, Number) {
        let max_dist = if ray.tmax() < 0. {
            Number::INFINITY
        } else {
            ray.tmax() - 2. * ray.tmin()
        };
        let shadow_ray = ray
            .with_pos(ray.at(ray.tmin()))
            .with_time(state.time);
        (shadow_ray, max_dist)
    }

    /// Whether anything blocks the ray, ignoring transparency
    pub fn is_shadowed(&self, state: &RenderState, ray: &Ray) -> ShadowTest {
        let Some(index) = self.index.as_deref() else {
            return ShadowTest::CLEAR;
        };
        let (shadow_ray, max_dist) = Self::shadow_ray(state, ray);
        match index.any_hit(&shadow_ray, max_dist, self.shadow_bias()) {
            Some(prim) => ShadowTest {
                shadowed: true,
                filter: Colour::BLACK,
                occluder: Some(OccluderInfo::of(prim)),
            },
            None => ShadowTest::CLEAR,
        }
    }

    /// Like [Self::is_shadowed], but light passes through up to `max_depth` transparent surfaces,
    /// picking up their colour along the way.
    ///
    /// Materials evaluated along the way get a fresh scratch buffer; the caller's is left as it was.
    pub fn is_shadowed_filtered(&self, state: &mut RenderState, ray: &Ray, max_depth: u32) -> ShadowTest {
        let Some(index) = self.index.as_deref() else {
            return ShadowTest::CLEAR;
        };
        let (shadow_ray, max_dist) = Self::shadow_ray(state, ray);
        let bias = self.shadow_bias();
        let hit = state.with_nested_scratch(|state| index.any_hit_filtered(state, &shadow_ray, max_dist, max_depth, bias));
        ShadowTest {
            shadowed: hit.occluded,
            filter: hit.filter,
            occluder: hit.last.map(OccluderInfo::of),
        }
    }
}
