use crate::accel::kdtree::{KdNode, KdTree};
use crate::core::types::{Colour, Number};
use crate::mesh::primitive::Primitive;
use crate::render::state::RenderState;
use crate::shared::intersect::PrimitiveHit;
use crate::shared::interval::Interval;
use crate::shared::ray::Ray;
use indextree::NodeId;
use smallvec::SmallVec;
use std::ops::ControlFlow;

/// Nodes waiting to be visited; deep enough for any tree the depth limit allows
type TodoStack = SmallVec<[(NodeId, Number, Number); 64]>;

/// Result of a shadow query that lets light through transparent surfaces
#[derive(Clone, Debug)]
pub struct FilteredHit<'a, P> {
    /// Whether the ray was fully blocked
    pub occluded: bool,
    /// Product of the transparency filters of every surface the ray passed through
    pub filter: Colour,
    /// The last primitive the ray touched, opaque or not
    pub last: Option<&'a P>,
}

impl<P: Primitive> KdTree<P> {
    /// Walks the leaves pierced by the ray between `t_start` and `t_end`, front to back.
    ///
    /// `visit` receives each leaf's primitives and the leaf's `(t_min, t_max)` span along the ray.
    fn walk(&self, ray: &Ray, t_start: Number, t_end: Number, mut visit: impl FnMut(&[u32], Number, Number) -> ControlFlow<()>) {
        let (Some(root), Some(aabb)) = (self.root, self.aabb()) else {
            return;
        };
        let Some((mut t_min, mut t_max)) = aabb.hit_range(ray, &Interval::from(t_start..=t_end)) else {
            return;
        };

        let (pos, dir, inv_dir) = (ray.pos(), ray.dir(), ray.inv_dir());
        let mut todo = TodoStack::new();
        let mut node = root;
        loop {
            match self.arena[node].get() {
                &KdNode::Interior { axis, split } => {
                    let (Some(below), Some(above)) = (self.arena[node].first_child(), self.arena[node].last_child()) else {
                        return;
                    };
                    let a = axis.index();
                    let t_plane = (split - pos[a]) * inv_dir[a];
                    let below_first = pos[a] < split || (pos[a] == split && dir[a] <= 0.);
                    let (first, second) = if below_first { (below, above) } else { (above, below) };

                    if t_plane.is_nan() || t_plane > t_max || t_plane <= 0. {
                        node = first;
                    } else if t_plane < t_min {
                        node = second;
                    } else {
                        todo.push((second, t_plane, t_max));
                        node = first;
                        t_max = t_plane;
                    }
                }
                KdNode::Leaf(prims) => {
                    if visit(prims.as_slice(), t_min, t_max).is_break() {
                        return;
                    }
                    match todo.pop() {
                        Some((next, next_min, next_max)) => {
                            node = next;
                            t_min = next_min;
                            t_max = next_max;
                        }
                        None => return,
                    }
                }
            }
        }
    }

    /// Finds the closest primitive hit along the ray, between the ray's `tmin` and `max_dist`
    pub fn nearest(&self, ray: &Ray, max_dist: Number) -> Option<(&P, PrimitiveHit)> {
        let mut closest: Option<(&P, PrimitiveHit)> = None;
        self.walk(ray, ray.tmin(), max_dist, |prims, _, leaf_max| {
            for &p in prims {
                let prim = &self.primitives()[p as usize];
                let bound = closest.map_or(max_dist, |(_, hit)| hit.dist);
                match prim.intersect(ray, &Interval::from(ray.tmin()..=bound)) {
                    Some(hit) if closest.map_or(true, |(_, c)| hit.dist < c.dist) => closest = Some((prim, hit)),
                    _ => {}
                }
            }
            // Anything past this leaf is further away than the current hit
            match closest {
                Some((_, hit)) if hit.dist <= leaf_max => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        });
        closest
    }

    /// Finds any primitive that blocks the ray between `bias` and `max_dist`
    pub fn any_hit(&self, ray: &Ray, max_dist: Number, bias: Number) -> Option<&P> {
        let interval = Interval::from(bias..=max_dist);
        let mut blocker = None;
        self.walk(ray, bias, max_dist, |prims, _, _| {
            blocker = prims
                .iter()
                .map(|&p| &self.primitives()[p as usize])
                .find(|prim| prim.intersect(ray, &interval).is_some());
            match blocker {
                Some(_) => ControlFlow::Break(()),
                None => ControlFlow::Continue(()),
            }
        });
        blocker
    }

    /// Like [Self::any_hit], but lets the ray continue through transparent surfaces.
    ///
    /// Each transparent primitive multiplies its transparency into the returned filter, once, no matter how many
    /// leaves it spans. An opaque primitive, or a transparent one after `max_depth` have already been passed,
    /// occludes the ray. A `max_depth` of `0` therefore stops at the first primitive of any kind.
    pub fn any_hit_filtered(
        &self,
        state: &mut RenderState,
        ray: &Ray,
        max_dist: Number,
        max_depth: u32,
        bias: Number,
    ) -> FilteredHit<'_, P> {
        let interval = Interval::from(bias..=max_dist);
        let mut result = FilteredHit {
            occluded: false,
            filter: Colour::WHITE,
            last: None,
        };
        let mut passed = SmallVec::<[u32; 16]>::new();

        self.walk(ray, bias, max_dist, |prims, _, _| {
            for &p in prims {
                let prim = &self.primitives()[p as usize];
                let Some(hit) = prim.intersect(ray, &interval) else {
                    continue;
                };
                result.last = Some(prim);

                let Some(material) = prim.material().filter(|m| m.is_transparent()) else {
                    result.occluded = true;
                    return ControlFlow::Break(());
                };
                if passed.contains(&p) {
                    continue;
                }
                if passed.len() as u32 >= max_depth {
                    result.occluded = true;
                    return ControlFlow::Break(());
                }
                passed.push(p);
                let surface = prim.surface(ray, &hit);
                result.filter *= material.transparency(state, &surface, ray.dir());
                if result.filter.is_black() {
                    result.occluded = true;
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::accel::{KdTree, KdTreeOpts};
    use crate::core::types::{Number, Point3, Vector3};
    use crate::mesh::primitive::{Primitive, PrimitiveInstance};
    use crate::mesh::{Geometry, MeshData, MeshFlags, MeshKind, TriangleMesh};
    use crate::shared::interval::Interval;
    use crate::shared::ray::Ray;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    fn random_soup(rng: &mut Pcg64, count: usize) -> Vec<PrimitiveInstance> {
        let mut data = MeshData::new(MeshKind::Triangle, count * 3, count, false, false);
        for f in 0..count {
            let centre = Point3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            for _ in 0..3 {
                let offset = Vector3::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
                data.points.push(centre + offset);
            }
            let base = (f * 3) as u32;
            data.faces.push(crate::mesh::data::Face::new([base, base + 1, base + 2], None));
        }
        let mut mesh = TriangleMesh::new(data, MeshFlags::empty(), 0);
        mesh.finish().expect("soup should be valid");
        let mut prims = Vec::new();
        mesh.primitives(&mut prims);
        prims
    }

    fn random_ray(rng: &mut Pcg64) -> Ray {
        let pos = Point3::new(rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0));
        let target = Point3::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
        Ray::new(pos, target - pos)
    }

    fn brute_force_nearest(prims: &[PrimitiveInstance], ray: &Ray) -> Option<Number> {
        prims
            .iter()
            .filter_map(|p| p.intersect(ray, &Interval::from(0.0..=Number::INFINITY)))
            .map(|hit| hit.dist)
            .min_by(Number::total_cmp)
    }

    #[test]
    fn nearest_matches_brute_force() {
        let mut rng = Pcg64::seed_from_u64(0x5eed);
        let prims = random_soup(&mut rng, 300);
        let tree = KdTree::new(prims.clone(), &KdTreeOpts::default());
        assert!(tree.stats().leaves > 1, "tree should have been split");

        for _ in 0..500 {
            let ray = random_ray(&mut rng);
            let expected = brute_force_nearest(&prims, &ray);
            let actual = tree.nearest(&ray, Number::INFINITY).map(|(_, hit)| hit.dist);
            match (expected, actual) {
                (None, None) => {}
                (Some(e), Some(a)) => approx::assert_relative_eq!(e, a, epsilon = 1e-9),
                _ => panic!("kd-tree and brute force disagree: expected {expected:?}, got {actual:?}, ray {ray:?}"),
            }
            assert_eq!(expected.is_some(), tree.any_hit(&ray, Number::INFINITY, 0.).is_some());
        }
    }

    #[test]
    fn empty_tree_never_hits() {
        let tree = KdTree::<PrimitiveInstance>::new(Vec::new(), &KdTreeOpts::default());
        let ray = Ray::new(Point3::ZERO, Vector3::X);
        assert!(tree.aabb().is_none());
        assert!(tree.nearest(&ray, Number::INFINITY).is_none());
        assert!(tree.any_hit(&ray, Number::INFINITY, 0.).is_none());
    }

    #[test]
    fn max_distance_is_respected() {
        let mut rng = Pcg64::seed_from_u64(7);
        let prims = random_soup(&mut rng, 100);
        let tree = KdTree::new(prims.clone(), &KdTreeOpts::default());
        for _ in 0..200 {
            let ray = random_ray(&mut rng);
            if let Some(dist) = brute_force_nearest(&prims, &ray) {
                assert!(tree.nearest(&ray, dist * 0.5).is_none());
                assert!(tree.any_hit(&ray, dist * 0.5, 0.).is_none());
            }
        }
    }
}
