//! Module containing the **kd-tree** used as the scene's spatial index
//!
//! Built top-down with the surface area heuristic: at each node, candidate split planes are
//! placed at primitive bound edges along the longest axis, and the cheapest one is taken if it beats
//! making a leaf. The tree is immutable once built.

use crate::accel::opts::KdTreeOpts;
use crate::core::targets::ACCEL;
use crate::core::types::Number;
use crate::mesh::primitive::Primitive;
use crate::shared::aabb::Aabb;
use crate::shared::math::Axis;
use getset::{CopyGetters, Getters};
use indextree::{Arena, NodeId};
use puffin::profile_function;
use smallvec::SmallVec;
use std::cmp::Ordering;
use tracing::debug;

/// Splits that are worse than a leaf are tolerated this many times along one path
const MAX_BAD_REFINES: usize = 3;

/// Primitive indices held by a leaf; most leaves hold one or two
pub(crate) type LeafPrims = SmallVec<[u32; 2]>;

/// The type for each node in the tree
///
/// Interior nodes always have exactly two children: the first lies below the split plane, the last above it
#[derive(Clone, Debug)]
pub(crate) enum KdNode {
    Interior { axis: Axis, split: Number },
    Leaf(LeafPrims),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KdTreeStats {
    pub interior_nodes: usize,
    pub leaves: usize,
    pub empty_leaves: usize,
    /// Sum of primitive references across leaves; primitives straddling a plane are counted on both sides
    pub leaf_prims: usize,
    pub depth: usize,
}

#[derive(Getters, CopyGetters, Clone, Debug)]
pub struct KdTree<P: Primitive> {
    #[get = "pub"]
    primitives: Vec<P>,
    /// The backing store containing all of our nodes, as well as their hierarchy
    pub(crate) arena: Arena<KdNode>,
    pub(crate) root: Option<NodeId>,
    /// Bounds of every primitive. [None] for an empty tree
    #[get_copy = "pub"]
    aabb: Option<Aabb>,
    #[get_copy = "pub"]
    stats: KdTreeStats,
}

impl<P: Primitive> KdTree<P> {
    /// Builds a tree over the given primitives. An empty list gives an empty tree that never reports hits
    pub fn new(primitives: Vec<P>, opts: &KdTreeOpts) -> Self {
        profile_function!();

        let bounds = primitives.iter().map(P::aabb).collect::<Vec<_>>();
        let aabb = Aabb::encompass_iter(&bounds);
        let mut arena = Arena::with_capacity(primitives.len() * 2);
        let mut stats = KdTreeStats::default();

        let root = aabb.map(|aabb| {
            let mut build = Build {
                opts,
                bounds: &bounds,
                arena: &mut arena,
                stats: &mut stats,
                edges: Vec::with_capacity(bounds.len() * 2),
            };
            let max_depth = opts.depth_for(bounds.len());
            build.node(aabb, (0..bounds.len() as u32).collect(), max_depth, 0, 0)
        });

        debug!(
            target: ACCEL,
            prims = primitives.len(),
            interior = stats.interior_nodes,
            leaves = stats.leaves,
            empty_leaves = stats.empty_leaves,
            prims_per_leaf = stats.leaf_prims as Number / stats.leaves.max(1) as Number,
            depth = stats.depth,
            "built kd-tree"
        );

        Self {
            primitives,
            arena,
            root,
            aabb,
            stats,
        }
    }

    pub fn len(&self) -> usize { self.primitives.len() }

    pub fn is_empty(&self) -> bool { self.primitives.is_empty() }
}

// region Build

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeKind {
    // Starts sort before ends at the same position
    Start,
    End,
}

#[derive(Copy, Clone, Debug)]
struct BoundEdge {
    t: Number,
    prim: u32,
    kind: EdgeKind,
}

/// Scratch state shared by the recursive build
struct Build<'a> {
    opts: &'a KdTreeOpts,
    bounds: &'a [Aabb],
    arena: &'a mut Arena<KdNode>,
    stats: &'a mut KdTreeStats,
    /// Reused between nodes; only valid until the node's primitives are classified
    edges: Vec<BoundEdge>,
}

impl Build<'_> {
    fn leaf(&mut self, prims: Vec<u32>, depth: usize) -> NodeId {
        self.stats.leaves += 1;
        self.stats.leaf_prims += prims.len();
        self.stats.empty_leaves += usize::from(prims.is_empty());
        self.stats.depth = self.stats.depth.max(depth);
        self.arena.new_node(KdNode::Leaf(LeafPrims::from_vec(prims)))
    }

    /// Fills `self.edges` with the sorted bound edges of `prims` along `axis`
    fn collect_edges(&mut self, prims: &[u32], axis: Axis) {
        let a = axis.index();
        self.edges.clear();
        for &prim in prims {
            let b = self.bounds[prim as usize];
            self.edges.push(BoundEdge {
                t: b.min()[a],
                prim,
                kind: EdgeKind::Start,
            });
            self.edges.push(BoundEdge {
                t: b.max()[a],
                prim,
                kind: EdgeKind::End,
            });
        }
        self.edges
            .sort_unstable_by(|x, y| match Number::total_cmp(&x.t, &y.t) {
                Ordering::Equal => x.kind.cmp(&y.kind),
                ord => ord,
            });
    }

    /// Finds the cheapest split plane among the edges currently in `self.edges`,
    /// returning the edge offset and its cost
    fn best_split(&self, node_bounds: &Aabb, axis: Axis, prim_count: usize) -> Option<(usize, Number)> {
        let a = axis.index();
        let (o0, o1) = (axis.next().index(), axis.next().next().index());
        let d = node_bounds.size();
        let inv_total_sa = 1. / node_bounds.area();
        let (min, max) = (node_bounds.min()[a], node_bounds.max()[a]);

        let mut best: Option<(usize, Number)> = None;
        let (mut below, mut above) = (0_usize, prim_count);
        for (i, edge) in self.edges.iter().enumerate() {
            if edge.kind == EdgeKind::End {
                above -= 1;
            }
            if edge.t > min && edge.t < max {
                let cap = d[o0] * d[o1];
                let girth = d[o0] + d[o1];
                let p_below = 2. * (cap + (edge.t - min) * girth) * inv_total_sa;
                let p_above = 2. * (cap + (max - edge.t) * girth) * inv_total_sa;
                let bonus = if below == 0 || above == 0 { self.opts.empty_bonus } else { 0. };
                let cost = self.opts.traversal_cost
                    + self.opts.intersect_cost
                        * (1. - bonus)
                        * (p_below * below as Number + p_above * above as Number);
                if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best = Some((i, cost));
                }
            }
            if edge.kind == EdgeKind::Start {
                below += 1;
            }
        }
        best
    }

    fn node(
        &mut self,
        node_bounds: Aabb,
        prims: Vec<u32>,
        depth_left: usize,
        depth: usize,
        bad_refines: usize,
    ) -> NodeId {
        let n = prims.len();
        if n <= self.opts.max_leaf_size || depth_left == 0 || node_bounds.area() <= 0. {
            return self.leaf(prims, depth);
        }

        // Try the longest axis first, falling back to the others if it has no usable plane
        let mut axis = node_bounds.longest_axis();
        let mut best = None;
        for _ in 0..3 {
            self.collect_edges(&prims, axis);
            best = self.best_split(&node_bounds, axis, n);
            if best.is_some() {
                break;
            }
            axis = axis.next();
        }

        let leaf_cost = self.opts.intersect_cost * n as Number;
        let Some((offset, cost)) = best else {
            return self.leaf(prims, depth);
        };
        let bad_refines = bad_refines + usize::from(cost > leaf_cost);
        if (cost > 4. * leaf_cost && n < 16) || bad_refines >= MAX_BAD_REFINES {
            return self.leaf(prims, depth);
        }

        let split = self.edges[offset].t;
        let below = self.edges[..offset]
            .iter()
            .filter(|e| e.kind == EdgeKind::Start)
            .map(|e| e.prim)
            .collect::<Vec<_>>();
        let above = self.edges[offset + 1..]
            .iter()
            .filter(|e| e.kind == EdgeKind::End)
            .map(|e| e.prim)
            .collect::<Vec<_>>();
        drop(prims);

        self.stats.interior_nodes += 1;
        let (below_bounds, above_bounds) = node_bounds.split(axis, split);
        let node = self.arena.new_node(KdNode::Interior { axis, split });
        let below = self.node(below_bounds, below, depth_left - 1, depth + 1, bad_refines);
        node.append(below, self.arena);
        let above = self.node(above_bounds, above, depth_left - 1, depth + 1, bad_refines);
        node.append(above, self.arena);
        node
    }
}

// endregion Build
