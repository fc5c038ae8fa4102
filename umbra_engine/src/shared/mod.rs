use std::fmt::Debug;

pub mod aabb;
pub mod intersect;
pub mod interval;
pub mod math;
pub mod ray;
pub mod validate;

/// A simple marker trait that enforces a few other traits we need
/// for anything shared between render threads
pub trait ComponentRequirements: Debug + Send + Sync {}
impl<T: Debug + Send + Sync + ?Sized> ComponentRequirements for T {}
