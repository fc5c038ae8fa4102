//! Boundaries to the light-transport side of the renderer

use crate::scene::Scene;
use crate::shared::ComponentRequirements;
use rayon::ThreadPool;

/// Everything an integrator gets to render one view
#[derive(Debug)]
pub struct RenderContext<'a> {
    /// The scene, with its spatial index already built. Read-only for the whole view
    pub scene: &'a Scene,
    pub view: usize,
    pub view_name: &'a str,
    /// Pool for the main rendering pass
    pub pool: &'a ThreadPool,
    /// Pool for photon passes
    pub photon_pool: &'a ThreadPool,
}

impl RenderContext<'_> {
    /// Integrators should poll this between batches of work
    pub fn is_aborted(&self) -> bool { self.scene.signals().is_aborted() }
}

pub trait SurfaceIntegrator: ComponentRequirements {
    /// Prepares for rendering after the scene changed. Returning `false` fails the update
    fn preprocess(&mut self, scene: &Scene) -> bool;

    /// Renders one view into `film`. Returns `false` if the view was not completed
    fn render(&mut self, ctx: &RenderContext<'_>, film: &mut dyn ImageFilm) -> bool;

    /// Releases per-view resources
    fn cleanup(&mut self) {}
}

pub trait VolumeIntegrator: ComponentRequirements {
    fn preprocess(&mut self, scene: &Scene) -> bool;
}

/// Output target for rendered pixels
pub trait ImageFilm: ComponentRequirements {
    /// Writes out the finished view
    fn flush(&mut self, view: usize);
}
