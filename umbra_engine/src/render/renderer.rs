use crate::camera::CameraRef;
use crate::core::targets::RENDERER;
use crate::render::integrator::RenderContext;
use crate::scene::{Scene, UpdateError};
use puffin::{profile_function, profile_scope};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info, trace};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no cameras/views registered")]
    NoViews,
    #[error("scene update failed")]
    Update(#[from] UpdateError),
    #[error("couldn't create worker thread pool")]
    ThreadPool(#[from] ThreadPoolBuildError),
}

/// Drives rendering of a scene through every registered view
#[derive(Debug, Default)]
pub struct Renderer {
    /// Views by name. Rendered in name order, and numbered by their position in that order
    views: BTreeMap<String, CameraRef>,
}

impl Renderer {
    pub fn new() -> Self { Self::default() }

    /// Registers a view, returning the camera previously registered under `name`
    pub fn add_view(&mut self, name: impl Into<String>, camera: CameraRef) -> Option<CameraRef> {
        self.views.insert(name.into(), camera)
    }

    pub fn views(&self) -> &BTreeMap<String, CameraRef> { &self.views }

    fn build_pool(threads: usize, name: &'static str) -> Result<ThreadPool, ThreadPoolBuildError> {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |id| format!("Renderer::{name}_{id}"))
            .build()
    }

    /// Renders every view in turn: update the scene for the view's camera, render, clean up, then flush the film.
    ///
    /// Clears any earlier abort first. Returns `Ok(false)` if the render was aborted or the last view didn't complete
    pub fn render(&self, scene: &mut Scene) -> Result<bool, RenderError> {
        profile_function!();
        scene.signals().reset();

        if self.views.is_empty() {
            error!(target: RENDERER, "no cameras/views found");
            return Err(RenderError::NoViews);
        }

        let mut completed = false;
        for (view, (name, camera)) in self.views.iter().enumerate() {
            profile_scope!("view", name.as_str());
            if scene.signals().is_aborted() {
                info!(target: RENDERER, view, %name, "render aborted");
                return Ok(false);
            }
            trace!(target: RENDERER, view, %name, "rendering view");

            scene.set_camera(camera.clone());
            scene.update()?;

            let threads = scene.thread_counts();
            let pool = Self::build_pool(threads.render.get(), "worker")?;
            let photon_pool = Self::build_pool(threads.photons.get(), "photon_worker")?;

            let mut integrator = scene
                .surface_integrator
                .take()
                .ok_or(UpdateError::MissingSurfaceIntegrator)?;
            let Some(mut film) = scene.film.take() else {
                scene.surface_integrator = Some(integrator);
                return Err(UpdateError::MissingFilm.into());
            };

            let ctx = RenderContext {
                scene: &*scene,
                view,
                view_name: name,
                pool: &pool,
                photon_pool: &photon_pool,
            };
            completed = integrator.render(&ctx, film.as_mut());
            integrator.cleanup();
            film.flush(view);

            scene.surface_integrator = Some(integrator);
            scene.film = Some(film);
        }

        Ok(completed && !scene.signals().is_aborted())
    }
}
