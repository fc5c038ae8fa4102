//! The scene: owner of every geometry object, the collaborators that render it, and the spatial index built over it.
//!
//! Construction goes through the [Builder] calls forwarded here. Before rendering, [Scene::update] brings the index
//! and the collaborators up to date with whatever changed; after that the scene is read-only and can be queried from
//! any number of render threads.

use crate::accel::KdTree;
use crate::background::BackgroundRef;
use crate::camera::CameraRef;
use crate::core::targets::SCENE;
use crate::core::types::{Matrix4, Number, Point2, Point3, Vector3};
use crate::light::Light;
use crate::material::MaterialRef;
use crate::mesh::curve::StrandShape;
use crate::mesh::primitive::PrimitiveInstance;
use crate::mesh::smooth::Smoothed;
use crate::mesh::{Geometry, GeometryObject, TriangleMesh};
use crate::render::integrator::{ImageFilm, SurfaceIntegrator, VolumeIntegrator};
use crate::render::threads::{resolve_threads, HostSystem, SystemInfo, ThreadCounts};
use crate::shared::aabb::Aabb;
use derivative::Derivative;
use puffin::profile_function;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod antialiasing;
pub mod builder;
pub mod object_table;
pub mod opts;
mod query;
pub mod signals;

pub use self::{
    antialiasing::AntialiasingOpts,
    builder::{BuildError, BuildState, Builder, Changes, MeshParams},
    object_table::{ObjectId, ObjectKey, ObjectTable},
    opts::{RenderMode, SceneOpts},
    query::{OccluderInfo, ShadowTest},
    signals::{SignalFlags, Signals},
};

#[derive(Error, Clone, Debug, PartialEq)]
pub enum UpdateError {
    #[error("no camera set")]
    MissingCamera,
    #[error("no image film set")]
    MissingFilm,
    #[error("no surface integrator set")]
    MissingSurfaceIntegrator,
    #[error("{0} integrator failed to preprocess")]
    PreprocessFailed(&'static str),
    #[error("instance {0} refers to a base mesh that no longer exists")]
    DanglingInstance(ObjectId),
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Scene {
    objects: ObjectTable,
    builder: Builder,
    lights: Vec<Box<dyn Light>>,
    camera: Option<CameraRef>,
    pub(crate) film: Option<Box<dyn ImageFilm>>,
    background: Option<BackgroundRef>,
    pub(crate) surface_integrator: Option<Box<dyn SurfaceIntegrator>>,
    volume_integrator: Option<Box<dyn VolumeIntegrator>>,
    /// Rebuilt in full whenever geometry changes. [None] while the scene has nothing to index
    #[derivative(Debug = "ignore")]
    index: Option<Arc<KdTree<PrimitiveInstance>>>,
    scene_bound: Option<Aabb>,
    opts: SceneOpts,
    antialiasing: AntialiasingOpts,
    system: Arc<dyn SystemInfo>,
    requested_threads: i32,
    requested_photon_threads: i32,
    threads: ThreadCounts,
    signals: Arc<Signals>,
    index_rebuilds: usize,
}

impl Default for Scene {
    fn default() -> Self { Self::new(SceneOpts::default()) }
}

impl Scene {
    pub fn new(opts: SceneOpts) -> Self {
        let mut builder = Builder::new();
        builder.set_mode(opts.mode);
        Self {
            objects: ObjectTable::new(),
            builder,
            lights: Vec::new(),
            camera: None,
            film: None,
            background: None,
            surface_integrator: None,
            volume_integrator: None,
            index: None,
            scene_bound: None,
            opts,
            antialiasing: AntialiasingOpts::default(),
            system: Arc::new(HostSystem),
            requested_threads: 1,
            requested_photon_threads: 1,
            threads: ThreadCounts::default(),
            signals: Arc::new(Signals::new()),
            index_rebuilds: 0,
        }
    }

    // region Construction

    pub fn builder(&self) -> &Builder { &self.builder }

    pub fn begin_geometry(&mut self) -> Result<(), BuildError> { self.builder.begin_geometry() }

    pub fn end_geometry(&mut self) -> Result<(), BuildError> { self.builder.end_geometry() }

    pub fn begin_tri_mesh(&mut self, id: ObjectId, params: MeshParams) -> Result<ObjectKey, BuildError> {
        self.builder.begin_tri_mesh(&mut self.objects, id, params)
    }

    pub fn end_tri_mesh(&mut self) -> Result<(), BuildError> { self.builder.end_tri_mesh(&mut self.objects) }

    pub fn begin_curve_mesh(&mut self, id: ObjectId, vertices: usize, object_index: u32) -> Result<ObjectKey, BuildError> {
        self.builder
            .begin_curve_mesh(&mut self.objects, id, vertices, object_index)
    }

    pub fn end_curve_mesh(&mut self, material: Option<MaterialRef>, strand: StrandShape) -> Result<usize, BuildError> {
        self.builder
            .end_curve_mesh(&mut self.objects, material, strand)
    }

    pub fn add_vertex(&mut self, p: Point3) -> Result<usize, BuildError> { self.builder.add_vertex(&mut self.objects, p) }

    pub fn add_vertex_with_orco(&mut self, p: Point3, orco: Point3) -> Result<usize, BuildError> {
        self.builder
            .add_vertex_with_orco(&mut self.objects, p, orco)
    }

    pub fn add_normal(&mut self, n: Vector3) -> Result<bool, BuildError> { self.builder.add_normal(&mut self.objects, n) }

    pub fn add_face(&mut self, vertices: [u32; 3], material: Option<MaterialRef>) -> Result<usize, BuildError> {
        self.builder
            .add_face(&mut self.objects, vertices, material)
    }

    pub fn add_face_with_uv(
        &mut self,
        vertices: [u32; 3],
        uvs: [u32; 3],
        material: Option<MaterialRef>,
    ) -> Result<usize, BuildError> {
        self.builder
            .add_face_with_uv(&mut self.objects, vertices, uvs, material)
    }

    pub fn add_uv(&mut self, uv: Point2) -> Result<u32, BuildError> { self.builder.add_uv(&mut self.objects, uv) }

    pub fn smooth_mesh(&mut self, target: Option<ObjectId>, angle_deg: Number) -> Result<Smoothed, BuildError> {
        self.builder
            .smooth_mesh(&mut self.objects, target, angle_deg)
    }

    pub fn add_instance(&mut self, base: ObjectId, transform: Matrix4) -> Result<ObjectId, BuildError> {
        self.builder
            .add_instance(&mut self.objects, base, transform)
    }

    pub fn add_object(&mut self, object: Box<dyn Geometry>) -> Result<ObjectId, BuildError> {
        self.builder.add_object(&mut self.objects, object)
    }

    /// Allocates an id that no object uses yet
    pub fn next_free_id(&mut self) -> Option<ObjectId> { self.objects.next_free_id() }

    // endregion

    // region Collaborators

    /// Adds a light, unless it is disabled. Returns whether it was added
    pub fn add_light(&mut self, light: Box<dyn Light>) -> bool {
        if !light.is_enabled() {
            debug!(target: SCENE, ?light, "not adding disabled light");
            return false;
        }
        self.lights.push(light);
        self.builder.mark_changed(Changes::LIGHT);
        true
    }

    pub fn remove_light(&mut self, index: usize) -> Option<Box<dyn Light>> {
        if index >= self.lights.len() {
            return None;
        }
        self.builder.mark_changed(Changes::LIGHT);
        Some(self.lights.remove(index))
    }

    pub fn lights(&self) -> &[Box<dyn Light>] { &self.lights }

    pub fn set_camera(&mut self, camera: CameraRef) { self.camera = Some(camera); }

    pub fn camera(&self) -> Option<&CameraRef> { self.camera.as_ref() }

    pub fn set_film(&mut self, film: Box<dyn ImageFilm>) { self.film = Some(film); }

    pub fn set_background(&mut self, background: BackgroundRef) { self.background = Some(background); }

    pub fn background(&self) -> Option<&BackgroundRef> { self.background.as_ref() }

    pub fn set_surface_integrator(&mut self, integrator: Box<dyn SurfaceIntegrator>) {
        self.surface_integrator = Some(integrator);
        self.builder.mark_changed(Changes::OTHER);
    }

    pub fn set_volume_integrator(&mut self, integrator: Box<dyn VolumeIntegrator>) {
        self.volume_integrator = Some(integrator);
        self.builder.mark_changed(Changes::OTHER);
    }

    pub fn set_system_info(&mut self, system: Arc<dyn SystemInfo>) { self.system = system; }

    // endregion

    // region Settings

    pub fn opts(&self) -> &SceneOpts { &self.opts }

    pub fn set_opts(&mut self, opts: SceneOpts) {
        self.builder.set_mode(opts.mode);
        if opts.kd_tree != self.opts.kd_tree {
            self.builder.mark_changed(Changes::GEOMETRY);
        }
        self.opts = opts;
    }

    pub fn antialiasing(&self) -> &AntialiasingOpts { &self.antialiasing }

    pub fn set_antialiasing(&mut self, opts: AntialiasingOpts) { self.antialiasing = opts.normalised(); }

    /// Requested worker counts for the render and photon pools; [AUTO_THREADS](crate::render::threads::AUTO_THREADS)
    /// detects them. Resolved on the next update
    pub fn set_num_threads(&mut self, render: i32, photons: i32) {
        self.requested_threads = render;
        self.requested_photon_threads = photons;
    }

    /// Worker counts resolved by the last update
    pub fn thread_counts(&self) -> ThreadCounts { self.threads }

    pub fn shadow_bias(&self) -> Number { self.opts.shadow_bias.unwrap_or(opts::DEFAULT_SHADOW_BIAS) }

    pub fn ray_min_dist(&self) -> Number { self.opts.ray_min_dist.unwrap_or(opts::DEFAULT_RAY_MIN_DIST) }

    // endregion

    // region Getters

    pub fn objects(&self) -> &ObjectTable { &self.objects }

    /// The triangle mesh with the given id
    pub fn mesh(&self, id: ObjectId) -> Option<&TriangleMesh> {
        match self.objects.by_id(id)?.object() {
            GeometryObject::Triangle(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<&GeometryObject> { self.objects.by_id(id).map(|r| r.object()) }

    pub fn standalone_object(&self, id: ObjectId) -> Option<&dyn Geometry> { self.objects.standalone(id) }

    /// Bounds of everything indexed. [None] until an update has indexed something
    pub fn scene_bound(&self) -> Option<Aabb> { self.scene_bound }

    /// The current spatial index, shared so it can outlive a later rebuild
    pub fn index(&self) -> Option<&Arc<KdTree<PrimitiveInstance>>> { self.index.as_ref() }

    /// How many times the spatial index has been rebuilt
    pub fn index_rebuilds(&self) -> usize { self.index_rebuilds }

    pub fn signals(&self) -> &Arc<Signals> { &self.signals }

    /// Asks the current render to stop. Safe to call from any thread holding the [Signals]
    pub fn abort(&self) { self.signals.abort(); }

    // endregion

    // region Update

    /// Prepares the scene for rendering: resolves thread counts, rebuilds the index if geometry changed,
    /// initialises the lights and preprocesses the integrators.
    ///
    /// The change flags are only cleared when everything succeeded.
    pub fn update(&mut self) -> Result<(), UpdateError> {
        profile_function!();
        debug!(target: SCENE, mode = %self.opts.mode, changes = ?self.builder.changes(), "updating scene");

        if self.camera.is_none() {
            error!(target: SCENE, "no camera set");
            return Err(UpdateError::MissingCamera);
        }
        if self.film.is_none() {
            error!(target: SCENE, "no image film set");
            return Err(UpdateError::MissingFilm);
        }

        self.threads = ThreadCounts {
            render: resolve_threads(self.requested_threads, self.system.as_ref()),
            photons: resolve_threads(self.requested_photon_threads, self.system.as_ref()),
        };

        let changes = self.builder.changes();
        if changes.contains(Changes::GEOMETRY) {
            self.rebuild_index()?;
        }

        let mut lights = std::mem::take(&mut self.lights);
        lights.iter_mut().for_each(|light| light.init(self));
        self.lights = lights;

        let Some(mut surface) = self.surface_integrator.take() else {
            error!(target: SCENE, "no surface integrator, bailing out");
            return Err(UpdateError::MissingSurfaceIntegrator);
        };
        if !changes.is_empty() {
            let surface_ok = surface.preprocess(self);
            self.surface_integrator = Some(surface);
            if !surface_ok {
                return Err(UpdateError::PreprocessFailed("surface"));
            }
            if let Some(mut volume) = self.volume_integrator.take() {
                let volume_ok = volume.preprocess(self);
                self.volume_integrator = Some(volume);
                if !volume_ok {
                    return Err(UpdateError::PreprocessFailed("volume"));
                }
            }
        } else {
            self.surface_integrator = Some(surface);
        }

        self.builder.clear_changes();
        Ok(())
    }

    /// Throws away the current index and builds a new one over every primitive the render mode includes
    fn rebuild_index(&mut self) -> Result<(), UpdateError> {
        profile_function!();
        self.index = None;
        self.scene_bound = None;

        let mut prims = Vec::new();
        match self.opts.mode {
            RenderMode::Triangle => {
                for record in self.objects.records() {
                    match record.object() {
                        GeometryObject::Triangle(mesh) if mesh.visible() && !mesh.base_object() => mesh.primitives(&mut prims),
                        GeometryObject::Instance(instance) => {
                            let base = self.objects.get(instance.base()).filter(|r| r.is_finished());
                            let base = match base.map(|r| r.object()) {
                                Some(GeometryObject::Triangle(base)) => base,
                                _ => {
                                    error!(target: SCENE, id = %record.id(), "instance base no longer exists");
                                    return Err(UpdateError::DanglingInstance(record.id()));
                                }
                            };
                            instance.primitives(base, &mut prims);
                        }
                        _ => {}
                    }
                }
            }
            RenderMode::Universal => {
                for record in self.objects.records() {
                    if let GeometryObject::Generic(mesh) = record.object() {
                        if mesh.visible() {
                            mesh.primitives(&mut prims);
                        }
                    }
                }
                for (_, object) in self.objects.standalone_objects() {
                    object.primitives(&mut prims);
                }
            }
        }

        self.index_rebuilds += 1;
        if prims.is_empty() {
            warn!(target: SCENE, mode = %self.opts.mode, "scene is empty");
            return Ok(());
        }

        let tree = KdTree::new(prims, &self.opts.kd_tree);
        self.scene_bound = tree.aabb();
        if let Some(bound) = self.scene_bound {
            let size = bound.size();
            info!(
                target: SCENE,
                x = size.x,
                y = size.y,
                z = size.z,
                volume = size.element_product(),
                shadow_bias = self.shadow_bias(),
                ray_min_dist = self.ray_min_dist(),
                "total scene dimensions"
            );
        }
        self.index = Some(Arc::new(tree));
        Ok(())
    }

    // endregion
}
