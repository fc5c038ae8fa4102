#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use umbra_engine::background::Background;
use umbra_engine::camera::Camera;
use umbra_engine::core::types::*;
use umbra_engine::light::Light;
use umbra_engine::material::{Material, MaterialRef};
use umbra_engine::render::integrator::{ImageFilm, RenderContext, SurfaceIntegrator, VolumeIntegrator};
use umbra_engine::render::state::RenderState;
use umbra_engine::render::threads::SystemInfo;
use umbra_engine::scene::{MeshParams, ObjectId, Scene};
use umbra_engine::shared::intersect::SurfacePoint;
use umbra_engine::shared::ray::Ray;

/// Shared log that mocks append to, so tests can check what was called and in which order
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn log_entries(log: &CallLog) -> Vec<String> { log.lock().unwrap().clone() }

// region Collaborators

/// Orthographic camera looking down `-Z` from `z = 10`
#[derive(Debug)]
pub struct TopDownCamera;

impl Camera for TopDownCamera {
    fn resolution(&self) -> (u32, u32) { (4, 4) }

    fn shoot_ray(&self, x: Number, y: Number) -> Ray { Ray::new(Point3::new(x, y, 10.), -Vector3::Z) }
}

#[derive(Debug, Default)]
pub struct RecordingFilm {
    pub log: CallLog,
}

impl ImageFilm for RecordingFilm {
    fn flush(&mut self, view: usize) { self.log.lock().unwrap().push(format!("flush {view}")); }
}

#[derive(Debug, Default)]
pub struct RecordingIntegrator {
    pub log: CallLog,
    pub fail_preprocess: bool,
    /// Aborts the scene from inside the render of this view
    pub abort_on_view: Option<usize>,
}

impl SurfaceIntegrator for RecordingIntegrator {
    fn preprocess(&mut self, _scene: &Scene) -> bool {
        self.log.lock().unwrap().push("preprocess".into());
        !self.fail_preprocess
    }

    fn render(&mut self, ctx: &RenderContext<'_>, _film: &mut dyn ImageFilm) -> bool {
        self.log
            .lock()
            .unwrap()
            .push(format!("render {} {}", ctx.view, ctx.view_name));
        if self.abort_on_view == Some(ctx.view) {
            ctx.scene.abort();
        }
        !ctx.is_aborted()
    }

    fn cleanup(&mut self) { self.log.lock().unwrap().push("cleanup".into()); }
}

#[derive(Debug, Default)]
pub struct RecordingVolumeIntegrator {
    pub log: CallLog,
}

impl VolumeIntegrator for RecordingVolumeIntegrator {
    fn preprocess(&mut self, _scene: &Scene) -> bool {
        self.log.lock().unwrap().push("volume preprocess".into());
        true
    }
}

#[derive(Debug, Default)]
pub struct CountingLight {
    pub inits: Arc<AtomicUsize>,
    pub disabled: bool,
}

impl Light for CountingLight {
    fn init(&mut self, _scene: &Scene) { self.inits.fetch_add(1, Ordering::SeqCst); }

    fn is_enabled(&self) -> bool { !self.disabled }
}

#[derive(Debug)]
pub struct SkyBackground;

impl Background for SkyBackground {
    fn eval(&self, _ray: &Ray) -> Colour { Colour::WHITE }
}

#[derive(Debug)]
pub struct FixedSystem(pub usize);

impl SystemInfo for FixedSystem {
    fn logical_threads(&self) -> usize { self.0 }
}

#[derive(Debug)]
pub struct Opaque(pub u32);

impl Material for Opaque {
    fn abs_index(&self) -> u32 { self.0 }
}

/// Lets half of the light through, in every channel
#[derive(Debug)]
pub struct Glass(pub u32);

impl Material for Glass {
    fn abs_index(&self) -> u32 { self.0 }

    fn is_transparent(&self) -> bool { true }

    fn transparency(&self, _state: &mut RenderState, _sp: &SurfacePoint, _wo: Vector3) -> Colour { Colour::splat(0.5) }
}

pub fn opaque(index: u32) -> Option<MaterialRef> { Some(Arc::new(Opaque(index))) }

pub fn glass(index: u32) -> Option<MaterialRef> { Some(Arc::new(Glass(index))) }

/// Gives the scene every collaborator an update needs
pub fn attach_collaborators(scene: &mut Scene) {
    scene.set_camera(Arc::new(TopDownCamera));
    scene.set_film(Box::<RecordingFilm>::default());
    scene.set_surface_integrator(Box::<RecordingIntegrator>::default());
}

/// Attaches collaborators and runs an update, which must succeed
pub fn prepare(scene: &mut Scene) {
    attach_collaborators(scene);
    scene.update().expect("scene update failed");
}

// endregion

// region Meshes

/// Adds a single triangle mesh over the given corners. Must be called inside a geometry block
pub fn add_triangle(scene: &mut Scene, id: ObjectId, params: MeshParams, corners: [Point3; 3], material: Option<MaterialRef>) {
    scene.begin_tri_mesh(id, params).unwrap();
    for p in corners {
        scene.add_vertex(p).unwrap();
    }
    scene.add_face([0, 1, 2], material).unwrap();
    scene.end_tri_mesh().unwrap();
}

/// A triangle in the plane `z`, big enough to cover `0..1` in X and Y
pub fn big_triangle(z: Number) -> [Point3; 3] {
    [Point3::new(-1., -1., z), Point3::new(4., -1., z), Point3::new(-1., 4., z)]
}

/// Faces of the unit cube over the vertices `x + 2y + 4z`, wound so every normal points outwards
pub const CUBE_FACES: [[u32; 3]; 12] = [
    [0, 2, 1],
    [1, 2, 3],
    [4, 5, 6],
    [5, 7, 6],
    [0, 1, 4],
    [1, 5, 4],
    [2, 6, 3],
    [3, 6, 7],
    [0, 4, 2],
    [2, 4, 6],
    [1, 3, 5],
    [3, 7, 5],
];

pub fn cube_vertex(i: u32) -> Point3 { Point3::new((i & 1) as Number, ((i >> 1) & 1) as Number, ((i >> 2) & 1) as Number) }

/// Adds the unit cube as a triangle mesh. Must be called inside a geometry block
pub fn add_cube(scene: &mut Scene, id: ObjectId) {
    scene
        .begin_tri_mesh(id, MeshParams::triangles(8, CUBE_FACES.len()))
        .unwrap();
    for i in 0..8 {
        scene.add_vertex(cube_vertex(i)).unwrap();
    }
    for face in CUBE_FACES {
        scene.add_face(face, None).unwrap();
    }
    scene.end_tri_mesh().unwrap();
}

// endregion
