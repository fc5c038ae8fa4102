use approx::assert_relative_eq;
use umbra_engine::core::types::*;
use umbra_engine::mesh::smooth::Smoothed;
use umbra_engine::mesh::{MeshKind, ObjectKind};
use umbra_engine::scene::{BuildError, MeshParams, ObjectId, Scene};

mod common;

const CUBE: ObjectId = ObjectId(1);

fn cube_scene() -> Scene {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    common::add_cube(&mut scene, CUBE);
    scene
}

/// Two faces sharing the edge `0-1`, one flat on the floor and one standing up along the X axis
fn hinge_scene() -> Scene {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene
        .begin_tri_mesh(ObjectId(1), MeshParams::triangles(4, 2))
        .unwrap();
    for p in [Point3::ZERO, Point3::X, Point3::Y, Point3::Z] {
        scene.add_vertex(p).unwrap();
    }
    scene.add_face([0, 1, 2], None).unwrap();
    scene.add_face([0, 3, 1], None).unwrap();
    scene.end_tri_mesh().unwrap();
    scene
}

#[test]
fn full_smoothing_gives_unit_outward_normals() {
    let mut scene = cube_scene();
    assert_eq!(scene.smooth_mesh(Some(CUBE), 180.), Ok(Smoothed::Computed));

    let data = scene.mesh(CUBE).unwrap().data();
    assert!(data.is_smooth());
    assert_eq!(data.normals().len(), 8);
    for (i, normal) in data.normals().iter().enumerate() {
        assert_relative_eq!(normal.length(), 1., epsilon = 1e-9);
        let outwards = common::cube_vertex(i as u32) - Point3::splat(0.5);
        assert!(normal.dot(outwards) > 0., "normal {i} points inwards: {normal}");
    }
    for face in data.faces() {
        assert_eq!(face.normals, face.vertices.map(Some));
    }
}

#[test]
fn full_smoothing_at_right_angled_corner() {
    let mut scene = cube_scene();
    scene.smooth_mesh(Some(CUBE), 180.).unwrap();

    // Every face meets vertex 7 at a right angle, so the three sides weigh the same
    let normal = scene.mesh(CUBE).unwrap().data().normals()[7];
    assert_relative_eq!(normal, Vector3::ONE.normalize(), epsilon = 1e-9);
}

#[test]
fn smoothing_twice_is_stable() {
    let mut scene = cube_scene();
    scene.smooth_mesh(Some(CUBE), 180.).unwrap();
    let first = scene.mesh(CUBE).unwrap().data().normals().clone();
    scene.smooth_mesh(Some(CUBE), 180.).unwrap();
    assert_eq!(scene.mesh(CUBE).unwrap().data().normals(), &first);
}

#[test]
fn exported_normals_are_kept() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene
        .begin_tri_mesh(ObjectId(1), MeshParams::triangles(3, 1))
        .unwrap();
    let exported = [Vector3::X, Vector3::Y, Vector3::Z];
    for (p, n) in [Point3::ZERO, Point3::X, Point3::Y].into_iter().zip(exported) {
        scene.add_vertex(p).unwrap();
        scene.add_normal(n).unwrap();
    }
    scene.add_face([0, 1, 2], None).unwrap();
    scene.end_tri_mesh().unwrap();

    assert_eq!(scene.smooth_mesh(None, 180.), Ok(Smoothed::Exported));
    let data = scene.mesh(ObjectId(1)).unwrap().data();
    assert_eq!(data.normals().as_slice(), &exported);
    assert!(data.is_smooth());
}

#[test]
fn right_angle_is_not_merged_below_ninety_degrees() {
    let mut scene = hinge_scene();
    assert_eq!(scene.smooth_mesh(None, 45.), Ok(Smoothed::Computed));

    let data = scene.mesh(ObjectId(1)).unwrap().data();
    assert!(data.normals().is_empty());
    for face in data.faces() {
        assert_eq!(face.normals, [None; 3]);
    }
}

#[test]
fn tiny_angle_skips_smoothing() {
    let mut scene = hinge_scene();
    assert_eq!(scene.smooth_mesh(None, 0.), Ok(Smoothed::Skipped));

    let data = scene.mesh(ObjectId(1)).unwrap().data();
    assert!(!data.is_smooth());
    assert!(data.faces().iter().all(|f| f.normals == [None; 3]));
}

#[test]
fn right_angle_is_merged_above_ninety_degrees() {
    let mut scene = hinge_scene();
    scene.smooth_mesh(None, 100.).unwrap();

    let data = scene.mesh(ObjectId(1)).unwrap().data();
    let (floor, wall) = (&data.faces()[0], &data.faces()[1]);
    // Vertex 0 is corner 0 of both faces, vertex 1 is corner 1 of the floor and corner 2 of the wall
    assert!(floor.normals[0].is_some());
    assert_eq!(floor.normals[0], wall.normals[0]);
    assert_eq!(floor.normals[1], wall.normals[2]);

    let shared = data.normals()[floor.normals[0].unwrap() as usize];
    assert_relative_eq!(shared, Vector3::new(0., 1., 1.).normalize(), epsilon = 1e-9);
}

#[test]
fn only_triangle_meshes_are_smoothed() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    let params = MeshParams {
        kind: MeshKind::VTriangle,
        ..MeshParams::triangles(3, 1)
    };
    common::add_triangle(&mut scene, ObjectId(1), params, common::big_triangle(0.), None);

    assert_eq!(
        scene.smooth_mesh(Some(ObjectId(1)), 180.),
        Err(BuildError::NotATriangleMesh {
            id: ObjectId(1),
            kind: ObjectKind::GenericMesh
        })
    );
    assert_eq!(scene.smooth_mesh(Some(ObjectId(9)), 180.), Err(BuildError::UnknownObject(ObjectId(9))));
}

#[test]
fn smoothing_needs_geometry_state() {
    let mut scene = cube_scene();
    scene.end_geometry().unwrap();
    assert!(matches!(scene.smooth_mesh(Some(CUBE), 180.), Err(BuildError::WrongState { .. })));
    assert!(scene.mesh(CUBE).unwrap().data().normals().is_empty());
}
