use approx::assert_relative_eq;
use umbra_engine::core::types::*;
use umbra_engine::mesh::curve::StrandShape;
use umbra_engine::mesh::{MeshError, MeshFlags, MeshKind, ObjectKind};
use umbra_engine::scene::{BuildError, BuildState, MeshParams, ObjectId, RenderMode, Scene, SceneOpts};
use umbra_engine::shared::ray::Ray;

mod common;

const UNIT_TRIANGLE: [Point3; 3] = [Point3::new(0., 0., 0.), Point3::new(1., 0., 0.), Point3::new(0., 1., 0.)];

#[test]
fn balanced_calls_return_to_ready() {
    let mut scene = Scene::default();
    assert_eq!(scene.builder().state(), BuildState::Ready);

    scene.begin_geometry().unwrap();
    assert_eq!(scene.builder().state(), BuildState::Geometry);
    for id in 1..=3 {
        scene
            .begin_tri_mesh(ObjectId(id), MeshParams::triangles(3, 1))
            .unwrap();
        assert_eq!(scene.builder().state(), BuildState::Object);
        for p in UNIT_TRIANGLE {
            scene.add_vertex(p).unwrap();
        }
        scene.add_face([0, 1, 2], None).unwrap();
        scene.end_tri_mesh().unwrap();
        assert_eq!(scene.objects().len(), id as usize);
    }
    scene.end_geometry().unwrap();

    assert_eq!(scene.builder().state(), BuildState::Ready);
}

#[test]
fn calls_in_the_wrong_state_change_nothing() {
    let mut scene = Scene::default();
    assert!(matches!(
        scene.add_vertex(Point3::ZERO),
        Err(BuildError::WrongState {
            expected: BuildState::Object,
            actual: BuildState::Ready,
            ..
        })
    ));
    assert!(scene.end_geometry().is_err());
    assert!(scene
        .begin_tri_mesh(ObjectId(1), MeshParams::triangles(3, 1))
        .is_err());

    scene.begin_geometry().unwrap();
    assert!(scene.begin_geometry().is_err());
    assert!(scene.add_vertex(Point3::ZERO).is_err());
    assert!(scene.add_face([0, 1, 2], None).is_err());
    assert!(scene.end_tri_mesh().is_err());

    assert_eq!(scene.builder().state(), BuildState::Geometry);
    assert!(scene.objects().is_empty());
}

#[test]
fn add_vertex_outside_object_leaves_mesh_alone() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    common::add_triangle(&mut scene, ObjectId(1), MeshParams::triangles(3, 1), UNIT_TRIANGLE, None);

    assert!(scene.add_vertex(Point3::ONE).is_err());
    assert_eq!(scene.mesh(ObjectId(1)).unwrap().data().points().len(), 3);
}

#[test]
fn uv_offsets_must_match_faces() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene
        .begin_tri_mesh(
            ObjectId(1),
            MeshParams {
                has_uv: true,
                ..MeshParams::triangles(4, 2)
            },
        )
        .unwrap();
    for p in [Point3::ZERO, Point3::X, Point3::Y, Point3::ONE] {
        scene.add_vertex(p).unwrap();
    }
    let uvs = [Point2::ZERO, Point2::X, Point2::Y].map(|uv| scene.add_uv(uv).unwrap());
    assert_eq!(uvs, [0, 1, 2]);
    scene.add_face_with_uv([0, 1, 2], uvs, None).unwrap();
    // No UVs for this one
    scene.add_face([1, 3, 2], None).unwrap();

    assert_eq!(
        scene.end_tri_mesh(),
        Err(BuildError::Mesh(MeshError::UvOffsetMismatch { expected: 6, actual: 3 }))
    );
    assert_eq!(scene.builder().state(), BuildState::Object);
}

#[test]
fn uv_offsets_have_three_per_face() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene
        .begin_tri_mesh(
            ObjectId(1),
            MeshParams {
                has_uv: true,
                ..MeshParams::triangles(3, 1)
            },
        )
        .unwrap();
    for p in UNIT_TRIANGLE {
        scene.add_vertex(p).unwrap();
    }
    let uv = scene.add_uv(Point2::new(0.25, 0.75)).unwrap();
    scene.add_face_with_uv([0, 1, 2], [uv; 3], None).unwrap();
    scene.end_tri_mesh().unwrap();

    let data = scene.mesh(ObjectId(1)).unwrap().data();
    assert_eq!(data.uv_offsets().len(), 3 * data.faces().len());
}

#[test]
fn single_triangle_is_hit_at_distance_five() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    common::add_triangle(&mut scene, ObjectId(1), MeshParams::triangles(3, 1), UNIT_TRIANGLE, None);
    scene.end_geometry().unwrap();
    common::prepare(&mut scene);

    let hit = scene
        .intersect(&Ray::new(Point3::new(0.2, 0.2, 5.), -Vector3::Z))
        .expect("ray should hit the triangle");
    assert_relative_eq!(hit.dist, 5., epsilon = 1e-9);
    assert_relative_eq!(hit.pos, Point3::new(0.2, 0.2, 0.), epsilon = 1e-9);
    assert_relative_eq!(hit.normal, Vector3::Z, epsilon = 1e-9);
    assert!(hit.front_face);
    assert_eq!(hit.uv, None);
}

#[test]
fn instance_of_missing_base_is_rejected() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    common::add_triangle(&mut scene, ObjectId(1), MeshParams::triangles(3, 1), UNIT_TRIANGLE, None);

    assert_eq!(
        scene.add_instance(ObjectId(42), Matrix4::IDENTITY),
        Err(BuildError::UnknownObject(ObjectId(42)))
    );
    assert_eq!(scene.objects().len(), 1);
}

#[test]
fn instances_need_a_triangle_mesh_base() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    common::add_triangle(&mut scene, ObjectId(1), MeshParams::triangles(3, 1), UNIT_TRIANGLE, None);
    let instance = scene
        .add_instance(ObjectId(1), Matrix4::from_translation(Vector3::X))
        .unwrap();

    assert_eq!(
        scene.add_instance(instance, Matrix4::IDENTITY),
        Err(BuildError::NotATriangleMesh {
            id: instance,
            kind: ObjectKind::Instance
        })
    );
    assert_eq!(
        scene.add_instance(ObjectId(1), Matrix4::ZERO),
        Err(BuildError::SingularTransform)
    );
    assert_eq!(scene.objects().len(), 2);
}

#[test]
fn instances_are_triangle_mode_only() {
    let mut scene = Scene::new(SceneOpts {
        mode: RenderMode::Universal,
        ..SceneOpts::default()
    });
    scene.begin_geometry().unwrap();
    common::add_triangle(&mut scene, ObjectId(1), MeshParams::triangles(3, 1), UNIT_TRIANGLE, None);

    assert!(matches!(
        scene.add_instance(ObjectId(1), Matrix4::IDENTITY),
        Err(BuildError::WrongRenderMode { .. })
    ));
}

#[test]
fn allocated_ids_never_collide() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    let taken = ObjectId(i32::MAX as u32);
    common::add_triangle(&mut scene, taken, MeshParams::triangles(3, 1), UNIT_TRIANGLE, None);

    let instance = scene.add_instance(taken, Matrix4::IDENTITY).unwrap();
    assert_ne!(instance, taken);
    assert_eq!(scene.objects().len(), 2);
}

#[test]
fn exported_normals_follow_vertices() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene
        .begin_tri_mesh(ObjectId(1), MeshParams::triangles(3, 1))
        .unwrap();
    for p in UNIT_TRIANGLE {
        scene.add_vertex(p).unwrap();
        assert_eq!(scene.add_normal(Vector3::new(0., 1., 1.).normalize()), Ok(true));
    }
    scene.add_face([0, 1, 2], None).unwrap();
    scene.end_tri_mesh().unwrap();

    let data = scene.mesh(ObjectId(1)).unwrap().data();
    assert!(data.normals_exported());
    assert_eq!(data.normals().len(), 3);
    assert_eq!(data.faces()[0].normals, [Some(0), Some(1), Some(2)]);
}

#[test]
fn curve_becomes_closed_tube() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene.begin_curve_mesh(ObjectId(1), 3, 7).unwrap();
    for z in [0., 1., 2.] {
        scene.add_vertex(Point3::new(0., 0., z)).unwrap();
    }
    let strand = StrandShape {
        start: 0.2,
        end: 0.1,
        shape: 0.,
    };
    let last_face = scene.end_curve_mesh(common::opaque(3), strand).unwrap();
    scene.end_geometry().unwrap();

    let mesh = scene.mesh(ObjectId(1)).unwrap();
    let data = mesh.data();
    // Centreline plus two ring points per centreline point
    assert_eq!(data.points().len(), 9);
    // Six faces per segment, plus both caps
    assert_eq!(data.faces().len(), 14);
    assert_eq!(last_face, 13);
    assert_eq!(scene.builder().last_face(), Some(13));
    assert_eq!(data.uv_offsets().len(), 3 * data.faces().len());
    assert_eq!(mesh.object_index(), 7);
    assert!(data.faces().iter().all(|f| f.material.is_some()));

    // UVs run along the strand
    let (first, last) = (data.uv_values()[0], *data.uv_values().last().unwrap());
    assert_relative_eq!(first.x, 0.);
    assert_relative_eq!(last.x, 1.);
}

#[test]
fn curve_needs_two_points() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene.begin_curve_mesh(ObjectId(1), 1, 0).unwrap();
    scene.add_vertex(Point3::ZERO).unwrap();

    let strand = StrandShape {
        start: 0.1,
        end: 0.1,
        shape: 0.,
    };
    assert_eq!(
        scene.end_curve_mesh(None, strand),
        Err(BuildError::Mesh(MeshError::TooFewCurvePoints { count: 1 }))
    );
    assert_eq!(scene.builder().state(), BuildState::Object);
}

#[test]
fn mesh_kinds_pick_object_type() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    let generic = MeshParams {
        kind: MeshKind::VTriangle,
        ..MeshParams::triangles(3, 1)
    };
    let hidden = MeshParams {
        flags: MeshFlags::INVISIBLE,
        ..MeshParams::triangles(3, 1)
    };
    common::add_triangle(&mut scene, ObjectId(1), generic, UNIT_TRIANGLE, None);
    common::add_triangle(&mut scene, ObjectId(2), hidden, UNIT_TRIANGLE, None);

    assert_eq!(scene.object(ObjectId(1)).unwrap().kind(), ObjectKind::GenericMesh);
    assert!(scene.mesh(ObjectId(1)).is_none());
    assert!(!scene.object(ObjectId(2)).unwrap().is_visible());
}

#[test]
fn failed_curve_keeps_its_centreline() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene.begin_curve_mesh(ObjectId(1), 2, 0).unwrap();
    scene.add_vertex(Point3::ZERO).unwrap();
    scene.add_vertex(Point3::Z).unwrap();
    scene.add_face([0, 1, 9], None).unwrap();
    assert_eq!(scene.builder().last_face(), Some(0));

    let strand = StrandShape {
        start: 0.1,
        end: 0.1,
        shape: 0.,
    };
    let first = scene.end_curve_mesh(None, strand);
    assert!(matches!(first, Err(BuildError::Mesh(_))));
    let data = scene.mesh(ObjectId(1)).unwrap().data();
    assert_eq!(data.points().len(), 2);
    assert_eq!(data.faces().len(), 1);
    assert!(data.uv_values().is_empty());
    assert!(data.uv_offsets().is_empty());
    assert_eq!(scene.builder().last_face(), Some(0));

    // A retry sees exactly the same mesh
    assert_eq!(scene.end_curve_mesh(None, strand), first);
    assert_eq!(scene.mesh(ObjectId(1)).unwrap().data().points().len(), 2);
    assert_eq!(scene.builder().state(), BuildState::Object);
    assert!(scene.objects().is_empty());
}

// region Failed meshes

#[test]
fn failed_mesh_is_left_out_of_the_scene() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    common::add_triangle(&mut scene, ObjectId(1), MeshParams::triangles(3, 1), UNIT_TRIANGLE, None);

    scene
        .begin_tri_mesh(ObjectId(2), MeshParams::triangles(3, 1))
        .unwrap();
    scene.add_face([0, 1, 2], None).unwrap();
    assert!(matches!(
        scene.end_tri_mesh(),
        Err(BuildError::Mesh(MeshError::InvalidVertexIndex { .. }))
    ));
    assert!(scene.end_geometry().is_err());
    assert_eq!(scene.objects().len(), 1);

    common::prepare(&mut scene);
    let hit = scene
        .intersect(&Ray::new(Point3::new(0.2, 0.2, 5.), -Vector3::Z))
        .expect("finished mesh should still be hit");
    assert_relative_eq!(hit.dist, 5., epsilon = 1e-9);
}

#[test]
fn mesh_with_missing_uvs_is_left_out_of_the_scene() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    common::add_triangle(&mut scene, ObjectId(1), MeshParams::triangles(3, 1), UNIT_TRIANGLE, None);

    // Sits between the ray origin and mesh 1
    scene
        .begin_tri_mesh(
            ObjectId(2),
            MeshParams {
                has_uv: true,
                ..MeshParams::triangles(3, 1)
            },
        )
        .unwrap();
    for p in UNIT_TRIANGLE {
        scene.add_vertex(p + Vector3::Z).unwrap();
    }
    scene.add_face([0, 1, 2], None).unwrap();
    assert!(matches!(
        scene.end_tri_mesh(),
        Err(BuildError::Mesh(MeshError::UvOffsetMismatch { .. }))
    ));

    common::prepare(&mut scene);
    let hit = scene
        .intersect(&Ray::new(Point3::new(0.2, 0.2, 5.), -Vector3::Z))
        .expect("finished mesh should still be hit");
    assert_relative_eq!(hit.dist, 5., epsilon = 1e-9);
    assert_eq!(hit.uv, None);
}

#[test]
fn failed_mesh_can_be_completed_later() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene
        .begin_tri_mesh(ObjectId(1), MeshParams::triangles(3, 1))
        .unwrap();
    scene.add_face([0, 1, 2], None).unwrap();
    assert!(scene.end_tri_mesh().is_err());
    assert!(scene.objects().is_empty());

    for p in UNIT_TRIANGLE {
        scene.add_vertex(p).unwrap();
    }
    scene.end_tri_mesh().unwrap();
    scene.end_geometry().unwrap();
    assert_eq!(scene.objects().len(), 1);

    common::prepare(&mut scene);
    assert!(scene
        .intersect(&Ray::new(Point3::new(0.2, 0.2, 5.), -Vector3::Z))
        .is_some());
}

#[test]
fn unfinished_mesh_cannot_be_instanced() {
    let mut scene = Scene::default();
    scene.begin_geometry().unwrap();
    scene
        .begin_tri_mesh(ObjectId(1), MeshParams::triangles(3, 1))
        .unwrap();
    for p in UNIT_TRIANGLE {
        scene.add_vertex(p).unwrap();
    }

    assert_eq!(
        scene.add_instance(ObjectId(1), Matrix4::IDENTITY),
        Err(BuildError::UnfinishedObject(ObjectId(1)))
    );
    assert!(scene.objects().is_empty());
}

// endregion

// region Orco

fn orco_triangle(scene: &mut Scene, normal: Option<Vector3>) {
    scene.begin_geometry().unwrap();
    scene
        .begin_tri_mesh(
            ObjectId(1),
            MeshParams {
                has_orco: true,
                ..MeshParams::triangles(3, 1)
            },
        )
        .unwrap();
    for p in UNIT_TRIANGLE {
        scene.add_vertex_with_orco(p, 2. * p).unwrap();
        if let Some(n) = normal {
            assert_eq!(scene.add_normal(n), Ok(true));
        }
    }
    scene.add_face([0, 1, 2], None).unwrap();
    scene.end_tri_mesh().unwrap();
    scene.end_geometry().unwrap();
}

#[test]
fn hit_orco_is_interpolated() {
    let mut scene = Scene::default();
    orco_triangle(&mut scene, None);
    common::prepare(&mut scene);

    let hit = scene
        .intersect(&Ray::new(Point3::new(0.2, 0.2, 5.), -Vector3::Z))
        .expect("ray should hit the triangle");
    assert_relative_eq!(hit.pos, Point3::new(0.2, 0.2, 0.), epsilon = 1e-9);
    assert_relative_eq!(hit.orco.expect("mesh has orco"), Point3::new(0.4, 0.4, 0.), epsilon = 1e-9);
}

#[test]
fn orco_mesh_keeps_exported_normals() {
    let n = Vector3::new(0., 1., 1.).normalize();
    let mut scene = Scene::default();
    orco_triangle(&mut scene, Some(n));

    let data = scene.mesh(ObjectId(1)).unwrap().data();
    assert!(data.normals_exported());
    assert_eq!(data.faces()[0].vertices, [0, 2, 4]);
    assert_eq!(data.faces()[0].normals, [Some(0), Some(1), Some(2)]);

    common::prepare(&mut scene);
    let hit = scene
        .intersect(&Ray::new(Point3::new(0.2, 0.2, 5.), -Vector3::Z))
        .expect("ray should hit the triangle");
    assert_relative_eq!(hit.normal, n, epsilon = 1e-9);
    assert_relative_eq!(hit.geometric_normal, Vector3::Z, epsilon = 1e-9);
    assert_relative_eq!(hit.orco.expect("mesh has orco"), Point3::new(0.4, 0.4, 0.), epsilon = 1e-9);
}

// endregion
