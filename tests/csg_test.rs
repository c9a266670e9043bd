use cgmath::{InnerSpace, Vector3};
use terrain_sandbox::{
    config::SceneConfig,
    csg::{Brush, Evaluator, Operation},
    data_structures::{geometry::Geometry, instance::Instance},
    scene::board_geometry,
};

fn assert_winding_matches_normals(geometry: &Geometry) {
    for [a, b, c] in geometry.triangles() {
        let (pa, pb, pc) = (
            Vector3::from(a.position),
            Vector3::from(b.position),
            Vector3::from(c.position),
        );
        let face = (pb - pa).cross(pc - pa);
        if face.magnitude() < 1e-6 {
            continue;
        }
        let normal = Vector3::from(a.normal);
        assert!(
            face.normalize().dot(normal) > 0.99,
            "triangle {pa:?} {pb:?} {pc:?} disagrees with {normal:?}"
        );
    }
}

fn overlapping_cubes() -> (Brush, Brush) {
    let a = Brush::new(Geometry::cuboid(2.0, 2.0, 2.0));
    let b = Brush::new(Geometry::cuboid(2.0, 2.0, 2.0))
        .with_transform(Instance::new().with_position(Vector3::new(1.0, 0.5, 0.25)));
    (a, b)
}

#[test]
fn board_frame_encloses_the_expected_volume() {
    let frame = board_geometry(&SceneConfig::default());
    assert!((frame.volume() - 42.0).abs() < 1e-2, "{}", frame.volume());

    let bounds = frame.bounding_box().unwrap();
    assert!((bounds.min - Vector3::new(-5.5, -1.0, -5.5)).magnitude() < 1e-5);
    assert!((bounds.max - Vector3::new(5.5, 1.0, 5.5)).magnitude() < 1e-5);
    assert_winding_matches_normals(&frame);
}

#[test]
fn board_frame_has_an_open_well() {
    let frame = board_geometry(&SceneConfig::default());
    // nothing of the frame is left inside the hole
    for vertex in &frame.vertices {
        let [x, _, z] = vertex.position;
        assert!(x.abs() >= 5.0 - 1e-4 || z.abs() >= 5.0 - 1e-4, "{x} {z}");
    }
}

#[test]
fn boolean_volumes_of_overlapping_cubes() {
    let (a, b) = overlapping_cubes();
    let evaluator = Evaluator::default();
    let overlap = 1.0 * 1.5 * 1.75;
    let cases = [
        (Operation::Addition, 16.0 - overlap),
        (Operation::Subtraction, 8.0 - overlap),
        (Operation::ReverseSubtraction, 8.0 - overlap),
        (Operation::Intersection, overlap),
        (Operation::Difference, 16.0 - 2.0 * overlap),
    ];
    for (operation, expected) in cases {
        let result = evaluator.evaluate(&a, &b, operation);
        assert!(
            (result.volume() - expected).abs() < 1e-3,
            "{operation:?}: {} != {expected}",
            result.volume()
        );
        assert_winding_matches_normals(&result);
    }
}

#[test]
fn intersection_is_bounded_by_both_brushes() {
    let (a, b) = overlapping_cubes();
    let shared = Evaluator::default().evaluate(&a, &b, Operation::Intersection);
    let bounds = shared.bounding_box().unwrap();
    assert!((bounds.min - Vector3::new(0.0, -0.5, -0.75)).magnitude() < 1e-4);
    assert!((bounds.max - Vector3::new(1.0, 1.0, 1.0)).magnitude() < 1e-4);
}

#[test]
fn disjoint_subtraction_keeps_the_first_brush() {
    let a = Brush::new(Geometry::cuboid(1.0, 1.0, 1.0));
    let b = Brush::new(Geometry::cuboid(1.0, 1.0, 1.0))
        .with_transform(Instance::new().with_position(Vector3::new(5.0, 0.3, 0.2)));
    let result = Evaluator::default().evaluate(&a, &b, Operation::Subtraction);
    assert!((result.volume() - 1.0).abs() < 1e-4);
    let bounds = result.bounding_box().unwrap();
    assert!((bounds.min - Vector3::new(-0.5, -0.5, -0.5)).magnitude() < 1e-5);
    assert!((bounds.max - Vector3::new(0.5, 0.5, 0.5)).magnitude() < 1e-5);
}

#[test]
fn split_vertices_keep_uvs_in_range() {
    let frame = board_geometry(&SceneConfig::default());
    for vertex in &frame.vertices {
        for t in vertex.tex_coords {
            assert!((-1e-4..=1.0 + 1e-4).contains(&t), "{t}");
        }
    }
}
