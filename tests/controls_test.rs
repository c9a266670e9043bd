use std::f32::consts::PI;

use cgmath::{Point3, Rad};
use terrain_sandbox::{
    camera::Camera,
    config::{CameraConfig, ControlsConfig},
    controls::{OrbitControls, Spherical},
};

fn setup(config: ControlsConfig) -> (OrbitControls, Camera) {
    let camera = Camera::from_config(&CameraConfig::default());
    (OrbitControls::new(config, camera.target), camera)
}

fn undamped() -> ControlsConfig {
    ControlsConfig {
        enable_damping: false,
        ..Default::default()
    }
}

fn spherical(camera: &Camera) -> Spherical {
    Spherical::from_offset(camera.eye - camera.target)
}

#[test]
fn idle_controls_leave_the_camera_alone() {
    let (mut controls, mut camera) = setup(ControlsConfig::default());
    let before = camera.clone();
    assert!(!controls.update(&mut camera));
    assert!((camera.eye.x - before.eye.x).abs() < 1e-4);
    assert!((camera.eye.y - before.eye.y).abs() < 1e-4);
    assert!((camera.eye.z - before.eye.z).abs() < 1e-4);
}

#[test]
fn spherical_round_trips_the_offset() {
    let offset = Point3::new(-10.0, 6.0, -2.0) - Point3::new(0.0, 0.0, 0.0);
    let back = Spherical::from_offset(offset).to_offset();
    assert!((back.x - offset.x).abs() < 1e-4);
    assert!((back.y - offset.y).abs() < 1e-4);
    assert!((back.z - offset.z).abs() < 1e-4);
}

#[test]
fn damped_rotation_settles_on_the_full_drag() {
    let (mut controls, mut camera) = setup(ControlsConfig::default());
    let start = spherical(&camera);
    let height = 800.0;
    // an eighth of the viewport height turns a quarter of pi
    controls.rotate_by_pixels(height / 8.0, 0.0, height);

    assert!(controls.update(&mut camera));
    let first = spherical(&camera);
    assert!((first.theta - (start.theta - PI / 4.0 * 0.1)).abs() < 1e-3);

    for _ in 0..300 {
        controls.update(&mut camera);
    }
    let settled = spherical(&camera);
    assert!((settled.theta - (start.theta - PI / 4.0)).abs() < 1e-3);
    assert!((settled.radius - start.radius).abs() < 1e-3);
    assert!(!controls.update(&mut camera));
}

#[test]
fn polar_angle_stays_above_the_ground() {
    let (mut controls, mut camera) = setup(undamped());
    controls.rotate_up(Rad(-PI));
    controls.update(&mut camera);
    let max = controls.config().max_polar_angle.0;
    assert!((spherical(&camera).phi - max).abs() < 1e-4);

    controls.rotate_up(Rad(PI));
    controls.update(&mut camera);
    assert!(spherical(&camera).phi > 0.0);
    assert!(camera.eye.y > 0.0);
}

#[test]
fn wheel_zooms_by_a_fixed_ratio() {
    let (mut controls, mut camera) = setup(undamped());
    let start = camera.distance();
    controls.zoom(1.0);
    controls.update(&mut camera);
    assert!((camera.distance() - start * 0.95).abs() < 1e-3);

    controls.zoom(-1.0);
    controls.update(&mut camera);
    assert!((camera.distance() - start).abs() < 1e-3);
}

#[test]
fn distance_is_clamped() {
    let (mut controls, mut camera) = setup(undamped());
    for _ in 0..200 {
        controls.zoom(-1.0);
        controls.update(&mut camera);
    }
    assert!((camera.distance() - 45.0).abs() < 1e-3);
    for _ in 0..200 {
        controls.zoom(1.0);
        controls.update(&mut camera);
    }
    assert!((camera.distance() - 5.0).abs() < 1e-3);
}

#[test]
fn pan_is_ignored_while_disabled() {
    let (mut controls, mut camera) = setup(undamped());
    let fovy = Rad::from(CameraConfig::default().fovy);
    assert!(!controls.pan_by_pixels(50.0, 20.0, &camera, fovy, 600.0));
    controls.update(&mut camera);
    assert_eq!(camera.target, Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn pan_moves_the_target_when_enabled() {
    let (mut controls, mut camera) = setup(ControlsConfig {
        enable_pan: true,
        ..undamped()
    });
    let fovy = Rad::from(CameraConfig::default().fovy);
    let distance = camera.distance();
    assert!(controls.pan_by_pixels(50.0, 20.0, &camera, fovy, 600.0));
    assert!(controls.update(&mut camera));
    assert_ne!(camera.target, Point3::new(0.0, 0.0, 0.0));
    assert!((camera.distance() - distance).abs() < 1e-3);
}
