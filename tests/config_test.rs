use cgmath::Deg;
use terrain_sandbox::{
    camera::{Projection, render_size},
    config::{Palette, SceneConfig, TerrainConfig},
    data_structures::{color::Rgb, terrain::TerrainUniforms},
};
use winit::dpi::PhysicalSize;

#[test]
fn default_scene_matches_the_reference() {
    let scene = SceneConfig::default();
    assert_eq!(scene.terrain.segments, 500);
    assert_eq!(scene.terrain.size, 10.0);
    assert_eq!(scene.camera.fovy, Deg(35.0));
    assert_eq!(scene.renderer.background, Rgb::from_hex(0x87CEEB));
    assert_eq!(scene.renderer.exposure, 0.7);
    assert_eq!(scene.light.shadow_map_size, 1024);
    assert_eq!(scene.board.outer, [11.0, 2.0, 11.0]);
    assert_eq!(scene.board.hole, [10.0, 2.1, 10.0]);
    assert_eq!(scene.water.level, -0.1);
    assert!(!scene.controls.enable_pan);
    assert!(scene.controls.enable_damping);
}

#[test]
fn pixel_ratio_is_capped() {
    let window = PhysicalSize::new(3000, 1500);
    assert_eq!(render_size(window, 1.0, 2.0), window);
    assert_eq!(render_size(window, 2.0, 2.0), window);
    assert_eq!(render_size(window, 3.0, 2.0), PhysicalSize::new(2000, 1000));
}

#[test]
fn render_size_never_collapses() {
    assert_eq!(
        render_size(PhysicalSize::new(0, 0), 1.0, 2.0),
        PhysicalSize::new(1, 1)
    );
    assert_eq!(
        render_size(PhysicalSize::new(1, 1), 4.0, 2.0),
        PhysicalSize::new(1, 1)
    );
}

#[test]
fn projection_follows_the_window() {
    let scene = SceneConfig::default();
    let mut projection = Projection::from_config(1600, 900, &scene.camera);
    assert!((projection.aspect() - 16.0 / 9.0).abs() < 1e-6);
    projection.resize(900, 900);
    assert_eq!(projection.aspect(), 1.0);
}

#[test]
fn terrain_material_reaches_the_uniform() {
    let config = TerrainConfig {
        metalness: 0.25,
        roughness: 0.75,
        ..TerrainConfig::default()
    };
    let raw = TerrainUniforms::new(&config, Palette::default()).to_raw();
    assert_eq!(raw.metalness, 0.25);
    assert_eq!(raw.roughness, 0.75);

    let reference = TerrainUniforms::new(&TerrainConfig::default(), Palette::default()).to_raw();
    assert_eq!(reference.metalness, 0.0);
    assert_eq!(reference.roughness, 0.5);
}
