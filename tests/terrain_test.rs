use cgmath::{InnerSpace, Vector3};
use terrain_sandbox::config::{Palette, TerrainConfig};
use terrain_sandbox::data_structures::terrain::{
    GRASS_LEVEL, ROCK_SLOPE, SAND_LEVEL, SNOW_LEVEL, TerrainUniforms, smoothstep, step,
};

fn uniforms() -> TerrainUniforms {
    TerrainUniforms::new(&TerrainConfig::default(), Palette::default())
}

fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
}

#[test]
fn flat_at_the_origin_before_scrolling() {
    assert_eq!(uniforms().elevation(0.0, 0.0), 0.0);
}

#[test]
fn elevation_is_bounded_by_strength() {
    let terrain = uniforms();
    for i in -10..=10 {
        for j in -10..=10 {
            let e = terrain.elevation(i as f32 * 0.5, j as f32 * 0.5);
            assert!(e.is_finite());
            // three octaves sum to at most 7/8, squared stays below one
            assert!(e.abs() <= terrain.strength, "{e}");
        }
    }
}

#[test]
fn time_scrolls_the_field_diagonally() {
    let still = uniforms();
    let mut moving = uniforms();
    moving.time = 3.0;
    let offset = 3.0 * moving.scroll_speed;
    for (x, z) in [(0.3, -1.2), (2.0, 2.0), (-4.1, 0.7)] {
        let a = moving.elevation(x, z);
        let b = still.elevation(x + offset, z + offset);
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }
}

#[test]
fn zero_strength_is_flat() {
    let mut terrain = uniforms();
    terrain.strength = 0.0;
    assert_eq!(terrain.elevation(1.7, -2.3), 0.0);
    let normal = terrain.normal(1.7, -2.3);
    assert!((normal - Vector3::unit_y()).magnitude() < 1e-5);
}

#[test]
fn normals_are_unit_and_face_up() {
    let terrain = uniforms();
    for (x, z) in [(0.0, 0.0), (1.5, -3.0), (-4.0, 4.0), (2.2, 0.9)] {
        let n = terrain.normal(x, z);
        assert!((n.magnitude() - 1.0).abs() < 1e-4);
        assert!(n.y > 0.0);
    }
}

#[test]
fn palette_bands_follow_height_and_slope() {
    let terrain = uniforms();
    let palette = Palette::default();
    let flat = 1.0;
    let steep = 0.5;

    let deep = terrain.surface_color(Vector3::new(0.0, -1.5, 0.0), flat);
    assert!(approx(deep, palette.water_deep.to_linear()));

    let sand = terrain.surface_color(Vector3::new(0.0, (SAND_LEVEL + GRASS_LEVEL) / 2.0, 0.0), flat);
    assert!(approx(sand, palette.sand.to_linear()));

    let grass = terrain.surface_color(Vector3::new(0.0, 0.1, 0.0), flat);
    assert!(approx(grass, palette.grass.to_linear()));

    let rock = terrain.surface_color(Vector3::new(0.0, 0.1, 0.0), steep);
    assert!(approx(rock, palette.rock.to_linear()));

    // the snow line never rises above 0.55
    let snow = terrain.surface_color(Vector3::new(0.3, 0.6, 0.8), steep);
    assert!(approx(snow, palette.snow.to_linear()));

    // steep slopes below the grass line stay sand
    let shore = terrain.surface_color(Vector3::new(0.0, -0.08, 0.0), steep);
    assert!(approx(shore, palette.sand.to_linear()));
}

#[test]
fn shade_matches_surface_color_at_rest() {
    let terrain = uniforms();
    let (x, z) = (0.0, 0.0);
    let expected = terrain.surface_color(Vector3::new(x, 0.0, z), terrain.normal(x, z).y);
    assert!(approx(terrain.shade(x, z), expected));
}

#[test]
fn step_functions() {
    assert_eq!(smoothstep(-1.0, -0.1, -2.0), 0.0);
    assert_eq!(smoothstep(-1.0, -0.1, 0.0), 1.0);
    assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    assert_eq!(step(0.5, 0.5), 1.0);
    assert_eq!(step(0.5, 0.49), 0.0);
}

#[test]
fn raw_uniform_carries_live_values() {
    let mut terrain = uniforms();
    terrain.time = 2.5;
    terrain.strength = 4.0;
    let raw = terrain.to_raw();
    assert_eq!(raw.time, 2.5);
    assert_eq!(raw.strength, 4.0);
    assert_eq!(raw.roughness, 0.5);
    assert_eq!(raw.metalness, 0.0);
    assert!(raw.color_snow.iter().all(|c| (c - 1.0).abs() < 1e-5));
    assert_eq!(std::mem::size_of_val(&raw) % 16, 0);
}

#[test]
fn sampled_terrain_lands_in_the_expected_bands() {
    let terrain = uniforms();
    let palette = Palette::default();
    let (deep, surface) = (palette.water_deep.to_linear(), palette.water_surface.to_linear());
    // the snow line wobbles by at most 0.1 around SNOW_LEVEL
    let below_snow = SNOW_LEVEL - 0.11;
    let margin = 1e-3;
    let (mut water, mut sand, mut grass, mut rock) = (0, 0, 0, 0);

    for i in -50..=50 {
        for j in -50..=50 {
            let (x, z) = (i as f32 * 0.1, j as f32 * 0.1);
            let y = terrain.elevation(x, z);
            let up_dot = terrain.normal(x, z).dot(Vector3::unit_y());
            let color = terrain.shade(x, z);

            if y < SAND_LEVEL - margin {
                let t = smoothstep(-1.0, SAND_LEVEL, y);
                let expected = [0, 1, 2].map(|c| deep[c] + (surface[c] - deep[c]) * t);
                assert!(approx(color, expected), "({x}, {z}) at {y} is not water");
                water += 1;
            } else if y >= SAND_LEVEL + margin && y < GRASS_LEVEL - margin {
                assert!(approx(color, palette.sand.to_linear()), "({x}, {z}) at {y} is not sand");
                sand += 1;
            } else if y >= GRASS_LEVEL + margin && y < below_snow {
                if up_dot < ROCK_SLOPE - margin {
                    assert!(approx(color, palette.rock.to_linear()), "({x}, {z}) slope {up_dot} is not rock");
                    rock += 1;
                } else if up_dot >= ROCK_SLOPE + margin {
                    assert!(approx(color, palette.grass.to_linear()), "({x}, {z}) slope {up_dot} is not grass");
                    grass += 1;
                }
            }
        }
    }

    assert!(water > 0 && sand > 0 && grass > 0 && rock > 0, "{water} {sand} {grass} {rock}");
}
