//! Scene configuration.
//!
//! Every constant the sandbox is assembled from lives here, grouped by the
//! object it configures. `SceneConfig::default()` reproduces the reference
//! scene; flows read from it once during construction.

use cgmath::{Deg, Point3, Rad};

use crate::data_structures::color::Rgb;

#[derive(Clone, Debug, Default)]
pub struct SceneConfig {
    pub terrain: TerrainConfig,
    pub palette: Palette,
    pub water: WaterConfig,
    pub board: BoardConfig,
    pub light: LightConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub renderer: RendererConfig,
}

/// Grid resolution and the noise parameters of the displaced terrain.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainConfig {
    pub size: f32,
    /// Quads per side; the vertex count grows quadratically with this.
    pub segments: u32,
    pub position_frequency: f32,
    pub strength: f32,
    pub warp_frequency: f32,
    pub warp_strength: f32,
    /// World units per second the noise field drifts along +x/+z.
    pub scroll_speed: f32,
    /// Distance to the neighbours used to derive the displaced normal.
    pub normal_shift: f32,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            segments: 500,
            position_frequency: 0.225,
            strength: 2.625,
            warp_frequency: 1.25,
            warp_strength: 0.245,
            scroll_speed: 0.2,
            normal_shift: 0.01,
            metalness: 0.0,
            roughness: 0.5,
        }
    }
}

/// Terrain colours from the deepest water up to the snow line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub water_deep: Rgb,
    pub water_surface: Rgb,
    pub sand: Rgb,
    pub grass: Rgb,
    pub snow: Rgb,
    pub rock: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            water_deep: Rgb::from_hex(0x002b3d),
            water_surface: Rgb::from_hex(0x66a8ff),
            sand: Rgb::from_hex(0xffe894),
            grass: Rgb::from_hex(0x85d534),
            snow: Rgb::from_hex(0xffffff),
            rock: Rgb::from_hex(0xbfbd8d),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WaterConfig {
    pub size: f32,
    pub level: f32,
    pub rotation_x: Rad<f32>,
    pub transmission: f32,
    pub roughness: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            level: -0.1,
            rotation_x: Rad(-std::f32::consts::FRAC_PI_2),
            transmission: 1.0,
            roughness: 0.3,
        }
    }
}

/// The wooden frame around the terrain: an outer box minus a slightly
/// taller inner box.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardConfig {
    pub outer: [f32; 3],
    pub hole: [f32; 3],
    pub texture: String,
    pub color: Rgb,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            outer: [11.0, 2.0, 11.0],
            hole: [10.0, 2.1, 10.0],
            texture: "textures/wood_plank.png".to_string(),
            color: Rgb::WHITE,
            metalness: 0.1,
            roughness: 0.6,
        }
    }
}

/// Directional light plus its orthographic shadow camera.
#[derive(Clone, Debug, PartialEq)]
pub struct LightConfig {
    pub color: Rgb,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub shadow_map_size: u32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub shadow_left: f32,
    pub shadow_right: f32,
    pub shadow_top: f32,
    pub shadow_bottom: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            intensity: 2.15,
            position: Point3::new(6.25, 3.0, 4.0),
            target: Point3::new(0.0, 0.0, 0.0),
            shadow_map_size: 1024,
            shadow_near: 0.1,
            shadow_far: 30.0,
            shadow_left: -8.0,
            shadow_right: 8.0,
            shadow_top: 8.0,
            shadow_bottom: -8.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub fovy: Deg<f32>,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy: Deg(35.0),
            near: 0.1,
            far: 100.0,
            position: Point3::new(-10.0, 6.0, -2.0),
            target: Point3::new(0.0, 0.0, 0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControlsConfig {
    pub enable_pan: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_polar_angle: Rad<f32>,
    pub max_polar_angle: Rad<f32>,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_pan: false,
            enable_damping: true,
            damping_factor: 0.1,
            min_polar_angle: Rad(0.0),
            max_polar_angle: Rad(std::f32::consts::FRAC_PI_2 - 0.2),
            min_distance: 5.0,
            max_distance: 45.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RendererConfig {
    pub antialias: bool,
    pub shadows: bool,
    pub exposure: f32,
    pub max_pixel_ratio: f64,
    pub background: Rgb,
    pub environment_map: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            shadows: true,
            exposure: 0.7,
            max_pixel_ratio: 2.0,
            background: Rgb::from_hex(0x87CEEB),
            environment_map: "spruit_sunrise.hdr".to_string(),
        }
    }
}
