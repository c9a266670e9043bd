//! Procedural terrain: noise-displaced grid and its height-based palette.
//!
//! The GPU does the actual displacement every frame (see `terrain.wgsl`).
//! [`TerrainUniforms`] carries the same parameters on the CPU and mirrors the
//! shader functions so the surface can be queried outside of a draw call.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    config::{Palette, TerrainConfig},
    data_structures::{
        geometry::Geometry, instance::Instance, model::Mesh, noise::simplex2,
    },
    render::Drawable,
};

/// Surfaces flatter than this (dot of normal and up) stay grass, steeper ones
/// turn to rock.
pub const ROCK_SLOPE: f32 = 0.8;
pub const SAND_LEVEL: f32 = -0.1;
pub const GRASS_LEVEL: f32 = -0.06;
pub const SNOW_LEVEL: f32 = 0.45;

/// Live terrain parameters. These are the values the debug panel edits.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainUniforms {
    pub time: f32,
    pub position_frequency: f32,
    pub strength: f32,
    pub warp_frequency: f32,
    pub warp_strength: f32,
    pub scroll_speed: f32,
    pub normal_shift: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub palette: Palette,
}

impl TerrainUniforms {
    pub fn new(config: &TerrainConfig, palette: Palette) -> Self {
        Self {
            time: 0.0,
            position_frequency: config.position_frequency,
            strength: config.strength,
            warp_frequency: config.warp_frequency,
            warp_strength: config.warp_strength,
            scroll_speed: config.scroll_speed,
            normal_shift: config.normal_shift,
            metalness: config.metalness,
            roughness: config.roughness,
            palette,
        }
    }

    fn scroll(&self) -> f32 {
        self.time * self.scroll_speed
    }

    /// Height of the displaced surface above the undisplaced grid point `(x, z)`.
    pub fn elevation(&self, x: f32, z: f32) -> f32 {
        let scroll = self.scroll();
        let (mut px, mut pz) = (x + scroll, z + scroll);
        let warp_scale = self.position_frequency * self.warp_frequency;
        let warp = simplex2(px * warp_scale, pz * warp_scale) * self.warp_strength;
        px += warp;
        pz += warp;

        let f = self.position_frequency;
        let mut elevation = 0.0;
        elevation += simplex2(px * f, pz * f) / 2.0;
        elevation += simplex2(px * f * 2.0, pz * f * 2.0) / 4.0;
        elevation += simplex2(px * f * 4.0, pz * f * 4.0) / 8.0;

        // squaring flattens the lowlands and sharpens the peaks
        let elevation = elevation * elevation.abs();
        elevation * self.strength
    }

    pub fn displaced(&self, x: f32, z: f32) -> Vector3<f32> {
        Vector3::new(x, self.elevation(x, z), z)
    }

    /// Surface normal from two neighbours at `normal_shift` along +x and -z.
    pub fn normal(&self, x: f32, z: f32) -> Vector3<f32> {
        let shift = self.normal_shift;
        let position = self.displaced(x, z);
        let to_a = (self.displaced(x + shift, z) - position).normalize();
        let to_b = (self.displaced(x, z - shift) - position).normalize();
        to_a.cross(to_b).normalize()
    }

    /// Linear albedo of the surface at grid point `(x, z)`.
    pub fn shade(&self, x: f32, z: f32) -> [f32; 3] {
        let scroll = self.scroll();
        let position = Vector3::new(x + scroll, self.elevation(x, z), z + scroll);
        let up_dot = self.normal(x, z).dot(Vector3::unit_y());
        self.surface_color(position, up_dot)
    }

    /// Palette lookup for a (scrolled) surface position and its slope.
    pub fn surface_color(&self, position: Vector3<f32>, up_dot: f32) -> [f32; 3] {
        let palette = &self.palette;
        let y = position.y;

        let surface_water_mix = smoothstep(-1.0, SAND_LEVEL, y);
        let mut color = mix(
            palette.water_deep.to_linear(),
            palette.water_surface.to_linear(),
            surface_water_mix,
        );
        color = mix(color, palette.sand.to_linear(), step(SAND_LEVEL, y));
        color = mix(color, palette.grass.to_linear(), step(GRASS_LEVEL, y));

        let rock_mix = (1.0 - step(ROCK_SLOPE, up_dot)) * step(GRASS_LEVEL, y);
        color = mix(color, palette.rock.to_linear(), rock_mix);

        let snow_threshold = SNOW_LEVEL + simplex2(position.x * 15.0, position.z * 15.0) * 0.1;
        color = mix(color, palette.snow.to_linear(), step(snow_threshold, y));

        color
    }

    pub fn to_raw(&self) -> TerrainUniform {
        let palette = &self.palette;
        TerrainUniform {
            time: self.time,
            position_frequency: self.position_frequency,
            strength: self.strength,
            warp_frequency: self.warp_frequency,
            warp_strength: self.warp_strength,
            scroll_speed: self.scroll_speed,
            normal_shift: self.normal_shift,
            roughness: self.roughness,
            metalness: self.metalness,
            _padding: [0.0; 3],
            color_water_deep: palette.water_deep.to_linear_vec4(),
            color_water_surface: palette.water_surface.to_linear_vec4(),
            color_sand: palette.sand.to_linear_vec4(),
            color_grass: palette.grass.to_linear_vec4(),
            color_snow: palette.snow.to_linear_vec4(),
            color_rock: palette.rock.to_linear_vec4(),
        }
    }
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn step(edge: f32, x: f32) -> f32 {
    if x < edge { 0.0 } else { 1.0 }
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// GPU layout of [`TerrainUniforms`], shared by the terrain colour and shadow pipelines.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainUniform {
    pub time: f32,
    pub position_frequency: f32,
    pub strength: f32,
    pub warp_frequency: f32,
    pub warp_strength: f32,
    pub scroll_speed: f32,
    pub normal_shift: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub _padding: [f32; 3],
    pub color_water_deep: [f32; 4],
    pub color_water_surface: [f32; 4],
    pub color_sand: [f32; 4],
    pub color_grass: [f32; 4],
    pub color_snow: [f32; 4],
    pub color_rock: [f32; 4],
}

/// The terrain grid on the GPU together with its uniforms.
pub struct TerrainMesh {
    pub mesh: Mesh,
    pub uniforms: TerrainUniforms,
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl TerrainMesh {
    /// Builds the flat grid, lays it onto the XZ plane and keeps positions only.
    pub fn geometry(config: &TerrainConfig) -> Geometry {
        let mut geometry =
            Geometry::plane(config.size, config.size, config.segments, config.segments);
        geometry.rotate_x(cgmath::Rad(-std::f32::consts::FRAC_PI_2));
        geometry
    }

    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        config: &TerrainConfig,
        palette: Palette,
    ) -> Self {
        let geometry = Self::geometry(config);
        let mesh = Mesh::positions_only(device, "terrain", &geometry);
        log::info!(
            "terrain grid: {} vertices, {} triangles",
            geometry.vertices.len(),
            geometry.triangle_count()
        );

        let uniforms = TerrainUniforms::new(config, palette);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms.to_raw()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("terrain_bind_group"),
        });
        let instance_buffer = Instance::new().to_buffer(device, "Terrain Instance Buffer");

        Self {
            mesh,
            uniforms,
            instance_buffer,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.uniforms.to_raw()]),
        );
    }

    pub fn drawable(&self) -> Drawable<'_> {
        Drawable {
            vertex: &self.mesh.vertex_buffer,
            index: &self.mesh.index_buffer,
            instance: &self.instance_buffer,
            group: &self.bind_group,
            amount: self.mesh.num_elements,
            cast_shadow: true,
        }
    }
}
