//! Render pipelines and the bind group layouts they share.
//!
//! Every main-pass shader sees the camera at group 0, the light (with shadow
//! and environment maps) at group 1 and its own material at group 2. The
//! shadow pipelines see the light's view at group 0 instead of the camera.
//! WGSL has no includes, so shared code is concatenated in [`compose`].

pub mod basic;
pub mod light;
pub mod shadow;
pub mod standard;
pub mod terrain;
pub mod water;

use crate::{camera, resources::texture::{material_layout, terrain_layout}};

pub(crate) const COMMON_WGSL: &str = include_str!("shaders/common.wgsl");
pub(crate) const LIGHTING_WGSL: &str = include_str!("shaders/lighting.wgsl");
pub(crate) const TERRAIN_COMMON_WGSL: &str = include_str!("shaders/terrain_common.wgsl");

/// Joins shader sources into one module, in order.
pub fn compose<'a>(label: &'a str, parts: &[&str]) -> wgpu::ShaderModuleDescriptor<'a> {
    wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(parts.join("\n").into()),
    }
}

#[derive(Clone, Debug)]
pub struct Layouts {
    pub camera: wgpu::BindGroupLayout,
    pub light: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub terrain: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            camera: camera::mk_bind_group_layout(device),
            light: light::mk_bind_group_layout(device),
            material: material_layout(device),
            terrain: terrain_layout(device),
        }
    }
}

#[derive(Debug)]
pub struct Pipelines {
    pub standard: wgpu::RenderPipeline,
    pub terrain: wgpu::RenderPipeline,
    pub water: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    pub terrain_shadow: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, target: basic::Target, layouts: &Layouts) -> Self {
        Self {
            standard: standard::mk_standard_pipeline(device, target, layouts),
            terrain: terrain::mk_terrain_pipeline(device, target, layouts),
            water: water::mk_water_pipeline(device, target, layouts),
            shadow: shadow::mk_shadow_pipeline(device, layouts),
            terrain_shadow: shadow::mk_terrain_shadow_pipeline(device, layouts),
        }
    }
}
