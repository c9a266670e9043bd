use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{TerrainVertex, Vertex},
    },
    pipelines::{COMMON_WGSL, LIGHTING_WGSL, Layouts, TERRAIN_COMMON_WGSL, basic, compose},
};

/// Displaces the position-only grid in the vertex stage and colours it by
/// height and slope.
pub fn mk_terrain_pipeline(
    device: &wgpu::Device,
    target: basic::Target,
    layouts: &Layouts,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Terrain Pipeline Layout"),
        bind_group_layouts: &[Some(&layouts.camera), Some(&layouts.light), Some(&layouts.terrain)],
        immediate_size: 0,
    });
    let shader = compose(
        "Terrain Shader",
        &[
            COMMON_WGSL,
            LIGHTING_WGSL,
            TERRAIN_COMMON_WGSL,
            include_str!("shaders/terrain.wgsl"),
        ],
    );

    basic::mk_render_pipeline(
        device,
        &layout,
        target,
        Some(wgpu::BlendState::REPLACE),
        true,
        Some(wgpu::Face::Back),
        &[TerrainVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
