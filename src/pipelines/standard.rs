use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{MeshVertex, Vertex},
    },
    pipelines::{COMMON_WGSL, LIGHTING_WGSL, Layouts, basic, compose},
};

/// Opaque, lit and textured meshes that receive shadows.
pub fn mk_standard_pipeline(
    device: &wgpu::Device,
    target: basic::Target,
    layouts: &Layouts,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Standard Pipeline Layout"),
        bind_group_layouts: &[Some(&layouts.camera), Some(&layouts.light), Some(&layouts.material)],
        immediate_size: 0,
    });
    let shader = compose(
        "Standard Shader",
        &[COMMON_WGSL, LIGHTING_WGSL, include_str!("shaders/standard.wgsl")],
    );

    basic::mk_render_pipeline(
        device,
        &layout,
        target,
        Some(wgpu::BlendState::REPLACE),
        true,
        Some(wgpu::Face::Back),
        &[MeshVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
