use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{MeshVertex, Vertex},
    },
    pipelines::{COMMON_WGSL, LIGHTING_WGSL, Layouts, basic, compose},
};

/// Alpha blended water. Drawn last and without depth writes so the terrain
/// under the surface stays visible.
pub fn mk_water_pipeline(
    device: &wgpu::Device,
    target: basic::Target,
    layouts: &Layouts,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Water Pipeline Layout"),
        bind_group_layouts: &[Some(&layouts.camera), Some(&layouts.light), Some(&layouts.material)],
        immediate_size: 0,
    });
    let shader = compose(
        "Water Shader",
        &[COMMON_WGSL, LIGHTING_WGSL, include_str!("shaders/water.wgsl")],
    );

    basic::mk_render_pipeline(
        device,
        &layout,
        target,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        false,
        Some(wgpu::Face::Back),
        &[MeshVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
