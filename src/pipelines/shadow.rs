use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{MeshVertex, TerrainVertex, Vertex},
    },
    pipelines::{COMMON_WGSL, Layouts, TERRAIN_COMMON_WGSL, basic, compose},
};

/// Renders standard meshes into the shadow map.
pub fn mk_shadow_pipeline(device: &wgpu::Device, layouts: &Layouts) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[Some(&layouts.camera)],
        immediate_size: 0,
    });
    let shader = compose(
        "Shadow Shader",
        &[COMMON_WGSL, include_str!("shaders/shadow.wgsl")],
    );
    basic::mk_depth_pipeline(
        device,
        &layout,
        &[MeshVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}

/// Renders the displaced terrain into the shadow map. The terrain uniform
/// sits at group 1 here because the light group cannot be bound while its
/// shadow map is the depth attachment.
pub fn mk_terrain_shadow_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Terrain Shadow Pipeline Layout"),
        bind_group_layouts: &[Some(&layouts.camera), Some(&layouts.terrain)],
        immediate_size: 0,
    });
    let shader = compose(
        "Terrain Shadow Shader",
        &[
            COMMON_WGSL,
            TERRAIN_COMMON_WGSL,
            include_str!("shaders/terrain_shadow.wgsl"),
        ],
    );
    basic::mk_depth_pipeline(
        device,
        &layout,
        &[TerrainVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
