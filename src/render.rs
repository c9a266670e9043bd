//! Render composition and pipeline batching.
//!
//! Flows describe what they want drawn with a [`Render`] tree. The engine
//! flattens all trees into one batch per pipeline and encodes two passes:
//! the shadow pass, which renders every shadow caster into the light's
//! depth map, and the main pass, which draws opaque meshes, then the
//! terrain, then the blended water on top.

use crate::context::Context;

/// Everything needed to issue one indexed draw.
pub struct Drawable<'a> {
    pub vertex: &'a wgpu::Buffer,
    pub index: &'a wgpu::Buffer,
    pub instance: &'a wgpu::Buffer,
    /// Material (group 2) or terrain uniform bind group.
    pub group: &'a wgpu::BindGroup,
    pub amount: u32,
    pub cast_shadow: bool,
}

/// Specifies how a flow's objects should be rendered.
///
/// - `None` renders nothing
/// - `Standard` renders an opaque, lit mesh
/// - `Terrain` renders the displaced terrain grid
/// - `Water` renders a blended water surface after everything else
/// - `Composed` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Standard(Drawable<'a>),
    Terrain(Drawable<'a>),
    Water(Drawable<'a>),
    Composed(Vec<Render<'a>>),
}

#[derive(Default)]
pub(crate) struct Batches<'a> {
    pub standard: Vec<Drawable<'a>>,
    pub terrain: Vec<Drawable<'a>>,
    pub water: Vec<Drawable<'a>>,
}

impl<'a> Batches<'a> {
    pub fn is_empty(&self) -> bool {
        self.standard.is_empty() && self.terrain.is_empty() && self.water.is_empty()
    }
}

impl<'a> Render<'a> {
    pub(crate) fn batch(self, batches: &mut Batches<'a>) {
        match self {
            Render::Standard(drawable) => batches.standard.push(drawable),
            Render::Terrain(drawable) => batches.terrain.push(drawable),
            Render::Water(drawable) => batches.water.push(drawable),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.batch(batches)),
            Render::None => (),
        }
    }
}

/// Views the main pass draws into. With multisampling `color` is the
/// multisampled target and `resolve` the presented texture.
pub(crate) struct FrameTarget<'t> {
    pub color: &'t wgpu::TextureView,
    pub resolve: Option<&'t wgpu::TextureView>,
    pub depth: &'t wgpu::TextureView,
}

fn draw(render_pass: &mut wgpu::RenderPass<'_>, drawable: &Drawable) {
    if drawable.amount == 0 {
        log::warn!("you attemted to render something with zero indices");
        return;
    }
    render_pass.set_vertex_buffer(0, drawable.vertex.slice(..));
    render_pass.set_vertex_buffer(1, drawable.instance.slice(..));
    render_pass.set_index_buffer(drawable.index.slice(..), wgpu::IndexFormat::Uint32);
    render_pass.draw_indexed(0..drawable.amount, 0, 0..1);
}

pub(crate) fn encode_shadow_pass(
    ctx: &Context,
    encoder: &mut wgpu::CommandEncoder,
    batches: &Batches,
) {
    let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Shadow Pass"),
        color_attachments: &[],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &ctx.light.shadow_map.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    });
    // cleared even without casters so stale depth never darkens the scene
    if !ctx.light.casts_shadows {
        return;
    }

    shadow_pass.set_bind_group(0, &ctx.light.shadow_view_bind_group, &[]);
    shadow_pass.set_pipeline(&ctx.pipelines.shadow);
    for drawable in batches.standard.iter().filter(|d| d.cast_shadow) {
        draw(&mut shadow_pass, drawable);
    }

    shadow_pass.set_pipeline(&ctx.pipelines.terrain_shadow);
    for drawable in batches.terrain.iter().filter(|d| d.cast_shadow) {
        shadow_pass.set_bind_group(1, drawable.group, &[]);
        draw(&mut shadow_pass, drawable);
    }
}

pub(crate) fn encode_main_pass(
    ctx: &Context,
    encoder: &mut wgpu::CommandEncoder,
    target: FrameTarget,
    batches: &Batches,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target.color,
            resolve_target: target.resolve,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(ctx.clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: target.depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    });

    render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
    render_pass.set_bind_group(1, &ctx.light.bind_group, &[]);

    render_pass.set_pipeline(&ctx.pipelines.standard);
    for drawable in &batches.standard {
        render_pass.set_bind_group(2, drawable.group, &[]);
        draw(&mut render_pass, drawable);
    }

    render_pass.set_pipeline(&ctx.pipelines.terrain);
    for drawable in &batches.terrain {
        render_pass.set_bind_group(2, drawable.group, &[]);
        draw(&mut render_pass, drawable);
    }

    render_pass.set_pipeline(&ctx.pipelines.water);
    for drawable in &batches.water {
        render_pass.set_bind_group(2, drawable.group, &[]);
        draw(&mut render_pass, drawable);
    }
}
