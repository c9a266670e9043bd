//! The sandbox scene: terrain, water, the carved wooden board and the
//! terrain tweak panel, assembled as a single flow.

use cgmath::Vector3;
use image::{DynamicImage, Rgba, RgbaImage};
use instant::Duration;
use winit::event::{DeviceEvent, WindowEvent};

use crate::{
    config::SceneConfig,
    context::{Context, InitContext},
    csg::{Brush, Evaluator, Operation},
    data_structures::{
        color::Rgb,
        geometry::Geometry,
        instance::Instance,
        model::{Material, MaterialUniform, Mesh},
        terrain::TerrainMesh,
        texture::Texture,
    },
    debug::DebugPanel,
    flow::{FlowConstructor, GraphicsFlow, Out},
    render::{Drawable, Render},
    resources,
};

/// A mesh with its material and a single placement.
struct Placed {
    mesh: Mesh,
    material: Material,
    instance_buffer: wgpu::Buffer,
    cast_shadow: bool,
}

impl Placed {
    fn drawable(&self) -> Drawable<'_> {
        Drawable {
            vertex: &self.mesh.vertex_buffer,
            index: &self.mesh.index_buffer,
            instance: &self.instance_buffer,
            group: &self.material.bind_group,
            amount: self.mesh.num_elements,
            cast_shadow: self.cast_shadow,
        }
    }
}

pub struct SandboxScene {
    terrain: TerrainMesh,
    water: Placed,
    board: Placed,
    panel: DebugPanel,
    /// Handed to the light on init, then dropped.
    environment: Option<image::Rgba32FImage>,
}

impl SandboxScene {
    pub async fn new(ctx: InitContext) -> Self {
        let InitContext {
            device,
            queue,
            layouts,
            scene,
            max_texture_dimension,
        } = ctx;

        let environment = resources::load_environment_or_sky(
            &scene.renderer.environment_map,
            max_texture_dimension,
            scene.renderer.background,
        )
        .await;

        let terrain = TerrainMesh::new(&device, &layouts.terrain, &scene.terrain, scene.palette);
        let panel = DebugPanel::new(&terrain.uniforms);

        let water = {
            let geometry = Geometry::plane(scene.water.size, scene.water.size, 1, 1);
            let instance = Instance::new()
                .with_position(Vector3::new(0.0, scene.water.level, 0.0))
                .with_rotation_x(scene.water.rotation_x);
            let uniform = MaterialUniform::new(Rgb::WHITE, 0.0, scene.water.roughness)
                .with_transmission(scene.water.transmission);
            Placed {
                mesh: Mesh::from_geometry(&device, "water", &geometry),
                material: Material::new(
                    &device,
                    "water",
                    white_texture(&device, &queue),
                    uniform,
                    &layouts.material,
                ),
                instance_buffer: instance.to_buffer(&device, "Water Instance Buffer"),
                cast_shadow: false,
            }
        };

        let board = {
            let geometry = board_geometry(&scene);
            let texture =
                resources::load_texture_or_wood(&scene.board.texture, &device, &queue).await;
            let uniform = MaterialUniform::new(
                scene.board.color,
                scene.board.metalness,
                scene.board.roughness,
            );
            Placed {
                mesh: Mesh::from_geometry(&device, "board", &geometry),
                material: Material::new(&device, "board", texture, uniform, &layouts.material),
                instance_buffer: Instance::new().to_buffer(&device, "Board Instance Buffer"),
                cast_shadow: true,
            }
        };

        Self {
            terrain,
            water,
            board,
            panel,
            environment: Some(environment),
        }
    }

    /// Boxes the constructor up for [`crate::flow::run`].
    pub fn constructor() -> FlowConstructor<()> {
        Box::new(|ctx| {
            Box::pin(async move {
                let flow: Box<dyn GraphicsFlow<()>> = Box::new(SandboxScene::new(ctx).await);
                flow
            })
        })
    }

    pub fn panel(&self) -> &DebugPanel {
        &self.panel
    }
}

/// The wooden frame: the outer box with the taller hole box carved out.
pub fn board_geometry(scene: &SceneConfig) -> Geometry {
    let [ow, oh, od] = scene.board.outer;
    let [hw, hh, hd] = scene.board.hole;
    let outer = Brush::new(Geometry::cuboid(ow, oh, od));
    let hole = Brush::new(Geometry::cuboid(hw, hh, hd));
    Evaluator::default().evaluate(&outer, &hole, Operation::Subtraction)
}

fn white_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> Texture {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])));
    Texture::from_image(device, queue, &img, Some("white"))
}

impl<S> GraphicsFlow<S> for SandboxScene {
    fn on_init(&mut self, ctx: &mut Context, _: &mut S) -> Out<S> {
        if let Some(environment) = self.environment.take() {
            log::info!(
                "environment map {}x{}",
                environment.width(),
                environment.height()
            );
            ctx.light
                .set_environment(&ctx.device, &ctx.queue, &environment);
        }
        self.terrain.write_uniforms(&ctx.queue);
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, _: &mut S, _: Duration) -> Out<S> {
        self.panel.drain_pending();
        self.panel.apply(&mut self.terrain.uniforms);
        self.terrain.uniforms.time = ctx.elapsed.as_secs_f32();
        self.terrain.write_uniforms(&ctx.queue);
        Out::Empty
    }

    fn on_device_events(&mut self, _: &Context, _: &mut S, _: &DeviceEvent) -> Out<S> {
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &mut S, event: &WindowEvent) -> Out<S> {
        self.panel.handle_window_event(event);
        Out::Empty
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(vec![
            Render::Standard(self.board.drawable()),
            Render::Terrain(self.terrain.drawable()),
            Render::Water(self.water.drawable()),
        ])
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _: &Context,
        _: &mut S,
        _: &mut image::RgbaImage,
    ) -> Result<crate::flow::ImageTestResult, anyhow::Error> {
        Ok(crate::flow::ImageTestResult::Passed)
    }
}
