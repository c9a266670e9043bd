//! The GPU and window context shared by all flows.

use std::sync::Arc;

use anyhow::Context as _;
use instant::Duration;
use winit::window::Window;

use crate::{
    camera::{self, CameraResources, Projection},
    config::SceneConfig,
    controls::OrbitControls,
    data_structures::texture,
    pipelines::{Layouts, Pipelines, basic::Target, light::LightResources},
};

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub(crate) msaa_target: Option<texture::Texture>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub sample_count: u32,
    pub scene: SceneConfig,
    pub layouts: Layouts,
    pub pipelines: Pipelines,
    pub camera: CameraResources,
    pub projection: Projection,
    pub controls: OrbitControls,
    pub light: LightResources,
    pub clear_colour: wgpu::Color,
    /// Time since the first frame.
    pub elapsed: Duration,
}

impl Context {
    pub async fn new(window: Arc<Window>, scene: SceneConfig) -> anyhow::Result<Self> {
        let size = camera::render_size(
            window.inner_size(),
            window.scale_factor(),
            scene.renderer.max_pixel_ratio,
        );

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("requesting the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders write linear colour and rely on an sRGB surface to encode it.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let sample_count = if scene.renderer.antialias
            && adapter
                .get_texture_format_features(surface_format)
                .flags
                .sample_count_supported(4)
        {
            4
        } else {
            1
        };
        log::info!(
            "surface {:?} at {}x{}, {}x multisampling",
            surface_format,
            config.width,
            config.height,
            sample_count
        );

        let layouts = Layouts::new(&device);
        let pipelines = Pipelines::new(
            &device,
            Target {
                format: surface_format,
                sample_count,
            },
            &layouts,
        );

        let projection = Projection::from_config(config.width, config.height, &scene.camera);
        let camera = CameraResources::new(
            &device,
            camera::Camera::from_config(&scene.camera),
            &projection,
        );
        let controls = OrbitControls::new(scene.controls.clone(), scene.camera.target);

        let light = LightResources::new(
            &device,
            &queue,
            &scene.light,
            &scene.renderer,
            &layouts.light,
            &layouts.camera,
        );

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );
        let msaa_target = (sample_count > 1)
            .then(|| texture::Texture::create_msaa_target(&device, &config, sample_count));
        let clear_colour = scene.renderer.background.to_wgpu();

        Ok(Self {
            window,
            depth_texture,
            msaa_target,
            surface,
            device,
            queue,
            config,
            sample_count,
            scene,
            layouts,
            pipelines,
            camera,
            projection,
            controls,
            light,
            clear_colour,
            elapsed: Duration::ZERO,
        })
    }

    /// Reconfigures the surface and recreates the size-dependent targets.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = texture::Texture::create_depth_texture(
            &self.device,
            [width, height],
            self.sample_count,
            "depth_texture",
        );
        if self.sample_count > 1 {
            self.msaa_target = Some(texture::Texture::create_msaa_target(
                &self.device,
                &self.config,
                self.sample_count,
            ));
        }
    }
}

/// What flow constructors get to build their GPU resources with.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub layouts: Layouts,
    pub scene: SceneConfig,
    pub max_texture_dimension: u32,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            layouts: ctx.layouts.clone(),
            scene: ctx.scene.clone(),
            max_texture_dimension: ctx.device.limits().max_texture_dimension_2d,
        }
    }
}
