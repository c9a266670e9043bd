#![allow(dead_code)]

use terrain_sandbox::{
    context::Context,
    data_structures::color::linear_to_srgb,
    flow::{GraphicsFlow, ImageTestResult, Out},
    render::Render,
};

pub type TestImage = image::RgbaImage;

pub struct FrameCounter(pub u32);
impl Default for FrameCounter {
    fn default() -> Self {
        Self(0)
    }
}
impl FrameCounter {
    pub fn frame(&self) -> u32 {
        self.0
    }

    pub fn progress(&mut self) {
        self.0 += 1;
    }
}

type Setup = Box<dyn FnOnce(&mut Context)>;
type Validate =
    Box<dyn Fn(&Context, &mut FrameCounter, &mut TestImage) -> Result<ImageTestResult, anyhow::Error>>;

/// Wraps an optional scene flow with a setup hook and a pixel validator.
pub struct TestRender {
    flow: Option<Box<dyn GraphicsFlow<FrameCounter>>>,
    setup: Option<Setup>,
    validate: Validate,
}

impl TestRender {
    pub fn new(
        flow: Option<Box<dyn GraphicsFlow<FrameCounter>>>,
        setup: impl FnOnce(&mut Context) + 'static,
        validate: impl Fn(&Context, &mut FrameCounter, &mut TestImage) -> Result<ImageTestResult, anyhow::Error>
        + 'static,
    ) -> Self {
        Self {
            flow,
            setup: Some(Box::new(setup)),
            validate: Box::new(validate),
        }
    }
}

impl GraphicsFlow<FrameCounter> for TestRender {
    fn on_init(&mut self, ctx: &mut Context, s: &mut FrameCounter) -> Out<FrameCounter> {
        let out = match &mut self.flow {
            Some(flow) => flow.on_init(ctx, s),
            None => Out::Empty,
        };
        let Some(setup) = self.setup.take() else {
            return out;
        };
        // the scene's own configuration runs first so the test setup wins
        Out::Configure(Box::new(move |ctx, s| {
            if let Out::Configure(configure) = out {
                configure(ctx, s);
            }
            setup(ctx);
        }))
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        s: &mut FrameCounter,
        dt: std::time::Duration,
    ) -> Out<FrameCounter> {
        s.progress();
        match &mut self.flow {
            Some(flow) => flow.on_update(ctx, s, dt),
            None => Out::Empty,
        }
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &terrain_sandbox::DeviceEvent,
    ) -> Out<FrameCounter> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &terrain_sandbox::WindowEvent,
    ) -> Out<FrameCounter> {
        Out::Empty
    }

    fn on_render(&self) -> Render<'_> {
        match &self.flow {
            Some(flow) => flow.on_render(),
            None => Render::None,
        }
    }

    fn render_to_texture(
        &self,
        ctx: &Context,
        s: &mut FrameCounter,
        texture: &mut TestImage,
    ) -> Result<ImageTestResult, anyhow::Error> {
        (self.validate)(ctx, s, texture)
    }
}

/// The bytes a linear `colour` is stored as in an sRGB render target.
pub fn to_rgba8(colour: wgpu::Color) -> image::Rgba<u8> {
    let f_to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let encode = |v: f64| f_to_u8(linear_to_srgb(v as f32));
    image::Rgba([
        encode(colour.r),
        encode(colour.g),
        encode(colour.b),
        f_to_u8(colour.a as f32),
    ])
}

#[macro_export]
macro_rules! golden_image_test {
    ($graphics_elem:expr) => {{
        use crate::common::test_utils::FrameCounter;
        use terrain_sandbox::flow::FlowConstructor;
        use terrain_sandbox::flow::GraphicsFlow;
        let constructor: FlowConstructor<FrameCounter> = Box::new(|ctx| {
            Box::pin(async move {
                let g_flow: Box<dyn GraphicsFlow<FrameCounter>> =
                    Box::new(($graphics_elem)(ctx).await);
                g_flow
            })
        });

        terrain_sandbox::flow::run(
            vec![constructor],
            terrain_sandbox::config::SceneConfig::default(),
        )
        .expect("Failed to run flow for integration test.");
    }};
}
