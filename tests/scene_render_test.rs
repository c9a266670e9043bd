#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_draw_the_sandbox_over_the_sky() {
    use common::test_utils::{FrameCounter, TestRender, to_rgba8};
    use terrain_sandbox::{
        context::{Context, InitContext},
        flow::{GraphicsFlow, ImageTestResult},
        scene::SandboxScene,
    };

    golden_image_test!(async move |ctx: InitContext| {
        let scene: Box<dyn GraphicsFlow<FrameCounter>> = Box::new(SandboxScene::new(ctx).await);
        TestRender::new(
            Some(scene),
            |_: &mut Context| {},
            |ctx: &Context, state: &mut FrameCounter, texture| {
                if state.frame() < 3 {
                    return Ok(ImageTestResult::Waiting);
                }
                let (width, height) = (ctx.config.width, ctx.config.height);
                let sky = to_rgba8(ctx.clear_colour);
                // encoding the linear clear colour gives back the authored bytes
                let background = ctx.scene.renderer.background;
                assert!(
                    [background.r, background.g, background.b]
                        .iter()
                        .zip(&sky.0[..3])
                        .all(|(authored, encoded)| authored.abs_diff(*encoded) <= 1)
                );
                let is_sky = |p: &image::Rgba<u8>| {
                    sky.0[..3]
                        .iter()
                        .zip(&p.0[..3])
                        .all(|(want, got)| want.abs_diff(*got) <= 2)
                };
                // the camera looks at the origin, so the centre must be covered
                let centre = texture.get_pixel(width / 2, height / 2);
                assert!(!is_sky(centre));
                // and some sky remains visible above the board
                let sky_visible = (0..width).any(|x| is_sky(texture.get_pixel(x, 0)));
                assert!(sky_visible);
                Ok(ImageTestResult::Passed)
            },
        )
    });
}
