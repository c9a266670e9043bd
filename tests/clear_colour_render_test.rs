#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use common::test_utils::{FrameCounter, TestRender, to_rgba8};
    use terrain_sandbox::{
        context::{Context, InitContext},
        flow::ImageTestResult,
    };
    use wgpu::Color;

    golden_image_test!(async move |_: InitContext| {
        TestRender::new(
            None,
            |ctx: &mut Context| ctx.clear_colour = Color::WHITE,
            |_, state: &mut FrameCounter, texture| {
                if state.frame() > 0 {
                    let desired_pixel = to_rgba8(Color::WHITE);
                    for pixel in texture.pixels() {
                        assert_eq!(*pixel, desired_pixel);
                    }
                    Ok(ImageTestResult::Passed)
                } else {
                    Ok(ImageTestResult::Waiting)
                }
            },
        )
    });
}
