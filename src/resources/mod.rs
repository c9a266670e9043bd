//! Asset loading and procedural stand-ins for missing assets.
//!
//! Natively assets are read from `./assets`, on the web they are fetched from
//! `<origin>/assets/`. A missing or broken asset never stops the scene: the
//! `*_or_*` helpers log a warning and substitute a generated image.

use anyhow::Context;
use image::{DynamicImage, ImageFormat, Rgba, Rgba32FImage, RgbaImage, imageops::FilterType};

use crate::data_structures::{color::Rgb, noise::simplex2, texture::Texture};

pub mod texture;

pub use texture::{load_binary, load_texture};

/// Decodes a Radiance HDR equirectangular map. Maps wider than
/// `max_dimension` are downscaled (keeping the 2:1 aspect) so the texture
/// fits the device limits.
pub fn decode_environment(bytes: &[u8], max_dimension: u32) -> anyhow::Result<Rgba32FImage> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)
        .context("decoding environment map")?;
    let img = img.to_rgba32f();
    let (width, height) = img.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return Ok(img);
    }
    let scale = max_dimension as f32 / width.max(height) as f32;
    let (new_width, new_height) = (
        ((width as f32 * scale) as u32).max(1),
        ((height as f32 * scale) as u32).max(1),
    );
    log::info!("downscaling environment map from {width}x{height} to {new_width}x{new_height}");
    Ok(image::imageops::resize(
        &img,
        new_width,
        new_height,
        FilterType::Triangle,
    ))
}

pub async fn load_environment(
    file_name: &str,
    max_dimension: u32,
) -> anyhow::Result<Rgba32FImage> {
    let bytes = load_binary(file_name)
        .await
        .with_context(|| format!("loading {file_name}"))?;
    decode_environment(&bytes, max_dimension)
}

/// The environment map, or a generated sky when it cannot be loaded.
pub async fn load_environment_or_sky(
    file_name: &str,
    max_dimension: u32,
    background: Rgb,
) -> Rgba32FImage {
    match load_environment(file_name, max_dimension).await {
        Ok(img) => img,
        Err(e) => {
            log::warn!("{e:#}; using a procedural sky instead");
            procedural_sky(256.min(max_dimension), 128.min(max_dimension / 2), background)
        }
    }
}

/// The wood texture, or generated planks when it cannot be loaded.
pub async fn load_texture_or_wood(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    match load_texture(file_name, device, queue, None).await {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("could not load {file_name} ({e:#}); using procedural wood");
            Texture::from_image(device, queue, &procedural_wood(256, 256), Some("procedural_wood"))
        }
    }
}

/// Equirectangular sky: `zenith` blue fading to a bright horizon and a
/// darker ground below it. Row 0 is straight up.
pub fn procedural_sky(width: u32, height: u32, zenith: Rgb) -> Rgba32FImage {
    let zenith = zenith.to_linear();
    let horizon = [1.0, 0.95, 0.85];
    let ground = [0.25, 0.22, 0.2];
    let height = height.max(2);
    Rgba32FImage::from_fn(width.max(1), height, |_, y| {
        // +1 at the zenith, -1 at the nadir
        let elevation = 1.0 - 2.0 * (y as f32 + 0.5) / height as f32;
        let (from, to, t) = if elevation >= 0.0 {
            (horizon, zenith, elevation.sqrt())
        } else {
            (horizon, ground, (-elevation).sqrt())
        };
        let c = |i: usize| from[i] + (to[i] - from[i]) * t;
        Rgba([c(0), c(1), c(2), 1.0])
    })
}

/// Planks running along U with noisy grain.
pub fn procedural_wood(width: u32, height: u32) -> DynamicImage {
    let light = Rgb::from_hex(0xb07a4a).to_srgb_f32();
    let dark = Rgb::from_hex(0x6e4424).to_srgb_f32();
    let planks = 4.0;
    let img = RgbaImage::from_fn(width.max(1), height.max(1), |x, y| {
        let u = x as f32 / width.max(1) as f32;
        let v = y as f32 / height.max(1) as f32;
        let plank = (v * planks).floor();
        let local = (v * planks).fract();
        let grain = simplex2(u * 3.0 + plank * 7.3, local * 24.0) * 0.5 + 0.5;
        let rings = ((u * 40.0 + grain * 6.0 + plank * 3.1).sin() * 0.5 + 0.5) * 0.35;
        let seam = if local < 0.03 || local > 0.97 { 0.5 } else { 0.0 };
        let t = (grain * 0.5 + rings + seam).clamp(0.0, 1.0);
        let channel = |i: usize| ((light[i] + (dark[i] - light[i]) * t) * 255.0).round() as u8;
        Rgba([channel(0), channel(1), channel(2), 255])
    });
    DynamicImage::ImageRgba8(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sky_is_brightest_at_the_horizon_row() {
        let sky = procedural_sky(8, 64, Rgb::from_hex(0x87CEEB));
        let luminance = |y: u32| {
            let p = sky.get_pixel(0, y);
            p[0] + p[1] + p[2]
        };
        assert!(luminance(31) > luminance(0));
        assert!(luminance(32) > luminance(63));
    }

    #[test]
    fn wood_has_requested_size_and_is_opaque() {
        let wood = procedural_wood(32, 16).to_rgba8();
        assert_eq!(wood.dimensions(), (32, 16));
        assert!(wood.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn garbage_is_not_an_environment_map() {
        assert!(decode_environment(b"not an hdr", 1024).is_err());
    }
}
