//! Colours as authored in the scene (`#rrggbb` strings and `0xRRGGBB` literals).
//!
//! Authored colours are sRGB. Everything uploaded to shaders goes through
//! [`Rgb::to_linear`] so that lighting happens in linear space and the sRGB
//! surface does the final encode.

use std::{fmt, str::FromStr};

use anyhow::{Context, bail};

/// An 8-bit-per-channel sRGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels in 0..=1 without any transfer function applied.
    pub fn to_srgb_f32(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Linear-light channels, the working space of every shader in this crate.
    pub fn to_linear(&self) -> [f32; 3] {
        self.to_srgb_f32().map(srgb_to_linear)
    }

    /// Linear channels padded to a `vec4` for uniform buffers.
    pub fn to_linear_vec4(&self) -> [f32; 4] {
        let [r, g, b] = self.to_linear();
        [r, g, b, 1.0]
    }

    /// Linear colour as a clear colour for the render pass.
    pub fn to_wgpu(&self) -> wgpu::Color {
        let [r, g, b] = self.to_linear();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c < 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

impl FromStr for Rgb {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("'{s}' is not a #rrggbb colour");
        }
        let hex = u32::from_str_radix(digits, 16)
            .with_context(|| format!("'{s}' is not a #rrggbb colour"))?;
        Ok(Self::from_hex(hex))
    }
}

impl From<u32> for Rgb {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!("#002b3d".parse::<Rgb>().unwrap(), Rgb::new(0x00, 0x2b, 0x3d));
        assert_eq!("FFE894".parse::<Rgb>().unwrap(), Rgb::new(0xff, 0xe8, 0x94));
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#12345g".parse::<Rgb>().is_err());
        assert!("".parse::<Rgb>().is_err());
    }

    #[test]
    fn hex_literal_matches_string() {
        assert_eq!(Rgb::from(0x87CEEB), "#87ceeb".parse::<Rgb>().unwrap());
        assert_eq!(Rgb::from(0x87CEEB).to_hex(), "#87ceeb");
    }

    #[test]
    fn linear_conversion_round_trips_endpoints() {
        for c in Rgb::WHITE.to_linear() {
            assert!((c - 1.0).abs() < 1e-5);
        }
        assert_eq!(Rgb::new(0, 0, 0).to_linear(), [0.0, 0.0, 0.0]);
        let mid = srgb_to_linear(0.5);
        assert!((mid - 0.214).abs() < 1e-3);
        assert!((linear_to_srgb(mid) - 0.5).abs() < 1e-3);
    }
}
