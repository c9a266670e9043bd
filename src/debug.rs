//! Tweak panel for the terrain uniforms.
//!
//! Four sliders drive the noise parameters and six colour pickers drive the
//! palette. There is no widget toolkit behind it: natively the panel is
//! operated from the keyboard, on the web the page's own inputs call the
//! exported [`set_uniform`] / [`set_color`] functions, which queue the change
//! until the next frame drains it with [`DebugPanel::drain_pending`].

use std::cell::RefCell;

use anyhow::{Context, Result, anyhow, bail};
use winit::{
    event::{ElementState, WindowEvent},
    keyboard::{Key, NamedKey},
};

use crate::data_structures::{color::Rgb, terrain::TerrainUniforms};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub const POSITION_FREQUENCY: &str = "uPositionFrequency";
pub const STRENGTH: &str = "uStrength";
pub const WARP_FREQUENCY: &str = "uWarpFrequency";
pub const WARP_STRENGTH: &str = "uWarpStrength";

pub const WATER_DEEP: &str = "colorWaterDeep";
pub const WATER_SURFACE: &str = "colorWaterSurface";
pub const SAND: &str = "colorSand";
pub const GRASS: &str = "colorGrass";
pub const SNOW: &str = "colorSnow";
pub const ROCK: &str = "colorRock";

/// Colours the native pickers cycle through.
pub const SWATCHES: [u32; 12] = [
    0x002b3d, 0x66a8ff, 0xffe894, 0x85d534, 0xffffff, 0xbfbd8d, 0x1e3a5f, 0xc2b280, 0x4f7942,
    0x8b5a2b, 0xdfe8f0, 0x6e6e6e,
];

#[derive(Clone, Debug, PartialEq)]
pub struct Slider {
    pub name: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Slider {
    fn new(name: &'static str, value: f32, min: f32, max: f32) -> Self {
        let mut slider = Self {
            name,
            value: min,
            min,
            max,
            step: 0.001,
        };
        slider.set(value);
        slider
    }

    /// Clamps to the range and snaps to the step grid.
    fn set(&mut self, value: f32) -> f32 {
        let snapped = self.min + ((value - self.min) / self.step).round() * self.step;
        self.value = snapped.clamp(self.min, self.max);
        self.value
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColorPicker {
    pub name: &'static str,
    pub value: Rgb,
    swatch: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Control {
    Slider(Slider),
    Color(ColorPicker),
}

impl Control {
    pub fn name(&self) -> &'static str {
        match self {
            Control::Slider(slider) => slider.name,
            Control::Color(picker) => picker.name,
        }
    }
}

enum PanelInput {
    Uniform(String, f32),
    Color(String, String),
}

thread_local! {
    static PENDING: RefCell<Vec<PanelInput>> = const { RefCell::new(Vec::new()) };
}

/// Queues a slider change for the next [`DebugPanel::drain_pending`].
pub fn push_uniform(name: &str, value: f32) {
    PENDING.with_borrow_mut(|pending| pending.push(PanelInput::Uniform(name.to_string(), value)));
}

/// Queues a colour change for the next [`DebugPanel::drain_pending`].
pub fn push_color(name: &str, hex: &str) {
    PENDING.with_borrow_mut(|pending| {
        pending.push(PanelInput::Color(name.to_string(), hex.to_string()))
    });
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn set_uniform(name: String, value: f32) {
    push_uniform(&name, value);
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn set_color(name: String, hex: String) {
    push_color(&name, &hex);
}

#[derive(Clone, Debug)]
pub struct DebugPanel {
    controls: Vec<Control>,
    selected: usize,
    shift: bool,
}

impl DebugPanel {
    /// A panel whose controls start at the current `uniforms`.
    pub fn new(uniforms: &TerrainUniforms) -> Self {
        let palette = &uniforms.palette;
        let picker = |name, value| {
            Control::Color(ColorPicker {
                name,
                value,
                swatch: 0,
            })
        };
        let controls = vec![
            Control::Slider(Slider::new(POSITION_FREQUENCY, uniforms.position_frequency, 0.0, 1.0)),
            Control::Slider(Slider::new(STRENGTH, uniforms.strength, 0.0, 10.0)),
            Control::Slider(Slider::new(WARP_FREQUENCY, uniforms.warp_frequency, 0.0, 10.0)),
            Control::Slider(Slider::new(WARP_STRENGTH, uniforms.warp_strength, 0.0, 1.0)),
            picker(WATER_DEEP, palette.water_deep),
            picker(WATER_SURFACE, palette.water_surface),
            picker(SAND, palette.sand),
            picker(GRASS, palette.grass),
            picker(SNOW, palette.snow),
            picker(ROCK, palette.rock),
        ];
        Self {
            controls,
            selected: 0,
            shift: false,
        }
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn selected(&self) -> &Control {
        &self.controls[self.selected]
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut Control> {
        self.controls
            .iter_mut()
            .find(|control| control.name() == name)
            .ok_or_else(|| anyhow!("no debug control named '{name}'"))
    }

    pub fn value(&self, name: &str) -> Option<f32> {
        self.controls.iter().find_map(|control| match control {
            Control::Slider(slider) if slider.name == name => Some(slider.value),
            _ => None,
        })
    }

    pub fn color(&self, name: &str) -> Option<Rgb> {
        self.controls.iter().find_map(|control| match control {
            Control::Color(picker) if picker.name == name => Some(picker.value),
            _ => None,
        })
    }

    /// Sets a slider and returns the value it settled on.
    pub fn set_value(&mut self, name: &str, value: f32) -> Result<f32> {
        if !value.is_finite() {
            bail!("'{value}' is not a valid value for {name}");
        }
        match self.find_mut(name)? {
            Control::Slider(slider) => Ok(slider.set(value)),
            Control::Color(_) => bail!("{name} is a colour, not a slider"),
        }
    }

    pub fn set_color(&mut self, name: &str, hex: &str) -> Result<Rgb> {
        let color: Rgb = hex.parse().with_context(|| format!("setting {name}"))?;
        match self.find_mut(name)? {
            Control::Color(picker) => {
                picker.value = color;
                Ok(color)
            }
            Control::Slider(_) => bail!("{name} is a slider, not a colour"),
        }
    }

    /// Writes every control into `uniforms`.
    pub fn apply(&self, uniforms: &mut TerrainUniforms) {
        for control in &self.controls {
            match control {
                Control::Slider(slider) => {
                    let target = match slider.name {
                        POSITION_FREQUENCY => &mut uniforms.position_frequency,
                        STRENGTH => &mut uniforms.strength,
                        WARP_FREQUENCY => &mut uniforms.warp_frequency,
                        WARP_STRENGTH => &mut uniforms.warp_strength,
                        _ => continue,
                    };
                    *target = slider.value;
                }
                Control::Color(picker) => {
                    let palette = &mut uniforms.palette;
                    let target = match picker.name {
                        WATER_DEEP => &mut palette.water_deep,
                        WATER_SURFACE => &mut palette.water_surface,
                        SAND => &mut palette.sand,
                        GRASS => &mut palette.grass,
                        SNOW => &mut palette.snow,
                        ROCK => &mut palette.rock,
                        _ => continue,
                    };
                    *target = picker.value;
                }
            }
        }
    }

    /// Applies everything queued through [`push_uniform`] and [`push_color`].
    /// Returns whether any control changed.
    pub fn drain_pending(&mut self) -> bool {
        let pending = PENDING.with_borrow_mut(std::mem::take);
        let mut changed = false;
        for input in pending {
            let result = match &input {
                PanelInput::Uniform(name, value) => self.set_value(name, *value).map(|_| ()),
                PanelInput::Color(name, hex) => self.set_color(name, hex).map(|_| ()),
            };
            match result {
                Ok(()) => changed = true,
                Err(e) => log::warn!("ignoring panel input: {e:#}"),
            }
        }
        changed
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % self.controls.len();
    }

    pub fn select_previous(&mut self) {
        self.selected = (self.selected + self.controls.len() - 1) % self.controls.len();
    }

    /// Moves the selected slider by one coarse step (a hundredth of its
    /// range) or, with `fine`, by one slider step. `direction` is the sign.
    pub fn nudge(&mut self, direction: f32, fine: bool) -> bool {
        let Control::Slider(slider) = &mut self.controls[self.selected] else {
            return false;
        };
        let delta = if fine {
            slider.step
        } else {
            (slider.max - slider.min) / 100.0
        };
        let before = slider.value;
        slider.set(before + delta * direction.signum());
        slider.value != before
    }

    /// Advances the `index`-th colour picker (0-based) to the next swatch.
    pub fn cycle_swatch(&mut self, index: usize) -> Option<Rgb> {
        let picker = self
            .controls
            .iter_mut()
            .filter_map(|control| match control {
                Control::Color(picker) => Some(picker),
                Control::Slider(_) => None,
            })
            .nth(index)?;
        picker.swatch = (picker.swatch + 1) % SWATCHES.len();
        if Rgb::from_hex(SWATCHES[picker.swatch]) == picker.value {
            picker.swatch = (picker.swatch + 1) % SWATCHES.len();
        }
        picker.value = Rgb::from_hex(SWATCHES[picker.swatch]);
        Some(picker.value)
    }

    /// Keyboard bindings. Returns whether a value changed.
    pub fn handle_key(&mut self, key: &Key) -> bool {
        match key {
            Key::Named(NamedKey::Tab) => {
                if self.shift {
                    self.select_previous();
                } else {
                    self.select_next();
                }
                log::info!("debug panel: {}", self.describe_selected());
                false
            }
            Key::Named(NamedKey::ArrowUp) => self.nudge(1.0, self.shift),
            Key::Named(NamedKey::ArrowDown) => self.nudge(-1.0, self.shift),
            Key::Character(c) => match c.parse::<usize>() {
                Ok(digit @ 1..=6) => self.cycle_swatch(digit - 1).is_some(),
                _ => false,
            },
            _ => false,
        }
    }

    /// Tracks modifiers and routes key presses to [`Self::handle_key`].
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift = modifiers.state().shift_key();
                false
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let changed = self.handle_key(&event.logical_key);
                if changed {
                    log::info!("debug panel: {}", self.describe_selected());
                }
                changed
            }
            _ => false,
        }
    }

    pub fn set_shift(&mut self, shift: bool) {
        self.shift = shift;
    }

    fn describe_selected(&self) -> String {
        match self.selected() {
            Control::Slider(slider) => format!("{} = {:.3}", slider.name, slider.value),
            Control::Color(picker) => format!("{} = {}", picker.name, picker.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Palette, TerrainConfig};

    #[test]
    fn slider_snaps_to_step() {
        let mut slider = Slider::new("s", 0.0, 0.0, 1.0);
        assert!((slider.set(0.12345) - 0.123).abs() < 1e-6);
        assert_eq!(slider.set(7.0), 1.0);
        assert_eq!(slider.set(-7.0), 0.0);
    }

    #[test]
    fn queued_inputs_are_applied_once() {
        let mut panel = DebugPanel::new(&TerrainUniforms::new(
            &TerrainConfig::default(),
            Palette::default(),
        ));
        push_uniform(STRENGTH, 4.0);
        push_color(SAND, "#123456");
        push_uniform("uNope", 1.0);
        assert!(panel.drain_pending());
        assert!(!panel.drain_pending());
        assert!((panel.value(STRENGTH).unwrap() - 4.0).abs() < 1e-6);
        assert_eq!(panel.color(SAND), Some(Rgb::from_hex(0x123456)));
    }
}
