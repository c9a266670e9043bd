use terrain_sandbox::{
    config::{Palette, TerrainConfig},
    data_structures::{color::Rgb, terrain::TerrainUniforms},
    debug::{self, Control, DebugPanel},
};
use winit::keyboard::{Key, NamedKey};

fn uniforms() -> TerrainUniforms {
    TerrainUniforms::new(&TerrainConfig::default(), Palette::default())
}

#[test]
fn starts_at_the_scene_values() {
    let panel = DebugPanel::new(&uniforms());
    assert_eq!(panel.controls().len(), 10);
    assert!((panel.value(debug::POSITION_FREQUENCY).unwrap() - 0.225).abs() < 1e-6);
    assert!((panel.value(debug::STRENGTH).unwrap() - 2.625).abs() < 1e-6);
    assert!((panel.value(debug::WARP_FREQUENCY).unwrap() - 1.25).abs() < 1e-6);
    assert!((panel.value(debug::WARP_STRENGTH).unwrap() - 0.245).abs() < 1e-6);
    assert_eq!(panel.color(debug::GRASS), Some(Rgb::from_hex(0x85d534)));
    assert_eq!(panel.value(debug::GRASS), None);
}

#[test]
fn sliders_clamp_to_their_range() {
    let mut panel = DebugPanel::new(&uniforms());
    assert_eq!(panel.set_value(debug::STRENGTH, 12.0).unwrap(), 10.0);
    assert_eq!(panel.set_value(debug::WARP_STRENGTH, -1.0).unwrap(), 0.0);
    let snapped = panel.set_value(debug::POSITION_FREQUENCY, 0.12345).unwrap();
    assert!((snapped - 0.123).abs() < 1e-6);
}

#[test]
fn bad_input_is_rejected() {
    let mut panel = DebugPanel::new(&uniforms());
    assert!(panel.set_value("uElevation", 1.0).is_err());
    assert!(panel.set_value(debug::SAND, 1.0).is_err());
    assert!(panel.set_value(debug::STRENGTH, f32::NAN).is_err());
    assert!(panel.set_color(debug::SAND, "#ffe89").is_err());
    assert!(panel.set_color(debug::STRENGTH, "#ffffff").is_err());
    // nothing changed
    assert!((panel.value(debug::STRENGTH).unwrap() - 2.625).abs() < 1e-6);
}

#[test]
fn apply_writes_every_control() {
    let mut panel = DebugPanel::new(&uniforms());
    panel.set_value(debug::STRENGTH, 5.0).unwrap();
    panel.set_value(debug::WARP_FREQUENCY, 3.5).unwrap();
    panel.set_color(debug::ROCK, "#6e6e6e").unwrap();

    let mut terrain = uniforms();
    panel.apply(&mut terrain);
    assert!((terrain.strength - 5.0).abs() < 1e-6);
    assert!((terrain.warp_frequency - 3.5).abs() < 1e-6);
    assert_eq!(terrain.palette.rock, Rgb::from_hex(0x6e6e6e));
    assert_eq!(terrain.palette.sand, Palette::default().sand);
}

#[test]
fn keyboard_selects_and_nudges() {
    let mut panel = DebugPanel::new(&uniforms());
    assert_eq!(panel.selected().name(), debug::POSITION_FREQUENCY);

    assert!(panel.handle_key(&Key::Named(NamedKey::ArrowUp)));
    assert!((panel.value(debug::POSITION_FREQUENCY).unwrap() - 0.235).abs() < 1e-5);

    panel.set_shift(true);
    assert!(panel.handle_key(&Key::Named(NamedKey::ArrowDown)));
    assert!((panel.value(debug::POSITION_FREQUENCY).unwrap() - 0.234).abs() < 1e-5);

    // shift+tab wraps around to the last picker
    panel.handle_key(&Key::Named(NamedKey::Tab));
    assert_eq!(panel.selected().name(), debug::ROCK);
    panel.set_shift(false);
    panel.handle_key(&Key::Named(NamedKey::Tab));
    panel.handle_key(&Key::Named(NamedKey::Tab));
    assert_eq!(panel.selected().name(), debug::STRENGTH);

    // arrows do nothing on a colour picker
    for _ in 0..3 {
        panel.select_next();
    }
    assert!(matches!(panel.selected(), Control::Color(_)));
    assert!(!panel.handle_key(&Key::Named(NamedKey::ArrowUp)));
}

#[test]
fn digits_cycle_swatches() {
    let mut panel = DebugPanel::new(&uniforms());
    assert!(panel.handle_key(&Key::Character("1".into())));
    let first = panel.color(debug::WATER_DEEP).unwrap();
    assert_ne!(first, Palette::default().water_deep);
    assert!(debug::SWATCHES.contains(&u32::from_str_radix(&first.to_hex()[1..], 16).unwrap()));

    assert!(!panel.handle_key(&Key::Character("7".into())));
    assert!(!panel.handle_key(&Key::Character("x".into())));
    assert!(panel.cycle_swatch(6).is_none());
}

#[test]
fn queued_web_input_is_drained_once() {
    let mut panel = DebugPanel::new(&uniforms());
    debug::push_uniform(debug::WARP_STRENGTH, 0.5);
    debug::push_color(debug::SNOW, "dfe8f0");
    debug::push_uniform("unknown", 1.0);

    assert!(panel.drain_pending());
    assert!((panel.value(debug::WARP_STRENGTH).unwrap() - 0.5).abs() < 1e-6);
    assert_eq!(panel.color(debug::SNOW), Some(Rgb::from_hex(0xdfe8f0)));
    assert!(!panel.drain_pending());
}
