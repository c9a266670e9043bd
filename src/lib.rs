//! terrain-sandbox
//!
//! A procedural terrain sandbox that runs natively and in the browser. A
//! noise-displaced terrain is shaded by height and slope, a water plane sits
//! at the shoreline, a wooden frame carved with CSG surrounds it and a
//! directional light casts soft shadows over everything.
//!
//! High-level modules
//! - `camera`: camera, projection and the camera uniform
//! - `config`: every constant the scene is assembled from
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `controls`: orbit controls around the scene centre
//! - `csg`: BSP boolean operations on triangle meshes
//! - `data_structures`: meshes, instances, textures, noise and the terrain
//! - `debug`: the terrain tweak panel
//! - `flow`: high level flow control (event loop and per-frame updates)
//! - `pipelines`: render pipelines and WGSL sources
//! - `resources`: asset loading and procedural fallbacks
//! - `render`: render composition and pass encoding
//! - `scene`: the sandbox scene itself
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod controls;
pub mod csg;
pub mod data_structures;
pub mod debug;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Opens the sandbox with the default scene and blocks until it is closed.
pub fn run() -> anyhow::Result<()> {
    flow::run(
        vec![scene::SandboxScene::constructor()],
        config::SceneConfig::default(),
    )
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
