//! Scene data: geometry, colours, noise, GPU meshes, textures and instances.
//!
//! - `color` holds authored sRGB colours and their linear conversion
//! - `geometry` holds CPU-side indexed triangle meshes and generators
//! - `instance` holds per-object transforms packed for the GPU
//! - `model` contains vertex formats, GPU meshes and materials
//! - `noise` is the simplex noise shared with the terrain shader
//! - `terrain` contains the displaced grid and its palette
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod color;
pub mod geometry;
pub mod instance;
pub mod model;
pub mod noise;
pub mod terrain;
pub mod texture;
