//! wgpu render backend.
//!
//! Implements [`tilehop_render::Renderer`] by batching draws per mesh and
//! submitting them as instanced draws once per frame.
//!
//! # Invariants
//! - The renderer never sees game state, only meshes and model transforms.
//! - Meshes reach the GPU lazily, on the first submit after upload.
//! - A frame holds at most [`MAX_INSTANCES`] draws.

mod gpu;
mod shaders;

pub use gpu::{MAX_INSTANCES, WgpuRenderer};

pub fn crate_info() -> &'static str {
    concat!("tilehop-render-wgpu v", env!("CARGO_PKG_VERSION"))
}
