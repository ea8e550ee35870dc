//! Rendering adapter: camera control, mesh definitions and a
//! renderer-agnostic draw interface.
//!
//! # Invariants
//! - Renderers never mutate game state; they only receive meshes and transforms.
//! - Exactly one camera mode is active at a time.
//! - Camera vectors are recomputed from mode, angle and player position every frame.

mod camera;
mod mesh;
mod renderer;

pub use camera::{CameraController, CameraView, Projection};
pub use mesh::{Mesh, PrimitiveKind, cuboid_positions};
pub use renderer::{DrawCall, MeshHandle, RecordedFrame, RecordingRenderer, RenderError, Renderer};

pub fn crate_info() -> &'static str {
    concat!("tilehop-render v", env!("CARGO_PKG_VERSION"))
}
