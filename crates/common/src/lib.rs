//! Shared types for the tilehop workspace: grid coordinates, directions,
//! camera modes and spatial transforms.
//!
//! # Invariants
//! - The board is always `GRID_SIZE` × `GRID_SIZE`; nothing here is configurable.
//! - `+y` is "up" on the board, `+x` is "right".

mod types;

pub use types::{CameraMode, Direction, GOAL, GRID_SIZE, GridPos, ORIGIN, Transform};

pub fn crate_info() -> &'static str {
    concat!("tilehop-common v", env!("CARGO_PKG_VERSION"))
}
