//! Game kernel: authoritative board and player state, movement resolution,
//! obstacle respawn and the shared moving-tile oscillator.
//!
//! # Invariants
//! - Every hazard row is drawn from `[HAZARD_MIN, HAZARD_MAX]`.
//! - All state mutations flow through [`GameState`] and are logged as [`GameEvent`]s.
//! - Given the same seed and inputs, a session replays identically.

pub mod animator;
pub mod grid;
pub mod player;
pub mod rng;
pub mod state;

pub use animator::{BOUNCE_AMPLITUDE, BounceDirection, DEFAULT_BOUNCE_RATE, MovingTileAnimator};
pub use grid::{GridState, HAZARD_MAX, HAZARD_MIN, TileKind};
pub use player::{FALL_PENALTY, Intent, MoveOutcome, PlayerPhase, PlayerState, WIN_BONUS};
pub use rng::SessionRng;
pub use state::{GameEvent, GameState};

pub fn crate_info() -> &'static str {
    concat!("tilehop-kernel v", env!("CARGO_PKG_VERSION"))
}
