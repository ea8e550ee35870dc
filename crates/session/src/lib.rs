//! Session orchestration: the per-tick game loop, its configuration and
//! its timers.
//!
//! # Invariants
//! - One thread owns input, ticking and drawing; events land between ticks.
//! - Each tick applies at most one queued move.
//! - Obstacles respawn at most once per configured interval, whatever the tick rate.
//! - A finished session ignores further ticks and input.

mod config;
mod game_loop;
mod timer;

pub use config::{ConfigError, SessionConfig};
pub use game_loop::{ExitReason, GameLoop, SessionError, SessionOutcome};
pub use timer::{FrameTimer, RespawnTimer};

pub fn crate_info() -> &'static str {
    concat!("tilehop-session v", env!("CARGO_PKG_VERSION"))
}
