//! Input: the discrete events a host feeds into the game loop.
//!
//! # Invariants
//! - The game loop consumes [`InputEvent`]s, never raw window-system events.
//! - Desktop key handling and scripted sessions produce the same event stream.

pub mod event;
pub mod script;

pub use event::{InputEvent, Modifier, PointerButton};
pub use script::{InputSource, ScriptError, ScriptedInput};

pub fn crate_info() -> &'static str {
    concat!("tilehop-input v", env!("CARGO_PKG_VERSION"))
}
