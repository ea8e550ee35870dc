//! Developer tooling: read-only views of a running session.
//!
//! # Invariants
//! - Tools only borrow game state; they never mutate it.

mod inspector;

pub use inspector::{BoardInspector, BoardSummary};

pub fn crate_info() -> &'static str {
    concat!("tilehop-tools v", env!("CARGO_PKG_VERSION"))
}
