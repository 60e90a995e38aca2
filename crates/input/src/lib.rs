//! Terminal input module.
//!
//! Maps `crossterm` key events into [`Control`]s and gates held keys through
//! a per-player auto-repeat map. Nothing here touches game state; the
//! front-end turns fired controls into an `InputRecord` or a coordinator call.

pub mod map;
pub mod repeat;

pub use tetris_ng_types as types;

pub use map::{map_dual_key, map_key, should_quit, Control};
pub use repeat::RepeatGate;
