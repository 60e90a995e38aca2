//! Tetris NG (workspace facade crate).
//!
//! Re-exports the workspace crates under one roof as
//! `tetris_ng::{core, input, net, types}`.

pub use tetris_ng_core as core;
pub use tetris_ng_input as input;
pub use tetris_ng_net as net;
pub use tetris_ng_types as types;
