//! Core game logic - pure, deterministic, and testable
//!
//! This crate holds every gameplay rule and no I/O at all: no clock reads
//! inside the kernel, no logging, no sockets. That is what lets two peers run
//! the same simulation side by side and stay in lockstep.
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 grid with collision queries and line clearing
//! - [`game_state`]: the [`Game`] kernel (active piece, next piece, counters)
//! - [`pieces`]: static shape catalog and spawn offsets
//! - [`rng`]: LCG and 7-bag randomizer
//! - [`scoring`]: line-clear points, level and fall interval
//! - [`snapshot`]: serde snapshot and FNV-1a state hash
//!
//! # Rules
//!
//! - **7-Bag Randomizer**: every kind appears once per bag of seven
//! - **Rotation**: clockwise table lookup, reverted on collision (no kicks)
//! - **Gravity**: driven externally via [`Game::tick`]
//! - **Scoring**: 100/300/500/800 times level for 1-4 rows, +1 per soft-drop step
//!
//! # Example
//!
//! ```
//! use tetris_ng_core::Game;
//! use tetris_ng_types::InputRecord;
//!
//! let mut a = Game::new(42);
//! let mut b = Game::new(42);
//!
//! let input = InputRecord { move_right: true, soft_drop: true, ..InputRecord::default() };
//! for game in [&mut a, &mut b] {
//!     game.apply_input(input);
//!     game.tick();
//! }
//!
//! assert_eq!(a.state_hash(), b.state_hash());
//! assert_eq!(a.score(), 1);
//! ```

pub mod board;
pub mod game_state;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use tetris_ng_types as types;

pub use board::{Grid, GridValues};
pub use game_state::{Game, Tetromino};
pub use pieces::{get_shape, spawn_offset, Shape};
pub use rng::{seed_from_clock, PieceBag, SimpleRng};
pub use scoring::{fall_interval, level_for_lines, line_clear_score};
pub use snapshot::{Fnv1aHasher, GameSnapshot, PieceSnapshot};
