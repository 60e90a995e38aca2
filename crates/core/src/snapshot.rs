//! Serializable views of a kernel and a stable state hash.

use std::hash::Hasher;

use serde::{Deserialize, Serialize};

use crate::board::GridValues;
use crate::game_state::{Game, Tetromino};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceSnapshot {
    /// Kind id (1..=7)
    pub kind: u8,
    /// Rotation index (0..4)
    pub rotation: u8,
    pub x: i8,
    pub y: i8,
}

impl From<Tetromino> for PieceSnapshot {
    fn from(value: Tetromino) -> Self {
        Self {
            kind: value.kind.id(),
            rotation: value.rotation.index() as u8,
            x: value.x,
            y: value.y,
        }
    }
}

/// Everything a renderer or a lockstep check needs from one kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: GridValues,
    pub current: PieceSnapshot,
    pub next: PieceSnapshot,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub game_over: bool,
    pub state_hash: u64,
}

impl From<&Game> for GameSnapshot {
    fn from(game: &Game) -> Self {
        Self {
            board: game.grid().values(),
            current: game.current().into(),
            next: game.next().into(),
            score: game.score(),
            level: game.level(),
            lines: game.lines(),
            game_over: game.is_game_over(),
            state_hash: state_hash(game),
        }
    }
}

/// Stable 64-bit FNV-1a hasher.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions or
/// platforms, and two peers must agree on the value.
#[derive(Debug, Clone)]
pub struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

fn write_piece(h: &mut Fnv1aHasher, piece: Tetromino) {
    h.write_u8(piece.kind.id());
    h.write_u8(piece.rotation.index() as u8);
    h.write_i8(piece.x);
    h.write_i8(piece.y);
}

/// Hash of grid, pieces and counters. Fixed-width little-endian writes keep
/// it identical across peers.
pub fn state_hash(game: &Game) -> u64 {
    let mut h = Fnv1aHasher::new();
    for row in game.grid().values() {
        h.write(&row);
    }
    write_piece(&mut h, game.current());
    write_piece(&mut h, game.next());
    h.write(&game.score().to_le_bytes());
    h.write(&game.level().to_le_bytes());
    h.write(&game.lines().to_le_bytes());
    h.write_u8(game.is_game_over() as u8);
    h.finish()
}
