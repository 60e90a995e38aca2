//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used by the simulation kernel, the
//! network coordinator and the terminal front-end. Everything here is plain data
//! with no external dependencies.
//!
//! # Playfield
//!
//! - **Width**: 10 columns (x = 0..9, left to right)
//! - **Height**: 20 rows (y = 0..19, top to bottom)
//! - Rows with `y < 0` are above the visible field and always count as empty,
//!   which lets pieces spawn partially off-screen.
//!
//! # Timing Constants
//!
//! Timing values are in seconds (`f64`), the unit the frame loop hands to
//! `update(dt)`:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BASE_FALL_INTERVAL_SECS` | 0.80 | Gravity at level 1 |
//! | `FALL_INTERVAL_STEP_SECS` | 0.07 | Speed-up per level |
//! | `MIN_FALL_INTERVAL_SECS` | 0.05 | Gravity floor |
//! | `COUNTDOWN_SECS` | 3.5 | Countdown after (re)start or resume |
//! | `RECONNECT_INTERVAL_SECS` | 1.0 | Follower re-dial period |
//! | `DAS_DELAY_SECS` | 0.20 | Delay before a held key repeats |
//! | `DAS_INTERVAL_SECS` | 0.06 | Interval between repeats |
//!
//! # Examples
//!
//! ```
//! use tetris_ng_types::{PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! let piece = PieceKind::from_id(3).unwrap();
//! assert_eq!(piece, PieceKind::I);
//! assert_eq!(piece.id(), 3);
//!
//! assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Points per clear, indexed by the number of rows cleared at once.
/// Multiplied by the level in effect before the clear.
pub const LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 800];

/// Points awarded for each successful soft-drop step.
pub const SOFT_DROP_POINTS: u32 = 1;

/// Cleared rows needed to advance one level.
pub const LINES_PER_LEVEL: u32 = 10;

/// Fall interval at level 1.
pub const BASE_FALL_INTERVAL_SECS: f64 = 0.8;

/// Fall interval reduction per level.
pub const FALL_INTERVAL_STEP_SECS: f64 = 0.07;

/// Fall interval never drops below this.
pub const MIN_FALL_INTERVAL_SECS: f64 = 0.05;

/// Countdown armed whenever a match (re)starts or resumes.
pub const COUNTDOWN_SECS: f64 = 3.5;

/// Period between follower reconnect attempts.
pub const RECONNECT_INTERVAL_SECS: f64 = 1.0;

/// Default TCP port for the authority's listening endpoint.
pub const DEFAULT_PORT: u16 = 1234;

/// Added to the authority seed to derive the follower seed in independent-pieces mode.
pub const INDEPENDENT_SEED_OFFSET: u32 = 9999;

/// Delay before a held movement key starts repeating.
pub const DAS_DELAY_SECS: f64 = 0.20;

/// Interval between repeats of a held movement key.
pub const DAS_INTERVAL_SECS: f64 = 0.06;

/// The seven tetromino piece kinds.
///
/// The discriminant is the numeric id stored in grid cells and on the wire.
/// Zero is reserved for "empty".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PieceKind {
    L = 1,
    J = 2,
    I = 3,
    O = 4,
    S = 5,
    T = 6,
    Z = 7,
}

impl PieceKind {
    /// All kinds in id order. This is also the order a fresh bag is filled in.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::L,
        PieceKind::J,
        PieceKind::I,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Numeric id (1..=7)
    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Look up a kind by numeric id.
    ///
    /// # Examples
    ///
    /// ```
    /// use tetris_ng_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_id(1), Some(PieceKind::L));
    /// assert_eq!(PieceKind::from_id(7), Some(PieceKind::Z));
    /// assert_eq!(PieceKind::from_id(0), None);
    /// assert_eq!(PieceKind::from_id(8), None);
    /// ```
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(PieceKind::L),
            2 => Some(PieceKind::J),
            3 => Some(PieceKind::I),
            4 => Some(PieceKind::O),
            5 => Some(PieceKind::S),
            6 => Some(PieceKind::T),
            7 => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    ///
    /// # Examples
    ///
    /// ```
    /// use tetris_ng_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_str(), "i");
    /// assert_eq!(PieceKind::O.as_str(), "o");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::T => "t",
            PieceKind::S => "s",
            PieceKind::Z => "z",
            PieceKind::J => "j",
            PieceKind::L => "l",
        }
    }
}

/// Rotation states, indexed 0..4 in clockwise order.
///
/// The cycle goes: North → East → South → West → North
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise (90°)
    ///
    /// # Examples
    ///
    /// ```
    /// use tetris_ng_types::Rotation;
    ///
    /// assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
    /// assert_eq!(Rotation::East.rotate_cw(), Rotation::South);
    /// assert_eq!(Rotation::South.rotate_cw(), Rotation::West);
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotation index in [0, 4)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    /// Rotation for an index; wraps modulo 4.
    pub fn from_index(index: usize) -> Self {
        match index % 4 {
            0 => Rotation::North,
            1 => Rotation::East,
            2 => Rotation::South,
            _ => Rotation::West,
        }
    }
}

/// A board cell: empty, or occupied by the kind that locked there.
pub type Cell = Option<PieceKind>;

/// One frame of player input, plus the sender's score.
///
/// Local kernels consume the movement flags. The `score` travels with the
/// record so a remote mirror can display the authoritative score of the
/// player who produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InputRecord {
    pub move_left: bool,
    pub move_right: bool,
    pub soft_drop: bool,
    pub rotate: bool,
    /// Ask the presentation layer to restart. The kernel ignores it.
    pub reset: bool,
    pub score: u32,
}

impl InputRecord {
    /// True when no control flag is set.
    pub fn is_idle(&self) -> bool {
        !(self.move_left || self.move_right || self.soft_drop || self.rotate || self.reset)
    }
}
