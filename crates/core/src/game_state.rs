//! Game state module - the deterministic simulation kernel
//!
//! A [`Game`] owns one playfield, one piece bag, the active and next pieces and
//! the session counters. It never reads a clock: gravity arrives as explicit
//! [`Game::tick`] calls, so two instances reset with the same seed and fed the
//! same calls stay identical.

use crate::board::Grid;
use crate::pieces::{get_shape, spawn_offset, Shape};
use crate::rng::{seed_from_clock, PieceBag};
use crate::scoring::{fall_interval, level_for_lines, line_clear_score};
use crate::snapshot::{state_hash, GameSnapshot};
use crate::types::{InputRecord, PieceKind, Rotation, SOFT_DROP_POINTS};

/// A piece: kind, rotation and origin on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl Tetromino {
    /// A piece of `kind` at its spawn origin, unrotated.
    pub fn spawn(kind: PieceKind) -> Self {
        let (x, y) = spawn_offset(kind);
        Self {
            kind,
            rotation: Rotation::North,
            x,
            y,
        }
    }

    /// Offsets for the current rotation.
    #[inline]
    pub fn shape(&self) -> Shape {
        get_shape(self.kind, self.rotation)
    }

    /// Absolute `(x, y)` of the four occupied cells.
    pub fn cells(&self) -> [(i8, i8); 4] {
        self.shape().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    fn shifted(self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    fn rotated(self) -> Self {
        Self {
            rotation: self.rotation.rotate_cw(),
            ..self
        }
    }
}

/// The simulation kernel for one player.
#[derive(Debug, Clone)]
pub struct Game {
    grid: Grid,
    bag: PieceBag,
    current: Tetromino,
    next: Tetromino,
    score: u32,
    level: u32,
    lines: u32,
    game_over: bool,
    seed: u32,
}

impl Game {
    /// Create a kernel already reset with `seed`.
    pub fn new(seed: u32) -> Self {
        let mut bag = PieceBag::new(seed);
        let current = Tetromino::spawn(bag.draw());
        let next = Tetromino::spawn(bag.draw());
        Self {
            grid: Grid::new(),
            bag,
            current,
            next,
            score: 0,
            level: 1,
            lines: 0,
            game_over: false,
            seed,
        }
    }

    /// Start a fresh session: empty grid, new bag, counters back to zero.
    ///
    /// `None` seeds from the wall clock, for sessions that need not be
    /// reproduced elsewhere.
    pub fn reset(&mut self, seed: Option<u32>) {
        *self = Self::new(seed.unwrap_or_else(seed_from_clock));
    }

    /// Apply one frame of input: left, right, rotate, then soft drop.
    ///
    /// Does nothing once the game is over. `reset` is left to the caller.
    pub fn apply_input(&mut self, input: InputRecord) {
        if self.game_over {
            return;
        }
        if input.move_left {
            self.move_left();
        }
        if input.move_right {
            self.move_right();
        }
        if input.rotate {
            self.rotate();
        }
        if input.soft_drop {
            self.soft_drop();
        }
    }

    /// Shift one column left; reverted if blocked.
    pub fn move_left(&mut self) -> bool {
        self.try_place(self.current.shifted(-1, 0))
    }

    /// Shift one column right; reverted if blocked.
    pub fn move_right(&mut self) -> bool {
        self.try_place(self.current.shifted(1, 0))
    }

    /// Advance to the next rotation state; reverted if blocked. No wall kicks.
    pub fn rotate(&mut self) -> bool {
        self.try_place(self.current.rotated())
    }

    /// One gravity step that also awards a soft-drop point when it succeeds.
    pub fn soft_drop(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        let moved = self.step_down();
        if moved {
            self.score = self.score.saturating_add(SOFT_DROP_POINTS);
            self.level = level_for_lines(self.lines);
        }
        moved
    }

    /// One gravity step. Returns false when the piece could not move and was
    /// locked instead (or the game is already over).
    pub fn tick(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.step_down()
    }

    fn try_place(&mut self, candidate: Tetromino) -> bool {
        if self.game_over || !self.is_valid(&candidate) {
            return false;
        }
        self.current = candidate;
        true
    }

    /// Every cell inside the field and unoccupied. Used for lateral moves,
    /// rotation, the down step and the spawn check alike.
    fn is_valid(&self, piece: &Tetromino) -> bool {
        self.grid.fits(&piece.shape(), piece.x, piece.y)
    }

    fn step_down(&mut self) -> bool {
        let candidate = self.current.shifted(0, 1);
        if self.is_valid(&candidate) {
            self.current = candidate;
            true
        } else {
            self.lock();
            false
        }
    }

    /// Commit the active piece. Returns the number of rows cleared.
    fn lock(&mut self) -> usize {
        let piece = self.current;
        if piece.cells().iter().any(|&(_, y)| y < 0) {
            self.game_over = true;
            return 0;
        }

        self.grid.stamp(&piece.shape(), piece.x, piece.y, piece.kind);

        self.current = self.next;
        self.next = Tetromino::spawn(self.bag.draw());

        if !self.is_valid(&self.current) {
            self.game_over = true;
            return 0;
        }

        let cleared = self.grid.clear_full_rows().len();
        if cleared > 0 {
            self.score = self
                .score
                .saturating_add(line_clear_score(cleared, self.level));
            self.lines += cleared as u32;
        }
        self.level = level_for_lines(self.lines);
        cleared
    }

    /// Replace the score with a value reported by the player this kernel
    /// mirrors. The level is recomputed from this kernel's own line count.
    pub fn overwrite_score(&mut self, score: u32) {
        self.score = score;
        self.level = level_for_lines(self.lines);
    }

    /// Seconds between gravity steps at the current level.
    pub fn fall_interval(&self) -> f64 {
        fall_interval(self.level)
    }

    /// Where the active piece would come to rest if dropped straight down.
    pub fn ghost(&self) -> Tetromino {
        let mut ghost = self.current;
        while self.is_valid(&ghost.shifted(0, 1)) {
            ghost = ghost.shifted(0, 1);
        }
        ghost
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current(&self) -> Tetromino {
        self.current
    }

    pub fn next(&self) -> Tetromino {
        self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Seed the current session was reset with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Serializable copy of the observable state.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from(self)
    }

    /// Stable hash of the observable state, for lockstep comparison.
    pub fn state_hash(&self) -> u64 {
        state_hash(self)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BOARD_HEIGHT, BOARD_WIDTH};

    /// Fill `rows` bottom rows except column 0 and park an I piece standing
    /// upright in column 0, one step above the floor.
    fn game_with_well(rows: i8) -> Game {
        let mut game = Game::new(3);
        for y in (BOARD_HEIGHT as i8 - rows)..BOARD_HEIGHT as i8 {
            for x in 1..BOARD_WIDTH as i8 {
                game.grid.set(x, y, Some(PieceKind::T));
            }
        }
        // West rotation occupies column dx=1, rows dy=0..4.
        game.current = Tetromino {
            kind: PieceKind::I,
            rotation: Rotation::West,
            x: -1,
            y: BOARD_HEIGHT as i8 - 5,
        };
        game
    }

    #[test]
    fn test_new_game_initial_state() {
        let game = Game::new(42);
        assert_eq!(game.score(), 0);
        assert_eq!(game.level(), 1);
        assert_eq!(game.lines(), 0);
        assert!(!game.is_game_over());
        assert_eq!(game.grid().occupied(), 0);
        assert_eq!(game.current().rotation, Rotation::North);
        assert_eq!((game.current().x, game.current().y), spawn_offset(game.current().kind));
    }

    #[test]
    fn test_score_law_for_each_clear_size() {
        for (rows, points) in [(1, 100), (2, 300), (3, 500), (4, 800)] {
            let mut game = game_with_well(rows);
            assert!(game.tick());
            assert!(!game.tick());
            assert_eq!(game.lines(), rows as u32);
            assert_eq!(game.score(), points, "clearing {} rows", rows);
        }
    }

    #[test]
    fn test_clear_uses_level_before_update() {
        let mut game = game_with_well(4);
        game.lines = 8;
        game.level = level_for_lines(8);
        assert!(game.tick());
        assert!(!game.tick());
        assert_eq!(game.score(), 800);
        assert_eq!(game.lines(), 12);
        assert_eq!(game.level(), 2);
    }

    #[test]
    fn test_lock_without_clear_adds_nothing() {
        let mut game = Game::new(5);
        while game.tick() {}
        assert_eq!(game.score(), 0);
        assert_eq!(game.grid().occupied(), 4);
    }

    #[test]
    fn test_overflow_lock_sets_game_over_and_keeps_grid() {
        let mut game = Game::new(9);
        game.current = Tetromino {
            kind: PieceKind::O,
            rotation: Rotation::North,
            x: 4,
            y: -1,
        };
        // Block the O right below its spawn.
        game.grid.set(4, 1, Some(PieceKind::Z));
        let before = game.grid.clone();

        assert!(!game.tick());
        assert!(game.is_game_over());
        assert_eq!(game.grid, before);
    }

    #[test]
    fn test_blocked_spawn_sets_game_over() {
        let mut game = Game::new(11);
        // Rows 0 and 2 are full; row 1 only has column 0.
        for y in 0..3 {
            for x in 0..BOARD_WIDTH as i8 {
                game.grid.set(x, y, Some(PieceKind::S));
            }
        }
        for x in 0..BOARD_WIDTH as i8 {
            game.grid.set(x, 1, None);
        }
        game.grid.set(0, 1, Some(PieceKind::S));
        game.current = Tetromino {
            kind: PieceKind::I,
            rotation: Rotation::North,
            x: 6,
            y: 0,
        };
        // The I sits in row 1, columns 6..10, and rests on row 2.
        assert!(!game.tick());
        assert!(game.is_game_over());
        // Row 1 is not full, so nothing was cleared.
        assert_eq!(game.lines(), 0);
    }

    #[test]
    fn test_soft_drop_awards_point_per_step() {
        let mut game = Game::new(21);
        let input = InputRecord {
            soft_drop: true,
            ..InputRecord::default()
        };
        game.apply_input(input);
        game.apply_input(input);
        assert_eq!(game.score(), 2);
    }

    #[test]
    fn test_input_ignored_after_game_over() {
        let mut game = Game::new(4);
        game.game_over = true;
        let before = game.current();
        game.apply_input(InputRecord {
            move_left: true,
            soft_drop: true,
            ..InputRecord::default()
        });
        assert_eq!(game.current(), before);
        assert_eq!(game.score(), 0);
        assert!(!game.tick());
    }

    #[test]
    fn test_lateral_move_reverts_at_wall() {
        let mut game = Game::new(8);
        for _ in 0..12 {
            game.move_left();
        }
        let min_x = game.current().cells().iter().map(|c| c.0).min().unwrap();
        assert_eq!(min_x, 0);
        assert!(!game.move_left());
    }

    #[test]
    fn test_rotation_blocked_reverts() {
        let mut game = Game::new(8);
        game.current = Tetromino {
            kind: PieceKind::I,
            rotation: Rotation::North,
            x: 3,
            y: 17,
        };
        // East rotation needs rows 17..21, which runs past the floor.
        assert!(!game.rotate());
        assert_eq!(game.current().rotation, Rotation::North);
    }

    #[test]
    fn test_i_piece_cannot_rotate_above_top_row() {
        let mut game = Game::new(8);
        game.current = Tetromino::spawn(PieceKind::I);
        assert_eq!(game.current().y, -1);

        // East and West both need row -1.
        assert!(!game.rotate());
        assert_eq!(game.current().rotation, Rotation::North);
        assert!(game.current().cells().iter().all(|&(_, y)| y >= 0));

        // One row lower the rotation is legal.
        assert!(game.tick());
        assert!(game.rotate());
        assert_eq!(game.current().rotation, Rotation::East);
    }

    #[test]
    fn test_overwrite_score_recomputes_level() {
        let mut game = Game::new(1);
        game.lines = 25;
        game.level = 1;
        game.overwrite_score(4200);
        assert_eq!(game.score(), 4200);
        assert_eq!(game.level(), 3);
    }

    #[test]
    fn test_ghost_rests_on_floor() {
        let game = Game::new(2);
        let ghost = game.ghost();
        let max_y = ghost.cells().iter().map(|c| c.1).max().unwrap();
        assert_eq!(max_y, BOARD_HEIGHT as i8 - 1);
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let mut game = Game::new(77);
        while !game.is_game_over() {
            game.tick();
        }
        game.reset(Some(77));
        let fresh = Game::new(77);
        assert_eq!(game.state_hash(), fresh.state_hash());
        assert!(!game.is_game_over());
    }
}
