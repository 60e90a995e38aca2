//! Board module - the 10x20 playfield grid
//!
//! Cells are stored in a flat row-major array. Coordinates are `(x, y)` with
//! `x` in 0..10 left to right and `y` in 0..20 top to bottom.
//!
//! Rows above the field (`y < 0`) are not stored. [`Grid::is_open`] treats them
//! as empty, but [`Grid::fits`] also requires every cell to be inside, so a
//! moved or rotated piece can never reach above the top edge.

use arrayvec::ArrayVec;

use crate::types::{Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// Numeric view of the grid, one row per entry (0 = empty, 1..=7 = kind id).
pub type GridValues = [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];

/// The playfield grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [Cell; BOARD_SIZE],
}

impl Grid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if Self::is_inside(x, y) {
            Some((y as usize) * (BOARD_WIDTH as usize) + (x as usize))
        } else {
            None
        }
    }

    /// True iff `(x, y)` addresses a stored cell.
    #[inline]
    pub fn is_inside(x: i8, y: i8) -> bool {
        (0..BOARD_WIDTH as i8).contains(&x) && (0..BOARD_HEIGHT as i8).contains(&y)
    }

    /// True iff a piece may occupy `(x, y)`: the column is in range, the row is
    /// above the floor, and the cell is either above the field or unoccupied.
    #[inline]
    pub fn is_open(&self, x: i8, y: i8) -> bool {
        if !(0..BOARD_WIDTH as i8).contains(&x) || y >= BOARD_HEIGHT as i8 {
            return false;
        }
        y < 0 || matches!(self.get(x, y), Some(None))
    }

    /// Get cell at position (x, y). Returns None if out of bounds.
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Numeric cell value: 0 for empty (or out of bounds), otherwise the kind id.
    pub fn value(&self, x: i8, y: i8) -> u8 {
        self.get(x, y).flatten().map_or(0, PieceKind::id)
    }

    /// Set cell at position (x, y). Returns false if out of bounds.
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        let start = y * BOARD_WIDTH as usize;
        self.cells[start..start + BOARD_WIDTH as usize]
            .iter()
            .all(|cell| cell.is_some())
    }

    /// Clear all full rows, compacting the rest downward.
    ///
    /// Rows are scanned bottom to top. Returns the cleared row indices in the
    /// order they were found (bottom first). At most four rows can be full at
    /// once since a single piece spans at most four rows.
    pub fn clear_full_rows(&mut self) -> ArrayVec<usize, 4> {
        let mut cleared_rows = ArrayVec::new();
        let width = BOARD_WIDTH as usize;
        let mut write_y = BOARD_HEIGHT as usize;

        for read_y in (0..BOARD_HEIGHT as usize).rev() {
            if self.is_row_full(read_y) {
                // A lock touches at most 4 rows; more would mean a corrupted grid.
                let _ = cleared_rows.try_push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src = read_y * width;
                    self.cells.copy_within(src..src + width, write_y * width);
                }
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = None;
        }

        cleared_rows
    }

    /// Write `kind` into every in-bounds cell of `shape` placed at `(x, y)`.
    ///
    /// The caller is responsible for rejecting placements that reach above the
    /// field; this only writes.
    pub fn stamp(&mut self, shape: &[(i8, i8)], x: i8, y: i8, kind: PieceKind) {
        for &(dx, dy) in shape {
            self.set(x + dx, y + dy, Some(kind));
        }
    }

    /// Check whether `shape` at `(x, y)` lies inside the field and only covers
    /// open cells.
    pub fn fits(&self, shape: &[(i8, i8)], x: i8, y: i8) -> bool {
        shape.iter().all(|&(dx, dy)| {
            let (cx, cy) = (x + dx, y + dy);
            Self::is_inside(cx, cy) && self.is_open(cx, cy)
        })
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Numeric view of every cell, row by row.
    pub fn values(&self) -> GridValues {
        let mut out = [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];
        for (y, row) in out.iter_mut().enumerate() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = self.value(x as i8, y as i8);
            }
        }
        out
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Clear the entire grid
    pub fn clear(&mut self) {
        self.cells = [None; BOARD_SIZE];
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}
