//! Pieces module - tetromino shape catalog
//!
//! Each kind maps to a fixed table of four rotation states. Every state lists
//! the four occupied cells as `(dx, dy)` offsets from the piece origin, with
//! `dy` growing downward. Rotation is a plain table lookup: there are no wall
//! kicks, so a rotation that collides is simply reverted by the caller.

use crate::types::{PieceKind, Rotation};

/// Four `(dx, dy)` offsets describing one rotation state.
pub type Shape = [(i8, i8); 4];

const L_SHAPES: [Shape; 4] = [
    [(2, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (1, 2), (2, 2)],
    [(0, 1), (1, 1), (2, 1), (0, 2)],
    [(0, 0), (1, 0), (1, 1), (1, 2)],
];

const J_SHAPES: [Shape; 4] = [
    [(0, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (2, 0), (1, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (2, 2)],
    [(1, 0), (1, 1), (0, 2), (1, 2)],
];

const I_SHAPES: [Shape; 4] = [
    [(0, 1), (1, 1), (2, 1), (3, 1)],
    [(2, 0), (2, 1), (2, 2), (2, 3)],
    [(0, 2), (1, 2), (2, 2), (3, 2)],
    [(1, 0), (1, 1), (1, 2), (1, 3)],
];

const O_SHAPE: Shape = [(0, 0), (1, 0), (0, 1), (1, 1)];

const S_SHAPES: [Shape; 4] = [
    [(1, 0), (2, 0), (0, 1), (1, 1)],
    [(1, 0), (1, 1), (2, 1), (2, 2)],
    [(1, 1), (2, 1), (0, 2), (1, 2)],
    [(0, 0), (0, 1), (1, 1), (1, 2)],
];

const T_SHAPES: [Shape; 4] = [
    [(1, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (1, 2)],
    [(1, 0), (0, 1), (1, 1), (1, 2)],
];

const Z_SHAPES: [Shape; 4] = [
    [(0, 0), (1, 0), (1, 1), (2, 1)],
    [(2, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (1, 2), (2, 2)],
    [(1, 0), (0, 1), (1, 1), (0, 2)],
];

/// Get the cell offsets for a piece kind and rotation.
///
/// # Examples
///
/// ```
/// use tetris_ng_core::pieces::get_shape;
/// use tetris_ng_types::{PieceKind, Rotation};
///
/// // The I piece lies flat on its second row at spawn.
/// assert_eq!(
///     get_shape(PieceKind::I, Rotation::North),
///     [(0, 1), (1, 1), (2, 1), (3, 1)]
/// );
/// ```
#[inline]
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> Shape {
    let r = rotation.index();
    match kind {
        PieceKind::L => L_SHAPES[r],
        PieceKind::J => J_SHAPES[r],
        PieceKind::I => I_SHAPES[r],
        PieceKind::O => O_SHAPE,
        PieceKind::S => S_SHAPES[r],
        PieceKind::T => T_SHAPES[r],
        PieceKind::Z => Z_SHAPES[r],
    }
}

/// Origin `(x, y)` at which a freshly promoted piece is placed.
///
/// The I piece starts one row higher so its flat bar sits on the top row.
/// The O piece is shifted one column right to stay centred.
#[inline]
pub fn spawn_offset(kind: PieceKind) -> (i8, i8) {
    match kind {
        PieceKind::I => (3, -1),
        PieceKind::O => (4, 0),
        _ => (3, 0),
    }
}
