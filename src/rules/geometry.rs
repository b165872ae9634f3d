//! Line geometry shared by the rule engine, the track generator and the
//! evaluator: missing-teeth gaps, great diagonals, wrapped walks and
//! reflecting (bounce) walks.
//!
//! Everything here is pure. Gap and diagonal logic lives only in this
//! module so the rule check and the heuristics cannot drift apart.

use crate::board::{Board, Mark, Pos};

/// The four base line directions (each line is scanned both ways)
pub const LINE_DIRECTIONS: [(i32, i32); 4] = [
    (0, 1),  // Horizontal
    (1, 0),  // Vertical
    (1, 1),  // Diagonal SE
    (1, -1), // Diagonal SW
];

/// All four signed diagonal directions
pub const DIAGONALS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Maximum reflections on one bounce line
pub const MAX_REFLECTIONS: usize = 2;

/// True iff two consecutive entries of `path` are not adjacent.
pub fn has_missing_teeth(path: &[Pos]) -> bool {
    path.windows(2).any(|w| w[0].chebyshev(w[1]) > 1)
}

/// True iff every cell is on the main diagonal, or every cell is on the
/// anti-diagonal.
pub fn is_great_diagonal(cells: &[Pos], size: usize) -> bool {
    if cells.is_empty() {
        return false;
    }
    cells.iter().all(|p| p.row == p.col)
        || cells
            .iter()
            .all(|p| p.row as usize + p.col as usize == size - 1)
}

/// True iff a `false` sits strictly between two `true` entries.
///
/// `owned[i]` says whether the i-th cell of a line belongs to the player.
/// This is the gap test for lines whose cells are not geometrically
/// adjacent, such as lines crossing the wrap seam.
pub fn interior_gap(owned: &[bool]) -> bool {
    let Some(first) = owned.iter().position(|&o| o) else {
        return false;
    };
    let Some(last) = owned.iter().rposition(|&o| o) else {
        return false;
    };
    owned[first..=last].iter().any(|&o| !o)
}

/// Gap verdict for a line that continues across the wrap seam.
///
/// `owned` flags the line's cells in order; `cells` are the owned ones.
/// Only lines that stay in one row or one column can be gapped: an
/// interior hole counts, and so does the seam itself, since the end cells
/// of such a line are not adjacent on the board. Wrapped broken diagonals
/// never carry a gap. Great diagonals are exempted later by
/// [`missing_teeth_blocks`].
pub fn wrap_line_gap(owned: &[bool], cells: &[Pos]) -> bool {
    let one_row = cells.windows(2).all(|w| w[0].row == w[1].row);
    let one_col = cells.windows(2).all(|w| w[0].col == w[1].col);
    (one_row || one_col) && (interior_gap(owned) || has_missing_teeth(cells))
}

/// Whether the missing-teeth rule rejects a line.
///
/// `gap` is the caller's gap verdict for the line; `cells` are the player's
/// cells on it, used for the great-diagonal exemption.
#[inline]
pub fn missing_teeth_blocks(missing_teeth: bool, gap: bool, cells: &[Pos], size: usize) -> bool {
    missing_teeth && gap && !is_great_diagonal(cells, size)
}

/// Wrap a signed coordinate onto the board
#[inline]
pub fn wrap_coord(v: i32, size: usize) -> u8 {
    v.rem_euclid(size as i32) as u8
}

/// Walk `len` cells from `start` along `dir`.
///
/// With `wrap` coordinates are taken modulo the board size; without it the
/// walk fails when it leaves the board. Walks that revisit a cell fail too.
pub fn walk_line(size: usize, start: Pos, dir: (i32, i32), len: usize, wrap: bool) -> Option<Vec<Pos>> {
    let mut cells = Vec::with_capacity(len);
    for i in 0..len as i32 {
        let r = i32::from(start.row) + dir.0 * i;
        let c = i32::from(start.col) + dir.1 * i;
        let pos = if wrap {
            Pos::new(wrap_coord(r, size), wrap_coord(c, size))
        } else if Pos::is_valid(r, c, size) {
            Pos::new(r as u8, c as u8)
        } else {
            return None;
        };
        if cells.contains(&pos) {
            return None;
        }
        cells.push(pos);
    }
    Some(cells)
}

/// Whether an unwrapped walk of `len` cells from `start` leaves the board,
/// i.e. whether the wrapped version actually crosses an edge.
pub fn crosses_edge(size: usize, start: Pos, dir: (i32, i32), len: usize) -> bool {
    let last = len as i32 - 1;
    let r = i32::from(start.row) + dir.0 * last;
    let c = i32::from(start.col) + dir.1 * last;
    !Pos::is_valid(r, c, size)
}

/// One step of a reflecting walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BounceStep {
    pub pos: Pos,
    /// Direction after the step (reflected if an edge was hit)
    pub dir: (i32, i32),
    pub reflected: bool,
}

/// Advance one cell along `dir`, reflecting off the board edge.
///
/// The row component flips when the row bound is hit, the column component
/// when the column bound is hit; a corner flips both.
#[inline]
pub fn bounce_step(size: usize, pos: Pos, dir: (i32, i32)) -> Option<BounceStep> {
    let n = size as i32;
    let (mut dr, mut dc) = dir;
    let mut reflected = false;

    let mut r = i32::from(pos.row) + dr;
    if r < 0 || r >= n {
        dr = -dr;
        r = i32::from(pos.row) + dr;
        reflected = true;
    }
    let mut c = i32::from(pos.col) + dc;
    if c < 0 || c >= n {
        dc = -dc;
        c = i32::from(pos.col) + dc;
        reflected = true;
    }

    if !Pos::is_valid(r, c, size) {
        return None;
    }
    Some(BounceStep {
        pos: Pos::new(r as u8, c as u8),
        dir: (dr, dc),
        reflected,
    })
}

/// A matched bounce line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BouncePath {
    pub path: Vec<Pos>,
    /// Path indices of the edge cells where the direction reflected
    pub bounce_indices: Vec<usize>,
}

/// Extend a diagonal line of `player` marks from `start` along `dir`,
/// reflecting off edges.
///
/// Stops on a non-matching or already visited cell, once `required_length`
/// cells are collected, or when a third reflection would be needed.
/// Returns `None` if fewer than `required_length` cells matched.
///
/// # Panics
///
/// Panics if `start` is off the board.
pub fn find_bounce_pattern(
    board: &Board,
    start: Pos,
    dir: (i32, i32),
    player: Mark,
    required_length: usize,
) -> Option<BouncePath> {
    assert!(
        board.contains(start),
        "find_bounce_pattern from {start} on a {0}x{0} board",
        board.size()
    );
    if !player.is_player() || board.get(start) != player {
        return None;
    }

    let size = board.size();
    let mut path = vec![start];
    let mut bounce_indices = Vec::with_capacity(MAX_REFLECTIONS);
    let mut pos = start;
    let mut dir = dir;

    while path.len() < required_length {
        let Some(step) = bounce_step(size, pos, dir) else {
            break;
        };
        if step.reflected && bounce_indices.len() == MAX_REFLECTIONS {
            break;
        }
        if board.get(step.pos) != player || path.contains(&step.pos) {
            break;
        }
        if step.reflected {
            bounce_indices.push(path.len() - 1);
        }
        path.push(step.pos);
        pos = step.pos;
        dir = step.dir;
    }

    if path.len() < required_length {
        return None;
    }
    Some(BouncePath {
        path,
        bounce_indices,
    })
}
