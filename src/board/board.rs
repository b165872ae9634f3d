//! Board structure
//!
//! The engine never mutates a caller's board. Simulations go through
//! [`Board::with_mark`], which returns a modified copy.

use super::{Mark, Pos, DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::error::EngineError;

/// N x N game board
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Mark>,
    /// Number of occupied cells
    marks: usize,
}

impl Board {
    /// Empty board of the reference size
    pub fn new() -> Self {
        Self {
            size: DEFAULT_BOARD_SIZE,
            cells: vec![Mark::Empty; DEFAULT_BOARD_SIZE * DEFAULT_BOARD_SIZE],
            marks: 0,
        }
    }

    /// Empty board of a given size
    pub fn new_sized(size: usize) -> Result<Self, EngineError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(EngineError::UnsupportedSize(size));
        }
        Ok(Self {
            size,
            cells: vec![Mark::Empty; size * size],
            marks: 0,
        })
    }

    /// Parse a board from rows such as `"XXXX.."`.
    ///
    /// Every row must have as many cells as there are rows.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, EngineError> {
        let mut board = Self::new_sized(rows.len())?;
        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let marks: Vec<Mark> = row
                .chars()
                .map(|c| {
                    Mark::from_symbol(c).ok_or_else(|| EngineError::BadRow {
                        row: r,
                        reason: format!("unexpected character {c:?}"),
                    })
                })
                .collect::<Result<_, _>>()?;
            if marks.len() != board.size {
                return Err(EngineError::BadRow {
                    row: r,
                    reason: format!("expected {} cells, found {}", board.size, marks.len()),
                });
            }
            for (c, mark) in marks.into_iter().enumerate() {
                if mark.is_player() {
                    board.place(Pos::new(r as u8, c as u8), mark);
                }
            }
        }
        Ok(board)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        (pos.row as usize) < self.size && (pos.col as usize) < self.size
    }

    /// Get mark at position. `pos` must be on the board.
    #[inline]
    pub fn get(&self, pos: Pos) -> Mark {
        debug_assert!(self.contains(pos), "{pos} is off a {0}x{0} board", self.size);
        self.cells[pos.to_index(self.size)]
    }

    /// Get mark at signed coordinates, `None` when off the board
    #[inline]
    pub fn get_at(&self, row: i32, col: i32) -> Option<Mark> {
        if Pos::is_valid(row, col, self.size) {
            Some(self.cells[row as usize * self.size + col as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.get(pos) == Mark::Empty
    }

    /// Place a mark without validation. Use `try_place` for untrusted input.
    #[inline]
    pub fn place(&mut self, pos: Pos, mark: Mark) {
        debug_assert!(self.contains(pos), "{pos} is off a {0}x{0} board", self.size);
        let idx = pos.to_index(self.size);
        let prev = self.cells[idx];
        self.cells[idx] = mark;
        match (prev.is_player(), mark.is_player()) {
            (false, true) => self.marks += 1,
            (true, false) => self.marks -= 1,
            _ => {}
        }
    }

    /// Place a player's mark on an empty, in-range cell.
    pub fn try_place(&mut self, pos: Pos, mark: Mark) -> Result<(), EngineError> {
        if !mark.is_player() {
            return Err(EngineError::NotAPlayer(mark));
        }
        if !self.contains(pos) {
            return Err(EngineError::OutOfBounds {
                row: i32::from(pos.row),
                col: i32::from(pos.col),
                size: self.size,
            });
        }
        if !self.is_empty(pos) {
            return Err(EngineError::Occupied {
                row: pos.row,
                col: pos.col,
            });
        }
        self.place(pos, mark);
        Ok(())
    }

    #[inline]
    pub fn remove(&mut self, pos: Pos) {
        self.place(pos, Mark::Empty);
    }

    /// Copy of this board with one extra mark (copy-on-write simulation)
    #[must_use]
    pub fn with_mark(&self, pos: Pos, mark: Mark) -> Board {
        let mut next = self.clone();
        next.place(pos, mark);
        next
    }

    /// Total marks on board
    #[inline]
    pub fn mark_count(&self) -> usize {
        self.marks
    }

    #[inline]
    pub fn count_of(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|&&m| m == mark).count()
    }

    #[inline]
    pub fn is_board_empty(&self) -> bool {
        self.marks == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.marks == self.cells.len()
    }

    #[inline]
    pub fn empty_count(&self) -> usize {
        self.cells.len() - self.marks
    }

    /// All positions in row-major scan order
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.cells.len()).map(move |i| Pos::from_index(i, self.size))
    }

    /// Empty positions in scan order
    pub fn empty_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, m)| **m == Mark::Empty)
            .map(move |(i, _)| Pos::from_index(i, self.size))
    }

    /// Occupied positions in scan order
    pub fn occupied(&self) -> impl Iterator<Item = (Pos, Mark)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_player())
            .map(move |(i, m)| (Pos::from_index(i, self.size), *m))
    }

    /// Cells of the centre (1 cell for odd sizes, 4 for even)
    pub fn center_cells(&self) -> Vec<Pos> {
        let n = self.size as u8;
        let lo = (n - 1) / 2;
        let hi = n / 2;
        let mut cells = Vec::with_capacity(4);
        for r in lo..=hi {
            for c in lo..=hi {
                cells.push(Pos::new(r, c));
            }
        }
        cells
    }

    /// Plain-text rendering, one row per line
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.size * (self.size + 1));
        for r in 0..self.size {
            for c in 0..self.size {
                out.push(self.get(Pos::new(r as u8, c as u8)).symbol());
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
