//! Zobrist hashing for position identification
//!
//! Keys are drawn from a seeded PCG generator per board size, so every
//! table built for the same size hashes identically. That lets a board
//! fingerprint taken by one engine call be checked by another.
//!
//! # Example
//!
//! ```
//! use gomoku6::board::{Board, Mark, Pos};
//! use gomoku6::search::ZobristTable;
//!
//! let zt = ZobristTable::new(6);
//! let mut board = Board::new();
//! let empty = zt.hash(&board);
//!
//! let pos = Pos::new(2, 3);
//! board.place(pos, Mark::X);
//! assert_eq!(zt.update_place(empty, pos, Mark::X), zt.hash(&board));
//! ```

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::board::{Board, Mark, Pos};

const SEED: u64 = 0x6B0A_2D5E_ED00_0006;

/// Zobrist keys for one board size
#[derive(Debug, Clone)]
pub struct ZobristTable {
    size: usize,
    x: Vec<u64>,
    o: Vec<u64>,
}

impl ZobristTable {
    #[must_use]
    pub fn new(size: usize) -> Self {
        let mut rng = Pcg64::seed_from_u64(SEED ^ size as u64);
        let cells = size * size;
        let x = (0..cells).map(|_| rng.gen::<u64>()).collect();
        let o = (0..cells).map(|_| rng.gen::<u64>()).collect();
        Self { size, x, o }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Full hash of a board. The empty board hashes to 0.
    #[must_use]
    pub fn hash(&self, board: &Board) -> u64 {
        debug_assert_eq!(board.size(), self.size);
        board
            .occupied()
            .fold(0, |h, (pos, mark)| self.update_place(h, pos, mark))
    }

    /// Hash after placing (or, XOR being its own inverse, removing) a mark.
    #[inline]
    #[must_use]
    pub fn update_place(&self, hash: u64, pos: Pos, mark: Mark) -> u64 {
        let idx = pos.to_index(self.size);
        match mark {
            Mark::X => hash ^ self.x[idx],
            Mark::O => hash ^ self.o[idx],
            Mark::Empty => hash,
        }
    }
}
