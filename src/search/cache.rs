//! Bounded position cache for one game's searches
//!
//! Entries are keyed by `(hash, maximizing, depth)`, so a score stored at
//! one depth is never returned for another. The cache belongs to a single
//! `Searcher`; nothing is shared between searchers.
//!
//! Two bounds keep it small and fresh:
//! - at capacity, new positions are not stored (existing keys still update)
//! - entries expire a fixed number of moves after they were written
//!
//! A miss is always safe: the caller just searches the node.

use rustc_hash::FxHashMap;

use crate::board::Pos;

/// How a stored score relates to the true value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// The search completed inside the window
    Exact,
    /// Score >= stored value (beta cutoff)
    LowerBound,
    /// Score <= stored value (failed low)
    UpperBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    hash: u64,
    maximizing: bool,
    depth: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheEntry {
    pub score: i32,
    pub entry_type: EntryType,
    pub best_move: Option<Pos>,
    /// Last move number at which the entry may be used
    expires_at: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
    /// Stores refused because the cache was full
    pub refused: u64,
}

pub struct PositionCache {
    entries: FxHashMap<CacheKey, CacheEntry>,
    capacity: usize,
    ttl_moves: usize,
    move_number: usize,
    stats: CacheStats,
}

impl PositionCache {
    #[must_use]
    pub fn new(capacity: usize, ttl_moves: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            capacity,
            ttl_moves,
            move_number: 0,
            stats: CacheStats::default(),
        }
    }

    /// Start a search at `move_number` (marks on the root board) and drop
    /// entries that have expired.
    ///
    /// A lower move number than the last one means an undo or a new game,
    /// so nothing stored so far applies and the cache is emptied.
    pub fn begin_move(&mut self, move_number: usize) {
        if move_number < self.move_number {
            self.entries.clear();
        } else {
            self.entries.retain(|_, e| e.expires_at >= move_number);
        }
        self.move_number = move_number;
    }

    /// Usable score for a node, if one is stored for this exact depth.
    pub fn probe(&mut self, hash: u64, maximizing: bool, depth: u8, alpha: i32, beta: i32) -> Option<i32> {
        self.stats.probes += 1;
        let key = CacheKey {
            hash,
            maximizing,
            depth,
        };
        let entry = self.entries.get(&key)?;
        if entry.expires_at < self.move_number {
            return None;
        }
        let usable = match entry.entry_type {
            EntryType::Exact => true,
            EntryType::LowerBound => entry.score >= beta,
            EntryType::UpperBound => entry.score <= alpha,
        };
        if usable {
            self.stats.hits += 1;
            Some(entry.score)
        } else {
            None
        }
    }

    /// Best move recorded for a node, for move ordering.
    #[must_use]
    pub fn best_move(&self, hash: u64, maximizing: bool, depth: u8) -> Option<Pos> {
        let key = CacheKey {
            hash,
            maximizing,
            depth,
        };
        self.entries
            .get(&key)
            .filter(|e| e.expires_at >= self.move_number)
            .and_then(|e| e.best_move)
    }

    pub fn store(
        &mut self,
        hash: u64,
        maximizing: bool,
        depth: u8,
        score: i32,
        entry_type: EntryType,
        best_move: Option<Pos>,
    ) {
        let key = CacheKey {
            hash,
            maximizing,
            depth,
        };
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.stats.refused += 1;
            return;
        }
        self.stats.stores += 1;
        self.entries.insert(
            key,
            CacheEntry {
                score,
                entry_type,
                best_move,
                expires_at: self.move_number + self.ttl_moves,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
