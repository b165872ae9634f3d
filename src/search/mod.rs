//! Search module
//!
//! Contains:
//! - Zobrist hashing for position identification
//! - A bounded, move-count-expiring position cache
//! - Minimax with alpha-beta pruning and iterative deepening

pub mod alphabeta;
pub mod cache;
pub mod zobrist;

pub use alphabeta::{generate_candidates, SearchResult, SearchStats, Searcher, WIN_SCORE};
pub use cache::{CacheEntry, CacheStats, EntryType, PositionCache};
pub use zobrist::ZobristTable;
