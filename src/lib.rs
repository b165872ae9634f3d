//! Five-in-a-row AI engine for small boards with augmenting rules
//!
//! The game is played on an N×N board (6 ≤ N ≤ 12, 6 by default). Five
//! marks in one line win. Three optional rules change what a line is:
//! - **Wrap**: lines continue across opposite edges
//! - **Bounce**: diagonals reflect off up to two edges
//! - **Missing teeth**: a line with a gap does not win, except on a
//!   great diagonal
//!
//! # Architecture
//!
//! - [`board`]: marks, positions and the copy-on-write board
//! - [`rules`]: geometry helpers, winning tracks and win detection
//! - [`eval`]: pattern values, leaf evaluation and threat detection
//! - [`search`]: Zobrist hashing, position cache and alpha-beta search
//! - [`engine`]: the move-selection facade with its fast paths
//! - [`delay`]: the cancellable pause before a move is shown
//!
//! # Quick Start
//!
//! ```
//! use gomoku6::{AIEngine, Board, Mark, RuleConfig, Strategy};
//!
//! let mut board = Board::new();
//! let mut engine = AIEngine::new();
//! let rules = RuleConfig::all();
//!
//! if let Some(pos) = engine.get_move(&board, Mark::X, &rules) {
//!     board.place(pos, Mark::X);
//!     println!("AI plays at {pos}");
//! }
//! ```

pub mod board;
pub mod config;
pub mod delay;
pub mod engine;
pub mod error;
pub mod eval;
pub mod rules;
pub mod search;

// Re-export commonly used types for convenience
pub use board::{Board, Mark, Pos, DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
pub use config::{DepthPolicy, RuleConfig, SearchConfig};
pub use delay::{CancelToken, DelayOutcome, ThinkingDelay};
pub use engine::{AIEngine, MoveResult, PendingMove, SearchType, Strategy};
pub use error::EngineError;
pub use rules::{check_game_status, check_win, GameStatus, WinKind, WinResult};
