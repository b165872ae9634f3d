//! Error type shared by the fallible entry points of the engine.

use crate::board::Mark;

/// Errors surfaced to callers of the engine.
///
/// Search itself never fails: a timeout returns the best move found so far
/// and a full board is reported as a draw. These variants cover bad input
/// handed to the engine and configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("position ({row}, {col}) is outside a {size}x{size} board")]
    OutOfBounds { row: i32, col: i32, size: usize },

    #[error("cell ({row}, {col}) is already occupied")]
    Occupied { row: u8, col: u8 },

    #[error("{0:?} is not a player mark")]
    NotAPlayer(Mark),

    #[error("unsupported board size {0} (expected 6..=12)")]
    UnsupportedSize(usize),

    #[error("board is {found}x{found} but {expected}x{expected} was expected")]
    SizeMismatch { expected: usize, found: usize },

    #[error("row {row} is malformed: {reason}")]
    BadRow { row: usize, reason: String },

    #[error("board changed since the move was computed")]
    StaleMove,

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
