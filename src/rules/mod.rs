//! Game rules for the six-board five-in-a-row variant
//!
//! - `geometry`: gap, great-diagonal and reflecting-walk helpers
//! - `tracks`: every 6-cell window that can hold a win
//! - `win`: authoritative win/draw decisions (regular, wrap, bounce)

pub mod geometry;
pub mod tracks;
pub mod win;

pub use geometry::{find_bounce_pattern, has_missing_teeth, is_great_diagonal, BouncePath};
pub use tracks::{Track, TrackKind, WinTracks};
pub use win::{
    check_game_status, check_win, find_winning_move, winning_moves, GameStatus, WinKind, WinResult,
};
