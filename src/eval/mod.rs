//! Position evaluation
//!
//! - `patterns`: the run value table
//! - `heuristic`: leaf scores and move-ordering scores
//! - `threat`: track-based threat and fork detection

pub mod heuristic;
pub mod patterns;
pub mod threat;

pub use heuristic::{
    count_in_direction, evaluate_board, evaluate_board_on, score_move, threats_at, LineRun,
};
pub use patterns::{pattern_value, PatternScore};
pub use threat::{detect_threats, fork_moves, ForkMove, Threat, ThreatLevel};
