//! Rule toggles and search tuning
//!
//! Both are plain serde structs so callers can keep them in whatever
//! format their own session layer uses. `SearchConfig` loads from JSON with
//! every field optional.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::EngineError;

/// The three augmenting rules, supplied with every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Diagonal lines reflect off an edge (up to two reflections)
    pub bounce: bool,
    /// Lines continue across opposite edges
    pub wrap: bool,
    /// A winning line may not have a gap (great diagonals exempt)
    pub missing_teeth: bool,
}

impl RuleConfig {
    pub const fn new(bounce: bool, wrap: bool, missing_teeth: bool) -> Self {
        Self {
            bounce,
            wrap,
            missing_teeth,
        }
    }

    /// Every rule enabled
    pub const fn all() -> Self {
        Self::new(true, true, true)
    }

    pub fn all_enabled(&self) -> bool {
        self.bounce && self.wrap && self.missing_teeth
    }
}

/// Adaptive iterative-deepening ceiling.
///
/// Thresholds are latency tuning, not game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthPolicy {
    /// Marks on board at or below which the position counts as an opening
    pub opening_marks: usize,
    pub opening_depth: u8,
    /// Empty-cell counts separating the middle game bands
    pub mid_empty: usize,
    pub mid_depth: u8,
    pub late_empty: usize,
    pub late_depth: u8,
    pub endgame_depth: u8,
    /// Boards at least this large with every rule on search one ply less
    pub large_board: usize,
}

impl Default for DepthPolicy {
    fn default() -> Self {
        Self {
            opening_marks: 3,
            opening_depth: 3,
            mid_empty: 24,
            mid_depth: 4,
            late_empty: 14,
            late_depth: 5,
            endgame_depth: 7,
            large_board: 8,
        }
    }
}

impl DepthPolicy {
    /// Maximum iterative-deepening depth for this position.
    pub fn max_depth(&self, board: &Board, rules: &RuleConfig) -> u8 {
        let empty = board.empty_count();
        let mut depth = if board.mark_count() <= self.opening_marks {
            self.opening_depth
        } else if empty > self.mid_empty {
            self.mid_depth
        } else if empty > self.late_empty {
            self.late_depth
        } else {
            self.endgame_depth
        };
        if board.size() >= self.large_board && rules.all_enabled() {
            depth = depth.saturating_sub(1);
        }
        depth.clamp(1, empty.max(1) as u8)
    }
}

/// Search tuning for [`crate::AIEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Wall-clock budget checked between root moves and depths
    pub time_budget_ms: u64,
    pub depth: DepthPolicy,
    /// Candidate caps: root, interior nodes with 3+ plies left, deeper
    pub root_candidates: usize,
    pub shallow_candidates: usize,
    pub deep_candidates: usize,
    /// Position cache capacity (entries)
    pub cache_capacity: usize,
    /// Moves after which a cache entry is ignored
    pub cache_ttl_moves: usize,
    /// Plies answered from the opening book
    pub opening_plies: usize,
    /// UX pause before a computed move is shown
    pub thinking_delay_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 1_500,
            depth: DepthPolicy::default(),
            root_candidates: 18,
            shallow_candidates: 14,
            deep_candidates: 12,
            cache_capacity: 200_000,
            cache_ttl_moves: 2,
            opening_plies: 2,
            thinking_delay_ms: 0,
        }
    }
}

impl SearchConfig {
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    #[inline]
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    /// Candidate cap for a node.
    ///
    /// Keyed by remaining depth below the root so that a cached score for
    /// `(position, depth)` always came from the same move list.
    #[inline]
    pub fn candidate_cap(&self, at_root: bool, depth_left: u8) -> usize {
        match (at_root, depth_left) {
            (true, _) => self.root_candidates,
            (false, 3..) => self.shallow_candidates,
            _ => self.deep_candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_config_defaults() {
        let rules = RuleConfig::default();
        assert!(!rules.bounce && !rules.wrap && !rules.missing_teeth);
        assert!(RuleConfig::all().all_enabled());
    }

    #[test]
    fn test_partial_json() {
        let cfg = SearchConfig::from_json(r#"{ "time_budget_ms": 250, "depth": { "endgame_depth": 9 } }"#)
            .unwrap();
        assert_eq!(cfg.time_budget_ms, 250);
        assert_eq!(cfg.depth.endgame_depth, 9);
        assert_eq!(cfg.depth.mid_depth, DepthPolicy::default().mid_depth);
        assert_eq!(cfg.root_candidates, 18);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            SearchConfig::from_json("{ time_budget_ms: }"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_depth_policy_bands() {
        let policy = DepthPolicy::default();
        let rules = RuleConfig::default();

        let empty = Board::new();
        assert_eq!(policy.max_depth(&empty, &rules), policy.opening_depth);

        let mut board = Board::new();
        for i in 0..6u8 {
            board.place(crate::board::Pos::new(0, i), crate::board::Mark::X);
        }
        // 30 empty cells
        assert_eq!(policy.max_depth(&board, &rules), policy.mid_depth);

        for i in 0..6u8 {
            board.place(crate::board::Pos::new(1, i), crate::board::Mark::O);
            board.place(crate::board::Pos::new(2, i), crate::board::Mark::X);
            board.place(crate::board::Pos::new(3, i), crate::board::Mark::O);
        }
        // 12 empty cells
        assert_eq!(policy.max_depth(&board, &rules), policy.endgame_depth);
    }

    #[test]
    fn test_depth_policy_large_board_reduction() {
        let policy = DepthPolicy::default();
        let board = Board::new_sized(9).unwrap();
        let plain = policy.max_depth(&board, &RuleConfig::default());
        let all = policy.max_depth(&board, &RuleConfig::all());
        assert_eq!(all + 1, plain);
    }

    #[test]
    fn test_candidate_caps() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.candidate_cap(true, 1), 18);
        assert_eq!(cfg.candidate_cap(false, 4), 14);
        assert_eq!(cfg.candidate_cap(false, 2), 12);
    }
}
