//! Track-based threat detection
//!
//! Classifies every enabled track by how many of its live cells the player
//! holds and turns that into ranked candidate cells. A threat is advice
//! for move ordering and the fast paths; it is never a verdict.

use rustc_hash::FxHashMap;

use crate::board::{Board, Mark, Pos, TRACK_LEN};
use crate::config::RuleConfig;
use crate::rules::tracks::{Track, WinTracks};
use crate::rules::win::check_win;

/// How close a track is to winning
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThreatLevel {
    /// Two marks with room to grow
    Potential,
    /// Three marks in a five-cell window
    Developing,
    /// Three marks in an open six-cell window
    ForcedWin,
    /// One move from five
    ImmediateWin,
}

impl ThreatLevel {
    #[must_use]
    pub const fn base_priority(self) -> i32 {
        match self {
            ThreatLevel::ImmediateWin => 1_000,
            ThreatLevel::ForcedWin => 500,
            ThreatLevel::Developing => 200,
            ThreatLevel::Potential => 50,
        }
    }
}

/// Bonus for a forced-win cell next to another empty cell of its track
const ADJACENT_EMPTY_BONUS: i32 = 100;

/// A candidate cell and the strongest threat it serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threat {
    pub pos: Pos,
    pub level: ThreatLevel,
    pub priority: i32,
    /// Tracks this cell advances
    pub tracks: usize,
}

/// A move that leaves two or more winning replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkMove {
    pub pos: Pos,
    /// Winning cells after the move, in scan order
    pub completions: Vec<Pos>,
}

/// Cells of `track` still usable by `player`: the whole track when the
/// opponent is absent, or the five cells away from a lone opponent mark at
/// either end.
fn live_window<'a>(track: &'a Track, board: &Board, player: Mark) -> Option<&'a [Pos]> {
    let opponent = player.opponent();
    let mut blocked = track
        .cells
        .iter()
        .enumerate()
        .filter(|&(_, &p)| board.get(p) == opponent)
        .map(|(i, _)| i);
    match (blocked.next(), blocked.next()) {
        (None, _) => Some(&track.cells[..]),
        (Some(0), None) => Some(&track.cells[1..]),
        (Some(i), None) if i == TRACK_LEN - 1 => Some(&track.cells[..TRACK_LEN - 1]),
        _ => None,
    }
}

/// Rank every empty cell that advances one of `player`'s tracks.
///
/// Sorted by priority, then by how many tracks the cell serves, then scan
/// order. Cells that would leave a disqualifying gap are dropped.
#[must_use]
pub fn detect_threats(board: &Board, player: Mark, rules: &RuleConfig) -> Vec<Threat> {
    let tracks = WinTracks::for_rules(board.size(), rules);
    let mut by_cell: FxHashMap<Pos, Threat> = FxHashMap::default();

    for track in tracks.enabled(rules) {
        let Some(window) = live_window(track, board, player) else {
            continue;
        };
        let mine = window.iter().filter(|&&p| board.get(p) == player).count();
        let empties = window.len() - mine;
        let level = match mine {
            4.. => ThreatLevel::ImmediateWin,
            3 if window.len() == TRACK_LEN => ThreatLevel::ForcedWin,
            3 => ThreatLevel::Developing,
            2 if empties >= 3 => ThreatLevel::Potential,
            _ => continue,
        };

        for (i, &cand) in window.iter().enumerate() {
            if !board.is_empty(cand) || track.blocked_for(board, player, cand, rules) {
                continue;
            }
            let mut priority = level.base_priority();
            if level == ThreatLevel::ForcedWin {
                let before = i.checked_sub(1).map(|j| window[j]);
                let after = window.get(i + 1).copied();
                if [before, after].into_iter().flatten().any(|p| board.is_empty(p)) {
                    priority += ADJACENT_EMPTY_BONUS;
                }
            }

            let entry = by_cell.entry(cand).or_insert(Threat {
                pos: cand,
                level,
                priority,
                tracks: 0,
            });
            if priority > entry.priority {
                entry.priority = priority;
                entry.level = level;
            }
            entry.tracks += 1;
        }
    }

    let mut threats: Vec<Threat> = by_cell.into_values().collect();
    threats.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.tracks.cmp(&a.tracks))
            .then(a.pos.cmp(&b.pos))
    });
    threats
}

/// Moves for `player` that leave at least two distinct winning cells.
///
/// Only forced-win candidates from [`detect_threats`] are tried, and only
/// cells on tracks through the candidate are checked as completions.
#[must_use]
pub fn fork_moves(board: &Board, player: Mark, rules: &RuleConfig) -> Vec<ForkMove> {
    let tracks = WinTracks::for_rules(board.size(), rules);
    let mut forks = Vec::new();

    for threat in detect_threats(board, player, rules) {
        if threat.level < ThreatLevel::ForcedWin {
            continue;
        }
        let pos = threat.pos;
        let next = board.with_mark(pos, player);
        if check_win(&next, pos, rules).is_some() {
            continue;
        }

        let mut completions: Vec<Pos> = Vec::new();
        for track in tracks.containing(pos).filter(|t| t.kind.enabled(rules)) {
            for &cell in &track.cells {
                if !next.is_empty(cell) || completions.contains(&cell) {
                    continue;
                }
                if check_win(&next.with_mark(cell, player), cell, rules).is_some() {
                    completions.push(cell);
                }
            }
        }
        if completions.len() >= 2 {
            completions.sort();
            forks.push(ForkMove { pos, completions });
        }
    }

    forks.sort_by(|a, b| {
        b.completions
            .len()
            .cmp(&a.completions.len())
            .then(a.pos.cmp(&b.pos))
    });
    forks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(r: u8, c: u8) -> Pos {
        Pos::new(r, c)
    }

    fn rows(top: &str) -> Board {
        Board::from_rows(&[top, "......", "......", "......", "......", "......"]).unwrap()
    }

    #[test]
    fn test_immediate_win_respects_missing_teeth() {
        let board = rows("XXXX..");
        let threats = detect_threats(&board, Mark::X, &RuleConfig::all());
        assert_eq!(threats[0].pos, p(0, 4));
        assert_eq!(threats[0].level, ThreatLevel::ImmediateWin);
        assert!(!threats
            .iter()
            .any(|t| t.pos == p(0, 5) && t.level == ThreatLevel::ImmediateWin));

        let loose = detect_threats(&board, Mark::X, &RuleConfig::default());
        let wins: Vec<Pos> = loose
            .iter()
            .filter(|t| t.level == ThreatLevel::ImmediateWin)
            .map(|t| t.pos)
            .collect();
        assert_eq!(wins, vec![p(0, 4), p(0, 5)]);
    }

    #[test]
    fn test_end_blocker_leaves_five_window() {
        let board = rows("OXXXX.");
        let threats = detect_threats(&board, Mark::X, &RuleConfig::default());
        assert_eq!(threats[0].pos, p(0, 5));
        assert_eq!(threats[0].level, ThreatLevel::ImmediateWin);
    }

    #[test]
    fn test_interior_blocker_kills_track() {
        let board = rows("XXOX..");
        let threats = detect_threats(&board, Mark::X, &RuleConfig::default());
        assert!(threats.iter().all(|t| t.pos.row != 0));
    }

    #[test]
    fn test_forced_win_prefers_adjacent_empties() {
        let board = rows(".XXX..");
        let threats = detect_threats(&board, Mark::X, &RuleConfig::default());
        assert_eq!(threats[0].pos, p(0, 4));
        assert_eq!(threats[0].level, ThreatLevel::ForcedWin);
        assert_eq!(threats[0].priority, 600);
        let left = threats.iter().find(|t| t.pos == p(0, 0)).unwrap();
        assert_eq!(left.priority, 500);
    }

    #[test]
    fn test_potential() {
        let board = rows("XX....");
        let threats = detect_threats(&board, Mark::X, &RuleConfig::default());
        assert!(threats
            .iter()
            .filter(|t| t.pos.row == 0)
            .all(|t| t.level == ThreatLevel::Potential));
        assert_eq!(threats.iter().filter(|t| t.pos.row == 0).count(), 4);
    }

    #[test]
    fn test_no_marks_no_threats() {
        assert!(detect_threats(&Board::new(), Mark::O, &RuleConfig::all()).is_empty());
    }

    #[test]
    fn test_fork_moves() {
        let board = Board::from_rows(&["......", "......", ".XXX..", "......", "......", "......"]).unwrap();
        let forks = fork_moves(&board, Mark::X, &RuleConfig::new(false, false, true));
        assert_eq!(forks.len(), 1);
        assert_eq!(forks[0].pos, p(2, 4));
        assert_eq!(forks[0].completions, vec![p(2, 0), p(2, 5)]);

        let loose = fork_moves(&board, Mark::X, &RuleConfig::default());
        let cells: Vec<Pos> = loose.iter().map(|f| f.pos).collect();
        assert!(cells.contains(&p(2, 0)));
        assert!(cells.contains(&p(2, 4)));
    }
}
