//! Heuristic evaluation of board positions
//!
//! Scores a position for the search leaves and ranks candidate moves.
//! It never decides a game: only `rules::check_win` does that.
//!
//! The leaf score is built from:
//! - line patterns for every run on the board, counted once per run
//! - reflecting tracks when the bounce rule is on
//! - a small center-proximity term
//! - a fork bonus when the last move made two threats at once
//!
//! Opponent contributions are scaled up, so the score is not symmetric
//! between the players. The search always evaluates from the root
//! player's side and never negates a child's score.

use crate::board::{Board, Mark, Pos, WIN_LENGTH};
use crate::config::RuleConfig;
use crate::rules::geometry::{has_missing_teeth, missing_teeth_blocks, LINE_DIRECTIONS};
use crate::rules::tracks::{TrackKind, WinTracks};

use super::patterns::{direction_weighted, is_threat, opponent_weighted, pattern_value, PatternScore};

/// Marks collected from the origin in each direction
const MAX_REACH: usize = 4;

/// A run of one player's marks along a line through a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRun {
    /// Player marks in the run, the origin included
    pub count: usize,
    /// Empty cells touching either end (0-2)
    pub open_ends: u8,
    /// Both ends open with a further empty cell beyond each
    pub extended: bool,
    /// Marks in line order
    pub path: Vec<Pos>,
}

impl LineRun {
    #[inline]
    pub fn has_gap(&self) -> bool {
        has_missing_teeth(&self.path)
    }
}

enum RunEnd {
    Open { room: bool },
    Closed,
}

#[inline]
fn cell_at(board: &Board, from: Pos, dir: (i32, i32), k: i32) -> Option<Mark> {
    board.get_at(i32::from(from.row) + dir.0 * k, i32::from(from.col) + dir.1 * k)
}

/// Walk outward from `from`, collecting up to four `player` cells. One
/// empty cell may be skipped per run when another mark of the player
/// follows it.
fn extend(
    board: &Board,
    from: Pos,
    dir: (i32, i32),
    player: Mark,
    gap_used: &mut bool,
    out: &mut Vec<Pos>,
) -> RunEnd {
    let mut k = 0;
    while out.len() < MAX_REACH {
        k += 1;
        match cell_at(board, from, dir, k) {
            None => return RunEnd::Closed,
            Some(m) if m == player => {
                let r = i32::from(from.row) + dir.0 * k;
                let c = i32::from(from.col) + dir.1 * k;
                out.push(Pos::new(r as u8, c as u8));
            }
            Some(Mark::Empty) => {
                if !*gap_used && cell_at(board, from, dir, k + 1) == Some(player) {
                    *gap_used = true;
                    continue;
                }
                let room = cell_at(board, from, dir, k + 1) == Some(Mark::Empty);
                return RunEnd::Open { room };
            }
            Some(_) => return RunEnd::Closed,
        }
    }
    match cell_at(board, from, dir, k + 1) {
        Some(Mark::Empty) => RunEnd::Open {
            room: cell_at(board, from, dir, k + 2) == Some(Mark::Empty),
        },
        _ => RunEnd::Closed,
    }
}

/// Count `player`'s run through `pos` along `(dr, dc)`, up to four marks
/// each way. `pos` itself counts as the player's, so this also
/// measures a move before it is made.
#[must_use]
pub fn count_in_direction(board: &Board, pos: Pos, dr: i32, dc: i32, player: Mark) -> LineRun {
    let mut gap_used = false;
    let mut forward = Vec::new();
    let mut backward = Vec::new();
    let fwd_end = extend(board, pos, (dr, dc), player, &mut gap_used, &mut forward);
    let back_end = extend(board, pos, (-dr, -dc), player, &mut gap_used, &mut backward);

    let mut open_ends = 0;
    let mut rooms = 0;
    for end in [&fwd_end, &back_end] {
        if let RunEnd::Open { room } = end {
            open_ends += 1;
            if *room {
                rooms += 1;
            }
        }
    }

    let mut path: Vec<Pos> = backward.into_iter().rev().collect();
    path.push(pos);
    path.extend(forward);

    LineRun {
        count: path.len(),
        open_ends,
        extended: open_ends == 2 && rooms == 2,
        path,
    }
}

/// Pattern value of one run, missing teeth and the diagonal multiplier
/// applied.
fn line_value(run: &LineRun, dir: (i32, i32), rules: &RuleConfig, size: usize, early: bool) -> i32 {
    let value = if run.count >= WIN_LENGTH {
        if missing_teeth_blocks(rules.missing_teeth, run.has_gap(), &run.path, size) {
            PatternScore::BROKEN_FIVE
        } else {
            PatternScore::WIN
        }
    } else {
        pattern_value(run.count, run.open_ends, run.extended)
    };
    direction_weighted(value, dir, early)
}

/// Only the first mark of a run (looking back past one skippable gap)
/// scores it.
fn is_run_start(board: &Board, pos: Pos, dir: (i32, i32), player: Mark) -> bool {
    match cell_at(board, pos, dir, -1) {
        Some(m) if m == player => false,
        Some(Mark::Empty) => cell_at(board, pos, dir, -2) != Some(player),
        _ => true,
    }
}

fn center_bonus(size: usize, pos: Pos) -> i32 {
    // Doubled coordinates keep even-sized boards symmetric
    let span = 2 * (size as i32 - 1);
    let d = (2 * i32::from(pos.row) - (size as i32 - 1)).abs()
        + (2 * i32::from(pos.col) - (size as i32 - 1)).abs();
    (span - d) / 2
}

fn bounce_value(tracks: &WinTracks, board: &Board, player: Mark) -> i32 {
    tracks
        .all()
        .iter()
        .filter(|t| matches!(t.kind, TrackKind::Bounce | TrackKind::DoubleBounce))
        .map(|t| match t.tally(board, player) {
            (mine, _, 0) if mine >= 3 => pattern_value(mine.min(4), 1, false),
            _ => 0,
        })
        .sum()
}

/// Number of directions in which the mark at `pos` forms a threat.
#[must_use]
pub fn threats_at(board: &Board, pos: Pos) -> usize {
    let player = board.get(pos);
    if !player.is_player() {
        return 0;
    }
    LINE_DIRECTIONS
        .iter()
        .filter(|&&(dr, dc)| {
            let run = count_in_direction(board, pos, dr, dc, player);
            is_threat(run.count, run.open_ends)
        })
        .count()
}

/// Evaluate the board for `me`.
///
/// Positive favors `me`. `last_move` enables the fork bonus for whoever
/// made it.
#[must_use]
pub fn evaluate_board(
    board: &Board,
    me: Mark,
    opponent: Mark,
    rules: &RuleConfig,
    last_move: Option<Pos>,
) -> i32 {
    let tracks = WinTracks::for_rules(board.size(), rules);
    evaluate_board_on(&tracks, board, me, opponent, rules, last_move)
}

/// [`evaluate_board`] with the tracks already in hand.
///
/// `tracks` must be the set [`WinTracks::for_rules`] gives for this board
/// size and `rules`. The search fetches it once instead of once per leaf.
#[must_use]
pub fn evaluate_board_on(
    tracks: &WinTracks,
    board: &Board,
    me: Mark,
    opponent: Mark,
    rules: &RuleConfig,
    last_move: Option<Pos>,
) -> i32 {
    debug_assert_eq!(tracks.size(), board.size());
    let size = board.size();
    let early = board.mark_count() <= size;

    let mut mine = 0;
    let mut theirs = 0;
    for (pos, mark) in board.occupied() {
        let mut score = center_bonus(size, pos);
        for &dir in &LINE_DIRECTIONS {
            if !is_run_start(board, pos, dir, mark) {
                continue;
            }
            let run = count_in_direction(board, pos, dir.0, dir.1, mark);
            score += line_value(&run, dir, rules, size, early);
        }
        if mark == me {
            mine += score;
        } else if mark == opponent {
            theirs += score;
        }
    }

    if rules.bounce {
        mine += bounce_value(tracks, board, me);
        theirs += bounce_value(tracks, board, opponent);
    }

    let mut total = mine - opponent_weighted(theirs);

    if let Some(last) = last_move {
        if threats_at(board, last) >= 2 {
            let maker = board.get(last);
            if maker == me {
                total += PatternScore::FORK;
            } else if maker == opponent {
                total -= opponent_weighted(PatternScore::FORK);
            }
        }
    }
    total
}

/// Ordering score for playing `pos`: what it builds for `player` plus what
/// it takes away from the opponent.
#[must_use]
pub fn score_move(board: &Board, pos: Pos, player: Mark, rules: &RuleConfig) -> i32 {
    let size = board.size();
    let early = board.mark_count() <= size;
    let opponent = player.opponent();
    LINE_DIRECTIONS
        .iter()
        .map(|&dir| {
            let attack = count_in_direction(board, pos, dir.0, dir.1, player);
            let defense = count_in_direction(board, pos, dir.0, dir.1, opponent);
            line_value(&attack, dir, rules, size, early)
                + opponent_weighted(line_value(&defense, dir, rules, size, early))
        })
        .sum()
}
