//! Win detection
//!
//! A move wins when the mover holds at least five cells of one line
//! window. Win types are tried in a fixed order and the first match is
//! reported:
//!
//! 1. Regular: in-bounds straight line
//! 2. Wrap: straight line continuing across opposite edges
//! 3. Bounce: diagonal reflected off up to two edges
//!
//! With the missing-teeth rule on, a line with a gap does not win unless
//! its cells lie on a great diagonal.

use crate::board::{Board, Mark, Pos, TRACK_LEN, WIN_LENGTH};
use crate::config::RuleConfig;

use super::geometry::{
    bounce_step, crosses_edge, find_bounce_pattern, has_missing_teeth, missing_teeth_blocks,
    wrap_coord, wrap_line_gap, DIAGONALS, LINE_DIRECTIONS,
};

/// Which rule produced a win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinKind {
    Regular,
    Wrap,
    Bounce,
}

/// A detected win
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinResult {
    pub winner: Mark,
    pub kind: WinKind,
    /// Winning cells in line order (at least five)
    pub cells: Vec<Pos>,
    /// Index into `cells` of the first reflection point
    pub bounce_index: Option<usize>,
    /// Index into `cells` of the second reflection point
    pub second_bounce_index: Option<usize>,
}

impl WinResult {
    fn straight(winner: Mark, kind: WinKind, cells: Vec<Pos>) -> Self {
        Self {
            winner,
            kind,
            cells,
            bounce_index: None,
            second_bounce_index: None,
        }
    }
}

/// Overall game state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won(WinResult),
    Draw,
}

/// Check whether the mark at `pos` completes a win.
///
/// # Panics
///
/// Panics if `pos` is off the board.
pub fn check_win(board: &Board, pos: Pos, rules: &RuleConfig) -> Option<WinResult> {
    assert!(
        board.contains(pos),
        "check_win at {pos} on a {0}x{0} board",
        board.size()
    );
    let player = board.get(pos);
    if !player.is_player() {
        return None;
    }

    regular_win(board, pos, player, rules)
        .or_else(|| rules.wrap.then(|| wrap_win(board, pos, player, rules)).flatten())
        .or_else(|| rules.bounce.then(|| bounce_win(board, pos, player, rules)).flatten())
}

/// Scan every occupied cell for a winner, then check for a full board.
///
/// Meant for once-per-move use by the caller, not for the search loop.
pub fn check_game_status(board: &Board, rules: &RuleConfig) -> GameStatus {
    for (pos, _) in board.occupied() {
        if let Some(win) = check_win(board, pos, rules) {
            return GameStatus::Won(win);
        }
    }
    if board.is_full() {
        GameStatus::Draw
    } else {
        GameStatus::InProgress
    }
}

/// First empty cell (scan order) that wins for `player`.
pub fn find_winning_move(board: &Board, player: Mark, rules: &RuleConfig) -> Option<Pos> {
    board
        .empty_cells()
        .find(|&pos| check_win(&board.with_mark(pos, player), pos, rules).is_some())
}

/// Every empty cell that wins for `player`, in scan order.
pub fn winning_moves(board: &Board, player: Mark, rules: &RuleConfig) -> Vec<Pos> {
    board
        .empty_cells()
        .filter(|&pos| check_win(&board.with_mark(pos, player), pos, rules).is_some())
        .collect()
}

/// Cells of the full in-bounds line through `pos`, and the index of `pos`.
fn straight_line(size: usize, pos: Pos, dir: (i32, i32)) -> (Vec<Pos>, usize) {
    let (dr, dc) = dir;
    let mut r = i32::from(pos.row);
    let mut c = i32::from(pos.col);
    while Pos::is_valid(r - dr, c - dc, size) {
        r -= dr;
        c -= dc;
    }
    let mut cells = Vec::with_capacity(size);
    while Pos::is_valid(r, c, size) {
        cells.push(Pos::new(r as u8, c as u8));
        r += dr;
        c += dc;
    }
    let idx = cells.iter().position(|&p| p == pos).unwrap_or(0);
    (cells, idx)
}

/// Longest run of `player` cells through `idx`, as a range into `owned`.
fn run_through(owned: &[bool], idx: usize) -> (usize, usize) {
    let mut lo = idx;
    while lo > 0 && owned[lo - 1] {
        lo -= 1;
    }
    let mut hi = idx;
    while hi + 1 < owned.len() && owned[hi + 1] {
        hi += 1;
    }
    (lo, hi)
}

fn regular_win(board: &Board, pos: Pos, player: Mark, rules: &RuleConfig) -> Option<WinResult> {
    let size = board.size();
    for &dir in &LINE_DIRECTIONS {
        let (line, idx) = straight_line(size, pos, dir);
        if line.len() < WIN_LENGTH {
            continue;
        }
        let owned: Vec<bool> = line.iter().map(|&p| board.get(p) == player).collect();

        let (lo, hi) = run_through(&owned, idx);
        if hi - lo + 1 >= WIN_LENGTH {
            return Some(WinResult::straight(player, WinKind::Regular, line[lo..=hi].to_vec()));
        }

        // Five of six with a missing tooth
        if line.len() < TRACK_LEN {
            continue;
        }
        let first = idx.saturating_sub(TRACK_LEN - 1);
        let last = idx.min(line.len() - TRACK_LEN);
        for start in first..=last {
            let cells: Vec<Pos> = (start..start + TRACK_LEN)
                .filter(|&i| owned[i])
                .map(|i| line[i])
                .collect();
            if cells.len() < WIN_LENGTH {
                continue;
            }
            let gap = has_missing_teeth(&cells);
            if !missing_teeth_blocks(rules.missing_teeth, gap, &cells, size) {
                return Some(WinResult::straight(player, WinKind::Regular, cells));
            }
        }
    }
    None
}

/// Cells of the wrapped cycle through `pos` along `dir`, starting at `pos`.
fn wrapped_cycle(size: usize, pos: Pos, dir: (i32, i32)) -> Vec<Pos> {
    let mut cells = vec![pos];
    let mut r = i32::from(pos.row);
    let mut c = i32::from(pos.col);
    loop {
        r += dir.0;
        c += dir.1;
        let next = Pos::new(wrap_coord(r, size), wrap_coord(c, size));
        if next == pos {
            break;
        }
        cells.push(next);
    }
    cells
}

fn wrap_win(board: &Board, pos: Pos, player: Mark, rules: &RuleConfig) -> Option<WinResult> {
    let size = board.size();
    for &dir in &LINE_DIRECTIONS {
        let cycle = wrapped_cycle(size, pos, dir);
        let period = cycle.len();
        if period < WIN_LENGTH {
            continue;
        }
        let owned = |k: i32| board.get(cycle[k.rem_euclid(period as i32) as usize]) == player;

        // Contiguous run through pos, never longer than the cycle
        let mut back = 0i32;
        while back + 1 < period as i32 && owned(-(back + 1)) {
            back += 1;
        }
        let mut fwd = 0i32;
        while back + fwd + 1 < period as i32 && owned(fwd + 1) {
            fwd += 1;
        }
        let run_len = (back + fwd + 1) as usize;
        let start_k = -back;
        let start = cycle[start_k.rem_euclid(period as i32) as usize];
        if run_len >= WIN_LENGTH && crosses_edge(size, start, dir, run_len) {
            let cells: Vec<Pos> = (0..run_len as i32)
                .map(|i| cycle[(start_k + i).rem_euclid(period as i32) as usize])
                .collect();
            let flags = vec![true; cells.len()];
            let gap = wrap_line_gap(&flags, &cells);
            if !missing_teeth_blocks(rules.missing_teeth, gap, &cells, size) {
                return Some(WinResult::straight(player, WinKind::Wrap, cells));
            }
        }

        // Five of six with a missing tooth, across the seam
        if period < TRACK_LEN {
            continue;
        }
        for offset in 0..TRACK_LEN as i32 {
            let start_k = -offset;
            let start = cycle[start_k.rem_euclid(period as i32) as usize];
            if !crosses_edge(size, start, dir, TRACK_LEN) {
                continue;
            }
            let window: Vec<Pos> = (0..TRACK_LEN as i32)
                .map(|i| cycle[(start_k + i).rem_euclid(period as i32) as usize])
                .collect();
            let flags: Vec<bool> = window.iter().map(|&p| board.get(p) == player).collect();
            let cells: Vec<Pos> = window
                .iter()
                .zip(&flags)
                .filter(|(_, owned)| **owned)
                .map(|(&p, _)| p)
                .collect();
            if cells.len() < WIN_LENGTH {
                continue;
            }
            let gap = wrap_line_gap(&flags, &cells);
            if !missing_teeth_blocks(rules.missing_teeth, gap, &cells, size) {
                return Some(WinResult::straight(player, WinKind::Wrap, cells));
            }
        }
    }
    None
}

fn bounce_win(board: &Board, pos: Pos, player: Mark, rules: &RuleConfig) -> Option<WinResult> {
    let size = board.size();
    for &dir in &DIAGONALS {
        // Walk back along the reflecting line to collect possible start
        // cells, each with the forward direction to use from it.
        let mut seeds = vec![(pos, dir)];
        let mut cur = pos;
        let mut back_dir = (-dir.0, -dir.1);
        for _ in 1..WIN_LENGTH {
            let Some(step) = bounce_step(size, cur, back_dir) else {
                break;
            };
            if board.get(step.pos) != player || seeds.iter().any(|&(p, _)| p == step.pos) {
                break;
            }
            seeds.push((step.pos, (-step.dir.0, -step.dir.1)));
            cur = step.pos;
            back_dir = step.dir;
        }

        for &(seed, forward) in seeds.iter().rev() {
            let Some(found) = find_bounce_pattern(board, seed, forward, player, WIN_LENGTH) else {
                continue;
            };
            if found.bounce_indices.is_empty() || !found.path.contains(&pos) {
                continue;
            }
            let gap = has_missing_teeth(&found.path);
            if missing_teeth_blocks(rules.missing_teeth, gap, &found.path, size) {
                continue;
            }
            return Some(WinResult {
                winner: player,
                kind: WinKind::Bounce,
                bounce_index: found.bounce_indices.first().copied(),
                second_bounce_index: found.bounce_indices.get(1).copied(),
                cells: found.path,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::tracks::{TrackKind, WinTracks};

    fn p(r: u8, c: u8) -> Pos {
        Pos::new(r, c)
    }

    fn board_with(cells: &[Pos], mark: Mark, size: usize) -> Board {
        let mut board = Board::new_sized(size).unwrap();
        for &c in cells {
            board.place(c, mark);
        }
        board
    }

    const PLAIN: RuleConfig = RuleConfig::new(false, false, false);
    const TEETH: RuleConfig = RuleConfig::new(false, false, true);

    #[test]
    fn test_regular_row() {
        let board = Board::from_rows(&["XXXXX.", "......", "......", "......", "......", "......"]).unwrap();
        let win = check_win(&board, p(0, 2), &PLAIN).unwrap();
        assert_eq!(win.winner, Mark::X);
        assert_eq!(win.kind, WinKind::Regular);
        assert_eq!(win.cells, vec![p(0, 0), p(0, 1), p(0, 2), p(0, 3), p(0, 4)]);
        assert_eq!(win.bounce_index, None);
    }

    #[test]
    fn test_four_is_not_a_win() {
        let board = Board::from_rows(&["XXXX..", "......", "......", "......", "......", "......"]).unwrap();
        for c in 0..4 {
            assert!(check_win(&board, p(0, c), &RuleConfig::all()).is_none());
        }
    }

    #[test]
    fn test_empty_cell_is_not_a_win() {
        let board = Board::new();
        assert!(check_win(&board, p(3, 3), &RuleConfig::all()).is_none());
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_panics() {
        let board = Board::new();
        let _ = check_win(&board, p(6, 0), &PLAIN);
    }

    #[test]
    fn test_regular_finds_maximal_run_from_any_member() {
        let size = 8;
        for &dir in &LINE_DIRECTIONS {
            for len in [5usize, 6, 7] {
                let start = if dir.1 < 0 { p(0, 7) } else { p(0, 0) };
                let run: Vec<Pos> = (0..len as i32)
                    .map(|i| p((i32::from(start.row) + dir.0 * i) as u8, (i32::from(start.col) + dir.1 * i) as u8))
                    .collect();
                let board = board_with(&run, Mark::O, size);
                for &trigger in &run {
                    let win = check_win(&board, trigger, &TEETH).unwrap();
                    assert_eq!(win.kind, WinKind::Regular);
                    assert_eq!(win.cells, run, "dir {dir:?} len {len} trigger {trigger}");
                }
            }
        }
    }

    #[test]
    fn test_gapped_row_needs_missing_teeth_off() {
        // Indices {0,1,2,4,5} of row 1
        let cells = [p(1, 0), p(1, 1), p(1, 2), p(1, 4), p(1, 5)];
        let board = board_with(&cells, Mark::X, 6);
        for &c in &cells {
            assert!(check_win(&board, c, &RuleConfig::all()).is_none());
            assert!(check_win(&board, c, &TEETH).is_none());
            let win = check_win(&board, c, &PLAIN).unwrap();
            assert_eq!(win.cells, cells.to_vec());
        }
    }

    #[test]
    fn test_gap_may_hold_opponent_mark() {
        let board = Board::from_rows(&["......", "XXXOXX", "......", "......", "......", "......"]).unwrap();
        assert!(check_win(&board, p(1, 0), &PLAIN).is_some());
        assert!(check_win(&board, p(1, 0), &TEETH).is_none());
    }

    #[test]
    fn test_gapped_great_diagonal_is_exempt() {
        let cells = [p(0, 0), p(1, 1), p(2, 2), p(4, 4), p(5, 5)];
        let board = board_with(&cells, Mark::X, 6);
        let win = check_win(&board, p(0, 0), &RuleConfig::all()).unwrap();
        assert_eq!(win.kind, WinKind::Regular);
        assert_eq!(win.cells, cells.to_vec());

        let anti = [p(0, 5), p(1, 4), p(3, 2), p(4, 1), p(5, 0)];
        let board = board_with(&anti, Mark::O, 6);
        assert!(check_win(&board, p(4, 1), &TEETH).is_some());
    }

    #[test]
    fn test_gapped_short_diagonal_blocked() {
        // Diagonal starting at (0,1) has only five cells; with a gap there
        // are at most four marks on it.
        let board = board_with(&[p(0, 1), p(1, 2), p(3, 4), p(4, 5)], Mark::X, 6);
        assert!(check_win(&board, p(0, 1), &PLAIN).is_none());
    }

    #[test]
    fn test_wrap_diagonal() {
        let cells = [p(3, 0), p(4, 1), p(5, 2), p(0, 3), p(1, 4)];
        let board = board_with(&cells, Mark::X, 6);
        let rules = RuleConfig::new(false, true, true);
        let win = check_win(&board, p(0, 3), &rules).unwrap();
        assert_eq!(win.kind, WinKind::Wrap);
        assert_eq!(win.cells, cells.to_vec());
        assert!(check_win(&board, p(0, 3), &PLAIN).is_none());
    }

    #[test]
    fn test_wrap_row_on_large_board() {
        let cells = [p(2, 6), p(2, 7), p(2, 0), p(2, 1), p(2, 2)];
        let board = board_with(&cells, Mark::O, 8);
        let wrap_only = RuleConfig::new(false, true, false);
        let win = check_win(&board, p(2, 1), &wrap_only).unwrap();
        assert_eq!(win.kind, WinKind::Wrap);
        assert_eq!(win.cells, cells.to_vec());
        // The seam is a gap on a straight row
        assert!(check_win(&board, p(2, 1), &RuleConfig::new(false, true, true)).is_none());
        assert!(check_win(&board, p(2, 1), &PLAIN).is_none());
    }

    #[test]
    fn test_wrap_must_cross_edge() {
        // Five in a row already wins regularly; wrap never relabels it
        let board = Board::from_rows(&[".XXXXX", "......", "......", "......", "......", "......"]).unwrap();
        let win = check_win(&board, p(0, 3), &RuleConfig::new(false, true, false)).unwrap();
        assert_eq!(win.kind, WinKind::Regular);
    }

    #[test]
    fn test_wrap_gapped_diagonal() {
        // Broken diagonal on 7x7 with a hole at (6,2)
        let cells = [p(4, 0), p(5, 1), p(0, 3), p(1, 4), p(2, 5)];
        let board = board_with(&cells, Mark::X, 7);
        let loose = RuleConfig::new(false, true, false);
        let win = check_win(&board, p(1, 4), &loose).unwrap();
        assert_eq!(win.kind, WinKind::Wrap);
        assert_eq!(win.cells.len(), 5);

        // Missing teeth only constrains wraps that stay in one row or column
        let teeth = RuleConfig::new(false, true, true);
        let win = check_win(&board, p(1, 4), &teeth).unwrap();
        assert_eq!(win.kind, WinKind::Wrap);
        for &c in &cells {
            assert!(check_win(&board, c, &teeth).is_some(), "from {c}");
        }
    }

    #[test]
    fn test_bounce_single() {
        let board = Board::from_rows(&[
            "..X...",
            ".X.X..",
            "X...X.",
            "......",
            "......",
            "......",
        ])
        .unwrap();
        let rules = RuleConfig::new(true, false, true);
        for trigger in [p(2, 0), p(1, 1), p(0, 2), p(1, 3), p(2, 4)] {
            let win = check_win(&board, trigger, &rules).unwrap();
            assert_eq!(win.kind, WinKind::Bounce);
            assert_eq!(win.cells.len(), 5);
            let edge = win.bounce_index.unwrap();
            assert_eq!(win.cells[edge], p(0, 2));
            assert_eq!(win.second_bounce_index, None);
        }
        assert!(check_win(&board, p(0, 2), &PLAIN).is_none());
    }

    #[test]
    fn test_bounce_double() {
        let board = Board::from_rows(&[
            "...X..",
            "..X.X.",
            ".....X",
            "....X.",
            "......",
            "......",
        ])
        .unwrap();
        let win = check_win(&board, p(3, 4), &RuleConfig::all()).unwrap();
        assert_eq!(win.kind, WinKind::Bounce);
        let first = win.bounce_index.unwrap();
        let second = win.second_bounce_index.unwrap();
        assert!(first < second);
        let edges = [win.cells[first], win.cells[second]];
        assert!(edges.contains(&p(0, 3)));
        assert!(edges.contains(&p(2, 5)));
    }

    #[test]
    fn test_regular_before_bounce() {
        // A straight diagonal of five also fits a bounce line here
        let board = Board::from_rows(&[
            "X.....",
            ".X....",
            "..X...",
            "...X..",
            "....X.",
            "......",
        ])
        .unwrap();
        let win = check_win(&board, p(4, 4), &RuleConfig::all()).unwrap();
        assert_eq!(win.kind, WinKind::Regular);
    }

    #[test]
    fn test_filled_tracks_always_win() {
        for size in [6usize, 7, 8] {
            let tracks = WinTracks::generate(size, true);
            for track in tracks.all() {
                let board = board_with(&track.cells, Mark::X, size);
                let kind_only = match track.kind {
                    TrackKind::Straight => PLAIN,
                    TrackKind::Wrap => RuleConfig::new(false, true, false),
                    TrackKind::Bounce | TrackKind::DoubleBounce => RuleConfig::new(true, false, false),
                };
                // Rows and columns across the seam carry a gap
                let seam = track.kind == TrackKind::Wrap
                    && (track.cells.iter().all(|c| c.row == track.cells[0].row)
                        || track.cells.iter().all(|c| c.col == track.cells[0].col));
                let rule_sets: &[RuleConfig] = if seam {
                    &[kind_only]
                } else {
                    &[kind_only, RuleConfig::all()]
                };
                for rules in rule_sets {
                    for &trigger in &track.cells {
                        assert!(
                            check_win(&board, trigger, rules).is_some(),
                            "{track:?} from {trigger} with {rules:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_game_status() {
        let rules = RuleConfig::default();
        assert_eq!(check_game_status(&Board::new(), &rules), GameStatus::InProgress);

        let won = Board::from_rows(&["......", "OOOOO.", "XXXX..", "......", "......", "......"]).unwrap();
        match check_game_status(&won, &rules) {
            GameStatus::Won(win) => assert_eq!(win.winner, Mark::O),
            other => panic!("expected a win, got {other:?}"),
        }

        let drawn = Board::from_rows(&["XXOOXX", "XXOOXX", "XXOOXX", "XXOOXX", "OOXXOO", "OOXXOO"]).unwrap();
        assert_eq!(check_game_status(&drawn, &rules), GameStatus::Draw);
    }

    #[test]
    fn test_find_winning_move() {
        let board = Board::from_rows(&["XXXX..", "......", "......", "......", "......", "......"]).unwrap();
        assert_eq!(find_winning_move(&board, Mark::X, &RuleConfig::all()), Some(p(0, 4)));
        assert_eq!(find_winning_move(&board, Mark::O, &RuleConfig::all()), None);
        assert_eq!(winning_moves(&board, Mark::X, &PLAIN), vec![p(0, 4), p(0, 5)]);
        assert_eq!(winning_moves(&board, Mark::X, &RuleConfig::all()), vec![p(0, 4)]);
    }

    #[test]
    fn test_find_winning_move_does_not_mutate() {
        let board = Board::from_rows(&["XXXX..", "......", "......", "......", "......", "......"]).unwrap();
        let before = board.clone();
        let _ = find_winning_move(&board, Mark::X, &PLAIN);
        assert_eq!(board, before);
    }
}
