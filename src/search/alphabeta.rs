//! Minimax search with alpha-beta pruning and iterative deepening
//!
//! The leaf evaluation is not symmetric between the two players (opponent
//! patterns are weighted up), so the search is a plain minimax from the
//! root player's point of view rather than negamax.
//!
//! # Example
//!
//! ```
//! use gomoku6::board::{Board, Mark};
//! use gomoku6::config::{RuleConfig, SearchConfig};
//! use gomoku6::search::Searcher;
//!
//! let board = Board::from_rows(&["XXXX..", "OOO...", "......", "......", "......", "......"]).unwrap();
//! let mut searcher = Searcher::new(RuleConfig::default(), SearchConfig::default());
//!
//! let result = searcher.search_fixed(&board, Mark::X, 2);
//! assert!(result.best_move.is_some());
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use crate::board::{Board, Mark, Pos, DEFAULT_BOARD_SIZE};
use crate::config::{RuleConfig, SearchConfig};
use crate::eval::{evaluate_board_on, score_move};
use crate::rules::geometry::wrap_coord;
use crate::rules::{check_win, WinTracks};

use super::{EntryType, PositionCache, ZobristTable};

/// Score of a won position, before the remaining-depth bonus
pub const WIN_SCORE: i32 = 1_000;

/// Alpha-beta window bound
const INF: i32 = i32::MAX / 2;

/// Ordering bonus for a cell that wins on the spot
const OWN_WIN_BONUS: i32 = 1_000_000;
/// Ordering bonus for a cell that stops the opponent winning on the spot
const BLOCK_BONUS: i32 = 500_000;
/// Per-neighbouring-mark ordering bonus
const ADJACENCY_WEIGHT: i32 = 4;
/// Edge cells start reflected lines when bounce is on
const EDGE_BONUS: i32 = 8;

/// Search statistics for diagnostics and tuning.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Total beta cutoffs
    pub beta_cutoffs: u64,
    /// Cutoffs on the first move tried (measures move ordering quality)
    pub first_move_cutoffs: u64,
    pub cache_probes: u64,
    /// Probes that returned a usable score
    pub cache_hits: u64,
}

impl SearchStats {
    /// First-move cutoff rate in percent
    pub fn first_move_rate(&self) -> f64 {
        if self.beta_cutoffs == 0 {
            0.0
        } else {
            self.first_move_cutoffs as f64 / self.beta_cutoffs as f64 * 100.0
        }
    }
}

/// Search result containing the best move found and associated statistics.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move found, if any
    pub best_move: Option<Pos>,
    /// Score of the best move from the searching player's point of view
    pub score: i32,
    /// Deepest fully completed iteration (0 if only a partial one ran)
    pub depth: u8,
    /// Total nodes searched
    pub nodes: u64,
    pub elapsed: Duration,
    /// The deadline cut the search short
    pub timed_out: bool,
    pub stats: SearchStats,
}

/// One root iteration
struct RootOutcome {
    best_move: Option<Pos>,
    score: i32,
    complete: bool,
}

/// Search state owned by one game session.
///
/// The position cache lives here and nowhere else, so two searchers never
/// see each other's entries.
pub struct Searcher {
    rules: RuleConfig,
    config: SearchConfig,
    zobrist: ZobristTable,
    /// Tracks for the current board size, fetched once per size
    tracks: Arc<WinTracks>,
    cache: PositionCache,
    /// Player the scores are relative to
    root: Mark,
    nodes: u64,
    stats: SearchStats,
}

impl Searcher {
    pub fn new(rules: RuleConfig, config: SearchConfig) -> Self {
        let cache = PositionCache::new(config.cache_capacity, config.cache_ttl_moves);
        let tracks = WinTracks::for_rules(DEFAULT_BOARD_SIZE, &rules);
        Self {
            rules,
            config,
            zobrist: ZobristTable::new(DEFAULT_BOARD_SIZE),
            tracks,
            cache,
            root: Mark::X,
            nodes: 0,
            stats: SearchStats::default(),
        }
    }

    #[inline]
    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// Search exactly `depth` plies with no deadline.
    pub fn search_fixed(&mut self, board: &Board, player: Mark, depth: u8) -> SearchResult {
        self.iterate(board, player, depth.max(1), None)
    }

    /// Iterative deepening up to the configured adaptive depth, stopping at
    /// the configured time budget.
    ///
    /// The deadline is only checked between root moves and between depths,
    /// so one slow subtree can overrun the budget.
    pub fn search_timed(&mut self, board: &Board, player: Mark) -> SearchResult {
        let max_depth = self.config.depth.max_depth(board, &self.rules);
        let deadline = Instant::now() + self.config.time_budget();
        self.iterate(board, player, max_depth, Some(deadline))
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    #[inline]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    #[inline]
    fn evaluate(&self, board: &Board, last_move: Pos) -> i32 {
        evaluate_board_on(&self.tracks, board, self.root, self.root.opponent(), &self.rules, Some(last_move))
    }

    /// Reset per-search counters and drop cache entries that no longer
    /// apply to this board or player.
    fn prepare(&mut self, board: &Board, player: Mark) {
        if self.zobrist.size() != board.size() {
            self.zobrist = ZobristTable::new(board.size());
            self.tracks = WinTracks::for_rules(board.size(), &self.rules);
            self.cache.clear();
        }
        if self.root != player {
            self.cache.clear();
            self.root = player;
        }
        self.cache.begin_move(board.mark_count());
        self.nodes = 0;
        self.stats = SearchStats::default();
    }

    fn iterate(
        &mut self,
        board: &Board,
        player: Mark,
        max_depth: u8,
        deadline: Option<Instant>,
    ) -> SearchResult {
        self.prepare(board, player);
        let start = Instant::now();
        let mut result = SearchResult {
            best_move: None,
            score: 0,
            depth: 0,
            nodes: 0,
            elapsed: Duration::ZERO,
            timed_out: false,
            stats: SearchStats::default(),
        };

        for depth in 1..=max_depth {
            if depth > 1 && deadline.is_some_and(|d| Instant::now() >= d) {
                result.timed_out = true;
                break;
            }
            let outcome = self.search_root(board, player, depth, deadline, result.best_move);
            if !outcome.complete {
                // A partial iteration only counts when nothing finished
                if result.depth == 0 {
                    result.best_move = outcome.best_move;
                    result.score = outcome.score;
                }
                result.timed_out = true;
                break;
            }
            result.best_move = outcome.best_move;
            result.score = outcome.score;
            result.depth = depth;
            debug!(
                "depth {} score {} best {:?} nodes {} ({:?})",
                depth,
                outcome.score,
                outcome.best_move,
                self.nodes,
                start.elapsed()
            );
        }

        result.nodes = self.nodes;
        result.elapsed = start.elapsed();
        result.stats = self.stats.clone();
        result
    }

    /// Root-level search with the full window. `prior` is searched first.
    fn search_root(
        &mut self,
        board: &Board,
        player: Mark,
        depth: u8,
        deadline: Option<Instant>,
        prior: Option<Pos>,
    ) -> RootOutcome {
        let cap = self.config.candidate_cap(true, depth);
        let mut moves = candidates_on(&self.tracks, board, player, &self.rules, cap);
        if let Some(i) = prior.and_then(|p| moves.iter().position(|&m| m == p)) {
            moves[..=i].rotate_right(1);
        }

        let hash = self.zobrist.hash(board);
        let mut alpha = -INF;
        let mut best_move = None;
        let mut best_score = -INF;

        for (i, &mv) in moves.iter().enumerate() {
            if i > 0 && deadline.is_some_and(|d| Instant::now() >= d) {
                return RootOutcome {
                    best_move,
                    score: best_score,
                    complete: false,
                };
            }
            let child = board.with_mark(mv, player);
            let child_hash = self.zobrist.update_place(hash, mv, player);
            let score = self.minimax(&child, false, depth - 1, alpha, INF, mv, child_hash);
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
        }

        RootOutcome {
            best_move,
            score: if best_move.is_some() { best_score } else { 0 },
            complete: true,
        }
    }

    fn minimax(
        &mut self,
        board: &Board,
        maximizing: bool,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
        last_move: Pos,
        hash: u64,
    ) -> i32 {
        self.nodes += 1;

        if let Some(win) = check_win(board, last_move, &self.rules) {
            // Sooner wins and later losses score further from zero
            let score = WIN_SCORE + depth as i32;
            return if win.winner == self.root { score } else { -score };
        }
        if depth == 0 {
            return self.evaluate(board, last_move);
        }
        if board.is_full() {
            return 0;
        }

        self.stats.cache_probes += 1;
        if let Some(score) = self.cache.probe(hash, maximizing, depth, alpha, beta) {
            self.stats.cache_hits += 1;
            return score;
        }

        let to_move = if maximizing { self.root } else { self.root.opponent() };
        let cap = self.config.candidate_cap(false, depth);
        let mut moves = candidates_on(&self.tracks, board, to_move, &self.rules, cap);
        if moves.is_empty() {
            return self.evaluate(board, last_move);
        }
        let hint = self.cache.best_move(hash, maximizing, depth);
        if let Some(i) = hint.and_then(|h| moves.iter().position(|&m| m == h)) {
            moves[..=i].rotate_right(1);
        }

        let (alpha0, beta0) = (alpha, beta);
        let mut best = if maximizing { -INF } else { INF };
        let mut best_move = None;

        for (i, &mv) in moves.iter().enumerate() {
            let child = board.with_mark(mv, to_move);
            let child_hash = self.zobrist.update_place(hash, mv, to_move);
            let score = self.minimax(&child, !maximizing, depth - 1, alpha, beta, mv, child_hash);

            if maximizing {
                if score > best {
                    best = score;
                    best_move = Some(mv);
                }
                alpha = alpha.max(score);
            } else {
                if score < best {
                    best = score;
                    best_move = Some(mv);
                }
                beta = beta.min(score);
            }

            if beta <= alpha {
                self.stats.beta_cutoffs += 1;
                if i == 0 {
                    self.stats.first_move_cutoffs += 1;
                }
                break;
            }
        }

        let entry_type = if best <= alpha0 {
            EntryType::UpperBound
        } else if best >= beta0 {
            EntryType::LowerBound
        } else {
            EntryType::Exact
        };
        self.cache.store(hash, maximizing, depth, best, entry_type, best_move);
        best
    }
}

/// Neighbouring cells of `pos`, across the edges when wrap is on
fn neighbours(size: usize, pos: Pos, wrap: bool) -> impl Iterator<Item = Pos> {
    const OFFSETS: [(i32, i32); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];
    OFFSETS.into_iter().filter_map(move |(dr, dc)| {
        let r = pos.row as i32 + dr;
        let c = pos.col as i32 + dc;
        if Pos::is_valid(r, c, size) {
            Some(Pos::new(r as u8, c as u8))
        } else if wrap {
            Some(Pos::new(wrap_coord(r, size), wrap_coord(c, size)))
        } else {
            None
        }
    })
}

/// Empty cells of 4-mark tracks where `player` wins by playing
fn winning_cells(board: &Board, player: Mark, rules: &RuleConfig, tracks: &WinTracks) -> Vec<Pos> {
    let mut cells = Vec::new();
    for track in tracks.enabled(rules) {
        let (mine, empty, _) = track.tally(board, player);
        if mine < 4 || empty == 0 {
            continue;
        }
        for &cell in &track.cells {
            if board.is_empty(cell)
                && !cells.contains(&cell)
                && check_win(&board.with_mark(cell, player), cell, rules).is_some()
            {
                cells.push(cell);
            }
        }
    }
    cells
}

/// Ordered, capped move list for `to_move`.
///
/// Cells next to an existing mark, plus every cell where either side wins
/// on the spot. Depends only on the position, the side to move and the
/// cap, so cached scores stay consistent with a fresh search.
pub fn generate_candidates(board: &Board, to_move: Mark, rules: &RuleConfig, cap: usize) -> Vec<Pos> {
    let tracks = WinTracks::for_rules(board.size(), rules);
    candidates_on(&tracks, board, to_move, rules, cap)
}

/// [`generate_candidates`] over tracks the caller already holds.
fn candidates_on(tracks: &WinTracks, board: &Board, to_move: Mark, rules: &RuleConfig, cap: usize) -> Vec<Pos> {
    let size = board.size();
    if board.is_board_empty() {
        let mut center = board.center_cells();
        center.truncate(cap.max(1));
        return center;
    }

    let wins = winning_cells(board, to_move, rules, tracks);
    let blocks = winning_cells(board, to_move.opponent(), rules, tracks);

    let mut seen = vec![false; size * size];
    let mut cells: Vec<Pos> = Vec::new();
    let mut push = |p: Pos, cells: &mut Vec<Pos>| {
        let idx = p.to_index(size);
        if board.is_empty(p) && !seen[idx] {
            seen[idx] = true;
            cells.push(p);
        }
    };
    for &p in wins.iter().chain(&blocks) {
        push(p, &mut cells);
    }
    for (pos, _) in board.occupied() {
        for n in neighbours(size, pos, rules.wrap) {
            push(n, &mut cells);
        }
    }

    let last = size as i32 - 1;
    let mut scored: Vec<(i32, Pos)> = cells
        .into_iter()
        .map(|p| {
            let mut score = score_move(board, p, to_move, rules);
            if wins.contains(&p) {
                score += OWN_WIN_BONUS;
            } else if blocks.contains(&p) {
                score += BLOCK_BONUS;
            }
            let adjacent = neighbours(size, p, rules.wrap)
                .filter(|&n| board.get(n).is_player())
                .count() as i32;
            score += adjacent * ADJACENCY_WEIGHT;
            let (r, c) = (p.row as i32, p.col as i32);
            if rules.bounce && (r == 0 || c == 0 || r == last || c == last) {
                score += EDGE_BONUS;
            }
            // Doubled distance from the centre keeps odd and even sizes exact
            score -= ((2 * r - last).abs() + (2 * c - last).abs()) / 2;
            (score, p)
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.truncate(cap);
    scored.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::evaluate_board;

    fn p(r: u8, c: u8) -> Pos {
        Pos::new(r, c)
    }

    fn board(rows: &[&str]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    /// Plain minimax over the same move lists, no pruning and no cache
    fn exhaustive(
        board: &Board,
        rules: &RuleConfig,
        config: &SearchConfig,
        root: Mark,
        maximizing: bool,
        depth: u8,
        last_move: Option<Pos>,
    ) -> i32 {
        if let Some(last) = last_move {
            if let Some(win) = check_win(board, last, rules) {
                let score = WIN_SCORE + depth as i32;
                return if win.winner == root { score } else { -score };
            }
            if depth == 0 {
                return evaluate_board(board, root, root.opponent(), rules, Some(last));
            }
            if board.is_full() {
                return 0;
            }
        }
        let to_move = if maximizing { root } else { root.opponent() };
        let cap = config.candidate_cap(last_move.is_none(), depth);
        let scores = generate_candidates(board, to_move, rules, cap).into_iter().map(|mv| {
            exhaustive(&board.with_mark(mv, to_move), rules, config, root, !maximizing, depth - 1, Some(mv))
        });
        if maximizing {
            scores.max().unwrap_or(0)
        } else {
            scores.min().unwrap_or(0)
        }
    }

    #[test]
    fn test_search_finds_winning_move() {
        let b = board(&["XXXX..", "OOO...", "......", "......", "......", "......"]);
        let mut searcher = Searcher::new(RuleConfig::default(), SearchConfig::default());
        let result = searcher.search_fixed(&b, Mark::X, 2);
        let best = result.best_move.unwrap();
        assert!(best == p(0, 4) || best == p(0, 5));
        assert!(result.score > WIN_SCORE);
    }

    #[test]
    fn test_search_blocks_opponent_win() {
        let b = board(&["OOOO..", "......", "..X...", "......", "...X..", "......"]);
        let rules = RuleConfig::new(false, false, true);
        let mut searcher = Searcher::new(rules, SearchConfig::default());
        let result = searcher.search_fixed(&b, Mark::X, 2);
        assert_eq!(result.best_move, Some(p(0, 4)));
        assert!(result.score > -WIN_SCORE);
    }

    #[test]
    fn test_losing_position_scores_as_loss() {
        // O wins at (0,4) or (0,5) and X can only take one of them
        let b = board(&["OOOO..", "......", "..X...", "......", "...X..", "......"]);
        let mut searcher = Searcher::new(RuleConfig::default(), SearchConfig::default());
        let result = searcher.search_fixed(&b, Mark::X, 2);
        assert_eq!(result.score, -WIN_SCORE);
    }

    #[test]
    fn test_pruning_matches_exhaustive_minimax() {
        let positions = [
            board(&["......", "..X...", "..OX..", "...O..", "......", "......"]),
            board(&["X.....", ".O....", "..X...", "...O..", "....X.", "......"]),
        ];
        let config = SearchConfig::default();
        for rules in [RuleConfig::default(), RuleConfig::all()] {
            for b in &positions {
                for depth in 1..=3u8 {
                    let mut searcher = Searcher::new(rules, config.clone());
                    let pruned = searcher.search_fixed(b, Mark::X, depth);
                    let full = exhaustive(b, &rules, &config, Mark::X, true, depth, None);
                    assert_eq!(pruned.score, full, "depth {depth} rules {rules:?}\n{}", b.render());
                }
            }
        }
    }

    #[test]
    fn test_repeated_search_same_score() {
        let b = board(&["......", "..X...", "..OO..", "...X..", "......", "......"]);
        let mut searcher = Searcher::new(RuleConfig::all(), SearchConfig::default());
        let first = searcher.search_fixed(&b, Mark::X, 3);
        assert!(searcher.cache_len() > 0);
        let second = searcher.search_fixed(&b, Mark::X, 3);
        let mut fresh = Searcher::new(RuleConfig::all(), SearchConfig::default());
        let third = fresh.search_fixed(&b, Mark::X, 3);
        assert_eq!(first.score, second.score);
        assert_eq!(first.score, third.score);
    }

    #[test]
    fn test_switching_player_clears_cache() {
        let b = board(&["......", "..X...", "..O...", "......", "......", "......"]);
        let mut searcher = Searcher::new(RuleConfig::default(), SearchConfig::default());
        let as_x = searcher.search_fixed(&b, Mark::X, 2).score;
        let as_o = searcher.search_fixed(&b, Mark::O, 2).score;
        let fresh_o = Searcher::new(RuleConfig::default(), SearchConfig::default())
            .search_fixed(&b, Mark::O, 2)
            .score;
        assert_eq!(as_o, fresh_o);
        let fresh_x = Searcher::new(RuleConfig::default(), SearchConfig::default())
            .search_fixed(&b, Mark::X, 2)
            .score;
        assert_eq!(as_x, fresh_x);
    }

    #[test]
    fn test_changing_board_size_refreshes_tracks() {
        let small = board(&["......", "..X...", "..OX..", "...O..", "......", "......"]);
        let large = board(&[
            ".......", "X......", "X..O...", "X...O..", "......O", ".......", ".......",
        ]);
        let rules = RuleConfig::all();
        let config = SearchConfig::default();
        let mut searcher = Searcher::new(rules, config.clone());
        searcher.search_fixed(&small, Mark::X, 2);
        assert_eq!(searcher.tracks.size(), 6);

        let reused = searcher.search_fixed(&large, Mark::X, 2);
        assert_eq!(searcher.tracks.size(), 7);
        let full = exhaustive(&large, &rules, &config, Mark::X, true, 2, None);
        assert_eq!(reused.score, full);
        assert_eq!(
            generate_candidates(&large, Mark::X, &rules, 18),
            candidates_on(&searcher.tracks, &large, Mark::X, &rules, 18)
        );
    }

    #[test]
    fn test_search_node_count() {
        let b = board(&["......", "......", "..X...", "...O..", "......", "......"]);
        let mut searcher = Searcher::new(RuleConfig::default(), SearchConfig::default());
        let result = searcher.search_fixed(&b, Mark::X, 3);
        assert!(result.nodes > 0);
        assert_eq!(result.depth, 3);
        assert!(!result.timed_out);
        assert!(result.stats.cache_probes > 0);
    }

    #[test]
    fn test_timed_search_on_larger_board() {
        let mut b = Board::new_sized(8).unwrap();
        b.place(p(3, 3), Mark::X);
        b.place(p(4, 4), Mark::O);
        let config = SearchConfig {
            time_budget_ms: 200,
            ..SearchConfig::default()
        };
        let mut searcher = Searcher::new(RuleConfig::all(), config);
        let result = searcher.search_timed(&b, Mark::X);
        let best = result.best_move.unwrap();
        assert!(b.is_empty(best));
        assert!(result.depth >= 1 || result.timed_out);
    }

    #[test]
    fn test_candidates_include_urgent_cells() {
        // (5,5) touches no mark, so only the win check can add it
        let b = board(&["......", "......", "X.....", "......", "......", "OOOO.."]);
        let moves = generate_candidates(&b, Mark::X, &RuleConfig::new(false, false, true), 3);
        assert_eq!(moves[0], p(5, 4));
        assert!(!moves.contains(&p(5, 5)));

        let loose = generate_candidates(&b, Mark::X, &RuleConfig::default(), 3);
        assert!(loose[..2].contains(&p(5, 4)));
        assert!(loose[..2].contains(&p(5, 5)));
    }

    #[test]
    fn test_candidates_empty_board_is_center() {
        let b = Board::new();
        let moves = generate_candidates(&b, Mark::X, &RuleConfig::all(), 12);
        assert_eq!(moves, b.center_cells());
    }

    #[test]
    fn test_candidates_wrap_neighbours() {
        let b = board(&["X.....", "......", "......", "......", "......", "......"]);
        let plain = generate_candidates(&b, Mark::O, &RuleConfig::default(), 20);
        assert_eq!(plain.len(), 3);
        let wrapped = generate_candidates(&b, Mark::O, &RuleConfig::new(false, true, false), 20);
        assert_eq!(wrapped.len(), 8);
        assert!(wrapped.contains(&p(5, 5)));
    }
}
