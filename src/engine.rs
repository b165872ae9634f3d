//! Move selection facade
//!
//! [`AIEngine`] answers "where should `player` move?" by trying cheap,
//! exact answers before falling back to search:
//!
//! 1. **Immediate win**: a cell that wins on the spot
//! 2. **Block**: the opponent's immediate winning cell
//! 3. **Opening**: a short book for the first plies
//! 4. **Fork**: a move leaving two winning replies
//! 5. **Bounce**: block an opponent fork that completes along a reflected line
//! 6. **Alpha-beta**: iterative-deepening search under the time budget
//!
//! If the search panics or yields nothing, a fallback ladder still finds a
//! legal move, so `get_move` only returns `None` on a full board.
//!
//! # Example
//!
//! ```
//! use gomoku6::{AIEngine, Board, Mark, Pos, RuleConfig, SearchType};
//!
//! let board = Board::from_rows(&["XXXX..", "......", "......", "......", "......", "......"]).unwrap();
//! let mut engine = AIEngine::new();
//!
//! let result = engine.get_move_with_stats(&board, Mark::X, &RuleConfig::all());
//! assert_eq!(result.best_move, Some(Pos::new(0, 4)));
//! assert_eq!(result.search_type, SearchType::ImmediateWin);
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use log::{debug, error, warn};

use crate::board::{Board, Mark, Pos};
use crate::config::{RuleConfig, SearchConfig};
use crate::error::EngineError;
use crate::eval::{detect_threats, fork_moves};
use crate::rules::{find_winning_move, TrackKind, WinTracks};
use crate::search::{SearchResult, Searcher, ZobristTable, WIN_SCORE};

/// The one capability the session layer needs from an AI player.
pub trait Strategy {
    /// Choose a move for `player`. The board is never modified.
    fn get_move(&mut self, board: &Board, player: Mark, rules: &RuleConfig) -> Option<Pos>;
}

/// Which stage of the engine produced the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    ImmediateWin,
    /// Took the opponent's winning cell
    Block,
    Opening,
    /// Move that leaves two winning replies
    Fork,
    /// Blocked an opponent fork along a reflected line
    Bounce,
    AlphaBeta,
    /// Search gave nothing usable
    Fallback,
}

/// Result of a move search with detailed statistics.
#[derive(Debug, Clone)]
pub struct MoveResult {
    /// Best move found, `None` only on a full board
    pub best_move: Option<Pos>,
    /// Score from the mover's point of view (0 for heuristic stages)
    pub score: i32,
    pub search_type: SearchType,
    /// Completed search depth (0 for fast paths)
    pub depth: u8,
    /// Nodes searched
    pub nodes: u64,
    /// Time taken in milliseconds
    pub time_ms: u64,
}

impl MoveResult {
    #[inline]
    fn fast(pos: Option<Pos>, score: i32, search_type: SearchType, start: Instant) -> Self {
        Self {
            best_move: pos,
            score,
            search_type,
            depth: 0,
            nodes: 0,
            time_ms: start.elapsed().as_millis() as u64,
        }
    }

    #[inline]
    fn from_search(result: SearchResult, start: Instant) -> Self {
        Self {
            best_move: result.best_move,
            score: result.score,
            search_type: SearchType::AlphaBeta,
            depth: result.depth,
            nodes: result.nodes,
            time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// A computed move tied to the board it was computed for.
///
/// The session layer may change the board while the engine is thinking
/// (an undo, a reset, a remote move). `commit` refuses to apply the move
/// to any board other than the one it was planned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub pos: Pos,
    pub player: Mark,
    size: usize,
    fingerprint: u64,
}

impl PendingMove {
    fn new(board: &Board, pos: Pos, player: Mark) -> Self {
        Self {
            pos,
            player,
            size: board.size(),
            fingerprint: ZobristTable::new(board.size()).hash(board),
        }
    }

    /// Whether `board` is still the position the move was planned on
    pub fn is_current(&self, board: &Board) -> bool {
        board.size() == self.size && ZobristTable::new(self.size).hash(board) == self.fingerprint
    }

    /// Place the move, unless the board changed since it was planned.
    pub fn commit(&self, board: &mut Board) -> Result<(), EngineError> {
        if board.size() != self.size {
            return Err(EngineError::SizeMismatch {
                expected: self.size,
                found: board.size(),
            });
        }
        if !self.is_current(board) {
            return Err(EngineError::StaleMove);
        }
        board.try_place(self.pos, self.player)
    }
}

/// The production AI player.
///
/// Owns one [`Searcher`] (and with it the position cache) for the rules it
/// was last asked about; a change of rules starts a fresh searcher.
pub struct AIEngine {
    config: SearchConfig,
    searcher: Option<Searcher>,
}

impl AIEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    #[must_use]
    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            config,
            searcher: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_time_budget(&mut self, time_ms: u64) {
        self.config.time_budget_ms = time_ms;
        self.searcher = None;
    }

    /// Drop the search cache
    pub fn clear_cache(&mut self) {
        if let Some(searcher) = self.searcher.as_mut() {
            searcher.clear_cache();
        }
    }

    /// Like [`AIEngine::get_move_with_stats`], but rejects a side that is
    /// not a player.
    pub fn try_get_move(
        &mut self,
        board: &Board,
        player: Mark,
        rules: &RuleConfig,
    ) -> Result<MoveResult, EngineError> {
        if !player.is_player() {
            return Err(EngineError::NotAPlayer(player));
        }
        Ok(self.get_move_with_stats(board, player, rules))
    }

    /// Compute a move and tie it to `board`; `None` on a full board.
    pub fn plan_move(
        &mut self,
        board: &Board,
        player: Mark,
        rules: &RuleConfig,
    ) -> Result<Option<PendingMove>, EngineError> {
        let result = self.try_get_move(board, player, rules)?;
        Ok(result
            .best_move
            .map(|pos| PendingMove::new(board, pos, player)))
    }

    /// Get the best move with the stage that found it.
    ///
    /// # Panics
    ///
    /// Panics if `player` is [`Mark::Empty`]; use
    /// [`AIEngine::try_get_move`] for unchecked input.
    #[must_use]
    pub fn get_move_with_stats(&mut self, board: &Board, player: Mark, rules: &RuleConfig) -> MoveResult {
        assert!(player.is_player(), "{player:?} cannot move");
        let start = Instant::now();
        if board.is_full() {
            return MoveResult::fast(None, 0, SearchType::Fallback, start);
        }
        let opponent = player.opponent();

        if let Some(pos) = find_winning_move(board, player, rules) {
            debug!("immediate win at {pos}");
            return MoveResult::fast(Some(pos), WIN_SCORE, SearchType::ImmediateWin, start);
        }

        if let Some(pos) = find_winning_move(board, opponent, rules) {
            debug!("blocking opponent win at {pos}");
            return MoveResult::fast(Some(pos), 0, SearchType::Block, start);
        }

        if let Some(pos) = self.opening_move(board) {
            debug!("opening book move {pos}");
            return MoveResult::fast(Some(pos), 0, SearchType::Opening, start);
        }

        if let Some(fork) = fork_moves(board, player, rules).into_iter().next() {
            debug!("fork at {} completing {:?}", fork.pos, fork.completions);
            return MoveResult::fast(Some(fork.pos), 0, SearchType::Fork, start);
        }

        if let Some(pos) = bounce_block(board, player, rules) {
            debug!("blocking reflected fork at {pos}");
            return MoveResult::fast(Some(pos), 0, SearchType::Bounce, start);
        }

        let searcher = self.searcher_for(rules);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| searcher.search_timed(board, player)));
        match outcome {
            Ok(result) if result.best_move.is_some_and(|p| board.is_empty(p)) => {
                MoveResult::from_search(result, start)
            }
            Ok(_) => {
                warn!("search produced no move, using fallback");
                MoveResult::fast(fallback_move(board, player, rules), 0, SearchType::Fallback, start)
            }
            Err(_) => {
                error!("search panicked, using fallback");
                self.searcher = None;
                MoveResult::fast(fallback_move(board, player, rules), 0, SearchType::Fallback, start)
            }
        }
    }

    fn searcher_for(&mut self, rules: &RuleConfig) -> &mut Searcher {
        if self.searcher.as_ref().map(|s| s.rules()) != Some(rules) {
            self.searcher = None;
        }
        self.searcher
            .get_or_insert_with(|| Searcher::new(*rules, self.config.clone()))
    }

    /// Book move for the first `opening_plies` plies: a free centre cell,
    /// else the free cell next to the mark closest to the centre.
    fn opening_move(&self, board: &Board) -> Option<Pos> {
        if board.mark_count() >= self.config.opening_plies {
            return None;
        }
        let center = board.center_cells();
        if let Some(&pos) = center.iter().find(|&&p| board.is_empty(p)) {
            return Some(pos);
        }

        let last = board.size() as i32 - 1;
        let centrality = |p: Pos| (2 * p.row as i32 - last).abs() + (2 * p.col as i32 - last).abs();
        let (anchor, _) = board.occupied().min_by_key(|&(p, _)| (centrality(p), p))?;
        board
            .empty_cells()
            .filter(|&p| p.chebyshev(anchor) == 1)
            .min_by_key(|&p| (centrality(p), p))
    }
}

impl Default for AIEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for AIEngine {
    fn get_move(&mut self, board: &Board, player: Mark, rules: &RuleConfig) -> Option<Pos> {
        self.get_move_with_stats(board, player, rules).best_move
    }
}

/// Start cell of an opponent fork whose completions run along a
/// reflected line through it.
fn bounce_block(board: &Board, player: Mark, rules: &RuleConfig) -> Option<Pos> {
    if !rules.bounce {
        return None;
    }
    let tracks = WinTracks::for_rules(board.size(), rules);
    fork_moves(board, player.opponent(), rules)
        .into_iter()
        .find(|fork| {
            fork.completions.iter().any(|&cell| {
                tracks
                    .containing_all(&[fork.pos, cell])
                    .iter()
                    .any(|t| matches!(t.kind, TrackKind::Bounce | TrackKind::DoubleBounce))
            })
        })
        .map(|fork| fork.pos)
}

/// Best heuristic threat cell, then a centre cell, then the first empty
/// cell in scan order.
fn fallback_move(board: &Board, player: Mark, rules: &RuleConfig) -> Option<Pos> {
    detect_threats(board, player, rules)
        .first()
        .map(|t| t.pos)
        .or_else(|| board.center_cells().into_iter().find(|&p| board.is_empty(p)))
        .or_else(|| board.empty_cells().next())
}
