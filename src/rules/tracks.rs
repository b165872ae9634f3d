//! Win track enumeration
//!
//! A track is a fixed 6-cell window that could hold a winning line:
//! straight, wrapped across an edge, or reflected off one or two edges.
//! Tracks depend only on board geometry, so each (size, bounce) pair is
//! generated once and shared behind an `Arc`.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::board::{Board, Mark, Pos, TRACK_LEN};
use crate::config::RuleConfig;

use super::geometry::{
    bounce_step, interior_gap, missing_teeth_blocks, walk_line, wrap_line_gap, DIAGONALS,
    LINE_DIRECTIONS, MAX_REFLECTIONS,
};

/// How a track's cells are connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// In-bounds straight line
    Straight,
    /// Straight line continuing across opposite edges
    Wrap,
    /// Diagonal reflected once
    Bounce,
    /// Diagonal reflected twice
    DoubleBounce,
}

impl TrackKind {
    #[inline]
    pub fn enabled(self, rules: &RuleConfig) -> bool {
        match self {
            TrackKind::Straight => true,
            TrackKind::Wrap => rules.wrap,
            TrackKind::Bounce | TrackKind::DoubleBounce => rules.bounce,
        }
    }
}

/// One candidate winning window, cells in line order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub cells: [Pos; TRACK_LEN],
    pub kind: TrackKind,
}

impl Track {
    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        self.cells.contains(&pos)
    }

    /// (player marks, empty cells, opponent marks)
    pub fn tally(&self, board: &Board, player: Mark) -> (usize, usize, usize) {
        let mut mine = 0;
        let mut empty = 0;
        let mut theirs = 0;
        for &pos in &self.cells {
            match board.get(pos) {
                Mark::Empty => empty += 1,
                m if m == player => mine += 1,
                _ => theirs += 1,
            }
        }
        (mine, empty, theirs)
    }

    /// Whether `player` holding the track's own cells plus `extra` is
    /// ruled out by a gap.
    ///
    /// Reflecting tracks must always be unbroken. Straight and wrap
    /// tracks follow the missing-teeth rule.
    pub fn blocked_for(&self, board: &Board, player: Mark, extra: Pos, rules: &RuleConfig) -> bool {
        let owned: Vec<bool> = self
            .cells
            .iter()
            .map(|&p| p == extra || board.get(p) == player)
            .collect();
        match self.kind {
            TrackKind::Bounce | TrackKind::DoubleBounce => interior_gap(&owned),
            TrackKind::Straight | TrackKind::Wrap if !rules.missing_teeth => false,
            TrackKind::Straight => {
                let cells = self.owned_cells(&owned);
                missing_teeth_blocks(true, interior_gap(&owned), &cells, board.size())
            }
            TrackKind::Wrap => {
                let cells = self.owned_cells(&owned);
                missing_teeth_blocks(true, wrap_line_gap(&owned, &cells), &cells, board.size())
            }
        }
    }

    fn owned_cells(&self, owned: &[bool]) -> Vec<Pos> {
        self.cells
            .iter()
            .zip(owned)
            .filter(|(_, owned)| **owned)
            .map(|(&p, _)| p)
            .collect()
    }

    fn key(&self) -> [Pos; TRACK_LEN] {
        let mut key = self.cells;
        key.sort_unstable();
        key
    }
}

/// Every track on a board of one size, with a per-cell index
#[derive(Debug)]
pub struct WinTracks {
    size: usize,
    tracks: Vec<Track>,
    by_cell: Vec<Vec<usize>>,
}

static TRACK_CACHE: Lazy<Mutex<FxHashMap<(usize, bool), Arc<WinTracks>>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

impl WinTracks {
    /// Shared tracks for a board size, generated on first use.
    pub fn for_geometry(size: usize, include_bounce: bool) -> Arc<WinTracks> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still usable.
        let mut cache = TRACK_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            cache
                .entry((size, include_bounce))
                .or_insert_with(|| Arc::new(Self::generate(size, include_bounce))),
        )
    }

    /// Shared tracks for a board and rule set. Use [`WinTracks::enabled`] to
    /// skip kinds the rules switch off.
    pub fn for_rules(size: usize, rules: &RuleConfig) -> Arc<WinTracks> {
        Self::for_geometry(size, rules.bounce)
    }

    /// Enumerate all tracks. Straight and wrap tracks are always produced;
    /// bounce tracks only when asked for.
    pub fn generate(size: usize, include_bounce: bool) -> Self {
        let mut seen: FxHashSet<[Pos; TRACK_LEN]> = FxHashSet::default();
        let mut tracks = Vec::new();
        let mut push = |track: Track| {
            if seen.insert(track.key()) {
                tracks.push(track);
            }
        };

        for idx in 0..size * size {
            let start = Pos::from_index(idx, size);
            for &dir in &LINE_DIRECTIONS {
                if let Some(cells) = walk_line(size, start, dir, TRACK_LEN, false) {
                    push(Track {
                        cells: to_array(&cells),
                        kind: TrackKind::Straight,
                    });
                } else if let Some(cells) = walk_line(size, start, dir, TRACK_LEN, true) {
                    push(Track {
                        cells: to_array(&cells),
                        kind: TrackKind::Wrap,
                    });
                }
            }
        }

        if include_bounce {
            for idx in 0..size * size {
                let start = Pos::from_index(idx, size);
                for &dir in &DIAGONALS {
                    if let Some(track) = bounce_track(size, start, dir) {
                        push(track);
                    }
                }
            }
        }

        let mut by_cell = vec![Vec::new(); size * size];
        for (i, track) in tracks.iter().enumerate() {
            for pos in &track.cells {
                by_cell[pos.to_index(size)].push(i);
            }
        }

        Self {
            size,
            tracks,
            by_cell,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn all(&self) -> &[Track] {
        &self.tracks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks whose kind the rules allow
    pub fn enabled<'a>(&'a self, rules: &'a RuleConfig) -> impl Iterator<Item = &'a Track> + 'a {
        self.tracks.iter().filter(move |t| t.kind.enabled(rules))
    }

    /// Tracks passing through a cell
    pub fn containing(&self, pos: Pos) -> impl Iterator<Item = &Track> + '_ {
        self.by_cell[pos.to_index(self.size)]
            .iter()
            .map(move |&i| &self.tracks[i])
    }

    /// Tracks passing through every given cell
    pub fn containing_all(&self, cells: &[Pos]) -> Vec<&Track> {
        let Some((&first, rest)) = cells.split_first() else {
            return Vec::new();
        };
        self.containing(first)
            .filter(|t| rest.iter().all(|&p| t.contains(p)))
            .collect()
    }
}

fn to_array(cells: &[Pos]) -> [Pos; TRACK_LEN] {
    let mut out = [Pos::new(0, 0); TRACK_LEN];
    out.copy_from_slice(&cells[..TRACK_LEN]);
    out
}

/// Reflecting diagonal walk of one track length from `start`.
///
/// Uses the same stepping rule as `find_bounce_pattern`, so a filled
/// bounce track is always found by the rule engine. Walks that reflect
/// on their first step, never reflect, reflect more than twice, or
/// revisit a cell are not bounce tracks.
fn bounce_track(size: usize, start: Pos, dir: (i32, i32)) -> Option<Track> {
    let mut cells = Vec::with_capacity(TRACK_LEN);
    cells.push(start);
    let mut reflections = 0usize;
    let mut pos = start;
    let mut dir = dir;

    for i in 0..TRACK_LEN - 1 {
        let step = bounce_step(size, pos, dir)?;
        if step.reflected {
            if i == 0 {
                return None;
            }
            reflections += 1;
            if reflections > MAX_REFLECTIONS {
                return None;
            }
        }
        if cells.contains(&step.pos) {
            return None;
        }
        cells.push(step.pos);
        pos = step.pos;
        dir = step.dir;
    }

    let kind = match reflections {
        0 => return None,
        1 => TrackKind::Bounce,
        _ => TrackKind::DoubleBounce,
    };
    Some(Track {
        cells: to_array(&cells),
        kind,
    })
}
