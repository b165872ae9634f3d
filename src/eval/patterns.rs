//! Pattern values for move ordering and leaf evaluation
//!
//! Scores are keyed by the length of a run and how many of its ends are
//! open. They are deliberately small: a real win is scored by the search
//! (`1000 + depth`), never by this table.

/// Pattern scores
pub struct PatternScore;

impl PatternScore {
    /// Five or more with no disqualifying gap
    pub const WIN: i32 = 1_000;
    /// Five or more, but the missing-teeth rule voids it
    pub const BROKEN_FIVE: i32 = 50;

    /// Four, both ends open
    pub const OPEN_FOUR: i32 = 200;
    /// Four, one end open
    pub const CLOSED_FOUR: i32 = 110;

    /// Three, both ends open
    pub const OPEN_THREE: i32 = 60;
    /// Open three with room beyond each open end
    pub const EXTENDED_THREE: i32 = 90;
    /// Three, one end open
    pub const CLOSED_THREE: i32 = 15;

    /// Two, both ends open
    pub const OPEN_TWO: i32 = 6;

    /// One move created two or more threats at once
    pub const FORK: i32 = 150;
}

/// Value of a run by `(count, open_ends)`.
///
/// `extended` only matters for open threes. Runs of five or more are
/// scored by the caller, which knows whether the run is valid.
#[must_use]
pub fn pattern_value(count: usize, open_ends: u8, extended: bool) -> i32 {
    match (count, open_ends) {
        (5.., _) => PatternScore::WIN,
        (4, 2) => PatternScore::OPEN_FOUR,
        (4, 1) => PatternScore::CLOSED_FOUR,
        (3, 2) if extended => PatternScore::EXTENDED_THREE,
        (3, 2) => PatternScore::OPEN_THREE,
        (3, 1) => PatternScore::CLOSED_THREE,
        (2, 2) => PatternScore::OPEN_TWO,
        _ => 0,
    }
}

/// Apply the diagonal multiplier (x1.1, x1.3 in the early game).
#[inline]
#[must_use]
pub fn direction_weighted(value: i32, dir: (i32, i32), early: bool) -> i32 {
    if dir.0 == 0 || dir.1 == 0 {
        value
    } else if early {
        value * 13 / 10
    } else {
        value * 11 / 10
    }
}

/// Scale an opponent contribution so blocking outranks building.
#[inline]
#[must_use]
pub fn opponent_weighted(value: i32) -> i32 {
    value * 13 / 10
}

/// A run that counts as a threat for fork detection
#[inline]
#[must_use]
pub fn is_threat(count: usize, open_ends: u8) -> bool {
    (count >= 4 && open_ends >= 1) || (count == 3 && open_ends == 2)
}
