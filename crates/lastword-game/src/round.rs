//! Per-round parameters.
//!
//! Later rounds are harder: the fuse gets shorter and words get longer.
//! Everything here is a pure function of `(difficulty, round)` so it can be
//! tested without running a game.

use std::time::Duration;

use lastword_protocol::Difficulty;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// No round is ever shorter than this.
pub(crate) const TIME_FLOOR_SECS: u64 = 15;

/// Minimum word length in rounds 1 and 2.
pub(crate) const BASE_MIN_WORD_LENGTH: usize = 3;

fn base_time_secs(difficulty: Difficulty) -> u64 {
    match difficulty {
        Difficulty::Easy => 45,
        Difficulty::Medium => 40,
        Difficulty::Hard => 35,
    }
}

fn decrement_secs(difficulty: Difficulty) -> u64 {
    match difficulty {
        Difficulty::Easy => 3,
        Difficulty::Medium => 4,
        Difficulty::Hard => 5,
    }
}

/// The derived rules for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundParams {
    /// 1-based round number.
    pub round: u32,
    pub time_limit: Duration,
    pub min_word_length: usize,
}

impl RoundParams {
    /// Derives round `round`'s parameters. Round 0 is treated as round 1.
    ///
    /// ```
    /// use std::time::Duration;
    /// use lastword_game::RoundParams;
    /// use lastword_protocol::Difficulty;
    ///
    /// let third = RoundParams::derive(Difficulty::Easy, 3);
    /// assert_eq!(third.time_limit, Duration::from_secs(39));
    /// assert_eq!(third.min_word_length, 4);
    /// ```
    pub fn derive(difficulty: Difficulty, round: u32) -> Self {
        let round = round.max(1);
        let elapsed = u64::from(round - 1);
        let shrink = elapsed.saturating_mul(decrement_secs(difficulty));
        let secs = base_time_secs(difficulty)
            .saturating_sub(shrink)
            .max(TIME_FLOOR_SECS);
        Self {
            round,
            time_limit: Duration::from_secs(secs),
            min_word_length: BASE_MIN_WORD_LENGTH + (round as usize - 1) / 2,
        }
    }

    pub fn time_limit_secs(&self) -> u64 {
        self.time_limit.as_secs()
    }
}

/// Picks a round letter uniformly from `A`–`Z`.
pub fn random_letter() -> char {
    let offset = rand::rng().random_range(0..26u8);
    char::from(b'A' + offset)
}
