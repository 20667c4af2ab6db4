//! Submission checks.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. a round is open
//! 2. the sender is a player
//! 3. the sender hasn't answered yet
//! 4. letters only
//! 5. long enough
//! 6. right first letter
//! 7. in the dictionary
//! 8. not used earlier in the game
//! 9. not used earlier in the round
//!
//! The dictionary lookup is slow and happens outside the session lock, so
//! the engine runs [`check_shape`] (1–6) first, looks the word up, and then
//! runs [`validate`] (1–9) against the session as it is *after* the lookup.

use lastword_protocol::PlayerId;

use crate::{Phase, Rejection, Session};

/// Runs the checks that don't need the dictionary.
///
/// Returns the lowercased word on success.
pub fn check_shape(
    session: Option<&Session>,
    player: &PlayerId,
    raw: &str,
) -> Result<String, Rejection> {
    let session = session
        .filter(|s| s.phase() == Phase::RoundActive)
        .ok_or(Rejection::NoActiveRound)?;
    let (Some(letter), Some(params)) = (session.current_letter(), session.round_params()) else {
        return Err(Rejection::NoActiveRound);
    };

    if !session.is_player(player) {
        return Err(Rejection::NotAPlayer);
    }
    if session.has_responded(player) {
        return Err(Rejection::AlreadySubmitted);
    }
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Rejection::InvalidFormat);
    }
    // ASCII only from here, so bytes == letters.
    if raw.len() < params.min_word_length {
        return Err(Rejection::TooShort {
            min: params.min_word_length,
        });
    }
    let starts_right = raw
        .chars()
        .next()
        .is_some_and(|first| first.eq_ignore_ascii_case(&letter));
    if !starts_right {
        return Err(Rejection::WrongLetter { letter });
    }

    Ok(raw.to_ascii_lowercase())
}

/// Runs every check, given the dictionary's verdict on the word.
///
/// Returns the lowercased word on success. Rejections that name the word
/// carry it as the player typed it.
pub fn validate(
    session: Option<&Session>,
    player: &PlayerId,
    raw: &str,
    in_dictionary: bool,
) -> Result<String, Rejection> {
    let Some(session) = session else {
        return Err(Rejection::NoActiveRound);
    };
    let lower = check_shape(Some(session), player, raw)?;

    if !in_dictionary {
        return Err(Rejection::NotAWord { word: raw.into() });
    }
    if session.used_in_game(&lower) {
        return Err(Rejection::AlreadyUsedInGame { word: raw.into() });
    }
    if session.used_in_round(&lower) {
        return Err(Rejection::AlreadyUsedInRound { word: raw.into() });
    }
    Ok(lower)
}
