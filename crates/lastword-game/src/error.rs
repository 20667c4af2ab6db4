//! Error types for the game layer.
//!
//! Two very different kinds of "no":
//!
//! - [`Rejection`] — a player asked for something the rules don't allow.
//!   Expected, harmless, shown in the chat, never logged as an error.
//! - [`GameError::Invariant`] — the engine itself broke a rule (a round
//!   resolved twice, an impossible phase transition). Reported to
//!   operators, never to players.

use crate::Phase;

/// A user-facing refusal. The `Display` text is written for the chat.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("there is no word game lobby open")]
    NoLobby,

    #[error("you're already in the lobby")]
    AlreadyJoined,

    #[error("at least {needed} players are needed to start")]
    NotEnoughPlayers { needed: usize },

    #[error("a word game is already active")]
    SessionAlreadyActive,

    /// No session, a session still in its lobby, or a round that already
    /// closed.
    #[error("there is no active word game round")]
    NoActiveRound,

    #[error("you're not in this game")]
    NotAPlayer,

    #[error("you already submitted a word this round")]
    AlreadySubmitted,

    #[error("a word must be letters only")]
    InvalidFormat,

    #[error("the word must be at least {min} letters long")]
    TooShort { min: usize },

    #[error("the word must start with \"{letter}\"")]
    WrongLetter { letter: char },

    #[error("\"{word}\" is not a valid dictionary word")]
    NotAWord { word: String },

    #[error("\"{word}\" has already been used in this game")]
    AlreadyUsedInGame { word: String },

    #[error("\"{word}\" has already been submitted in this round")]
    AlreadyUsedInRound { word: String },
}

/// Any failure from a game operation.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The player's request was refused by the rules.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Internal consistency was violated. Always a bug.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// An impossible lifecycle transition was attempted.
    #[error("invalid phase transition {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },

    /// A configuration document could not be parsed.
    #[error("invalid game config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl GameError {
    /// The rejection inside, if this is a user-facing refusal.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(r) => Some(r),
            _ => None,
        }
    }

    /// `true` for refusals that belong in the chat rather than the logs.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
