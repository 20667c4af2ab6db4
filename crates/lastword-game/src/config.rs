//! Game configuration and the session phase state machine.

use std::time::Duration;

use lastword_protocol::Difficulty;
use serde::{Deserialize, Serialize};

use crate::GameError;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Tunables shared by every session an engine runs.
///
/// The per-round time limit and word length tables are part of the rules
/// (see [`RoundParams`](crate::RoundParams)), not configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Difficulty for lobbies opened without one.
    pub default_difficulty: Difficulty,

    /// Minimum players required to start the game.
    pub min_players: usize,

    /// Grace period between a round's resolution and the next round's
    /// start, in milliseconds.
    pub next_round_delay_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_difficulty: Difficulty::Medium,
            min_players: 2,
            next_round_delay_ms: 3_000,
        }
    }
}

impl GameConfig {
    /// An elimination game needs someone to eliminate and someone to win.
    pub const MIN_PLAYERS_FLOOR: usize = 2;

    /// Parses a JSON document. Missing fields take their defaults.
    ///
    /// ```
    /// use lastword_game::GameConfig;
    ///
    /// let config = GameConfig::from_json(r#"{ "default_difficulty": "hard" }"#).unwrap();
    /// assert_eq!(config.min_players, 2);
    /// ```
    pub fn from_json(text: &str) -> Result<Self, GameError> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.validated())
    }

    /// Clamps out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.min_players < Self::MIN_PLAYERS_FLOOR {
            tracing::warn!(
                min_players = self.min_players,
                floor = Self::MIN_PLAYERS_FLOOR,
                "min_players below floor, clamping"
            );
            self.min_players = Self::MIN_PLAYERS_FLOOR;
        }
        self
    }

    pub fn next_round_delay(&self) -> Duration {
        Duration::from_millis(self.next_round_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// ```text
///                 ┌──────────────── end / forfeit ────────────────┐
///                 │                                                ▼
/// Lobby ──start──→ RoundActive ──timeout | all answered──→ RoundResolving ──→ Ended
///   │                  ▲                                        │
///   │                  └──────── grace delay (≥ 2 left) ────────┘
///   └──────────────────────────── end ────────────────────────────────────────→ Ended
/// ```
///
/// `Ended` is terminal and transient: a session that reaches it is
/// removed from the registry straight away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Lobby,
    RoundActive,
    RoundResolving,
    Ended,
}

impl Phase {
    /// Returns `true` if players may still join.
    pub fn is_lobby(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` once the first round has started and until the end.
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::RoundActive | Self::RoundResolving)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Returns `true` if moving from `self` to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Lobby, Self::RoundActive)
                | (Self::Lobby, Self::Ended)
                | (Self::RoundActive, Self::RoundResolving)
                | (Self::RoundActive, Self::Ended)
                | (Self::RoundResolving, Self::RoundActive)
                | (Self::RoundResolving, Self::Ended)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::RoundActive => write!(f, "RoundActive"),
            Self::RoundResolving => write!(f, "RoundResolving"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}
