//! Core protocol types shared by every Lastword layer.
//!
//! Identifiers are opaque strings handed to us by the chat application
//! (for example `12345@s.whatsapp.net` or `987-654@g.us`). We never parse
//! them except to derive a fallback display name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one chat room. At most one game session exists per chat.
///
/// A "newtype wrapper" around the chat application's own identifier, so
/// a `ChatId` can never be passed where a [`PlayerId`] is expected.
///
/// `#[serde(transparent)]` serializes it as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A mention-style name derived from the id alone.
    ///
    /// Used whenever the real display name can't be resolved: the part
    /// before `@` with any leading `+` removed, prefixed with `@`.
    ///
    /// ```
    /// use lastword_protocol::PlayerId;
    ///
    /// let id = PlayerId::new("+4915112345@s.whatsapp.net");
    /// assert_eq!(id.placeholder_name(), "@4915112345");
    /// ```
    pub fn placeholder_name(&self) -> String {
        let local = self.0.split('@').next().unwrap_or_default();
        format!("@{}", local.trim_start_matches('+'))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Points at the inbound chat message a command arrived in.
///
/// Reactions (✅, ❌, 🎮) are attached to this message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat: ChatId,
    pub id: String,
}

impl MessageRef {
    pub fn new(chat: ChatId, id: impl Into<String>) -> Self {
        Self {
            chat,
            id: id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// How punishing a game is. Fixed in the lobby, constant for the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ProtocolError::UnknownDifficulty(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Notice — what the chat should show
// ---------------------------------------------------------------------------

/// An outbound notification request.
///
/// The engine never talks to the chat directly; it produces notices and
/// hands them to a `Notifier`. Delivery is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    /// Post a text message, highlighting the mentioned players.
    Text {
        chat: ChatId,
        text: String,
        mentions: Vec<PlayerId>,
    },

    /// React to an inbound message with an emoji.
    Reaction { origin: MessageRef, emoji: String },
}

impl Notice {
    pub fn text(chat: &ChatId, text: impl Into<String>, mentions: Vec<PlayerId>) -> Self {
        Self::Text {
            chat: chat.clone(),
            text: text.into(),
            mentions,
        }
    }

    pub fn reaction(origin: &MessageRef, emoji: impl Into<String>) -> Self {
        Self::Reaction {
            origin: origin.clone(),
            emoji: emoji.into(),
        }
    }

    /// The chat this notice is destined for.
    pub fn chat(&self) -> &ChatId {
        match self {
            Self::Text { chat, .. } => chat,
            Self::Reaction { origin, .. } => &origin.chat,
        }
    }
}
