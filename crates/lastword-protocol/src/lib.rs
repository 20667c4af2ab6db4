//! Shared vocabulary for Lastword.
//!
//! This crate defines the "language" the game engine and its host chat
//! application speak:
//!
//! - **Types** ([`ChatId`], [`PlayerId`], [`MessageRef`], [`Difficulty`]) —
//!   identifiers and settings shared by every layer.
//! - **Commands** ([`Command`], [`split_command`]) — how raw chat text
//!   becomes a word-game command.
//! - **Notices** ([`Notice`]) — what the engine asks the chat to show.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while parsing.
//!
//! # Architecture
//!
//! The protocol layer sits between the chat transport (not part of this
//! workspace) and the game layer. It doesn't know about sessions, rounds,
//! or timers.
//!
//! ```text
//! Chat text → Protocol (Command) → Game / Engine → Protocol (Notice) → Chat
//! ```

mod command;
mod error;
mod types;

pub use command::{Command, split_command};
pub use error::ProtocolError;
pub use types::{ChatId, Difficulty, MessageRef, Notice, PlayerId};
