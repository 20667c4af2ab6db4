//! Game rules and session state for Lastword.
//!
//! Each chat runs at most one elimination word game. This crate owns the
//! game's data and rules but no clocks and no I/O: timers, dictionaries,
//! and chat notifications are wired together by the `lastword` engine.
//!
//! # Key types
//!
//! - [`Session`] — one chat's game, lobby through end
//! - [`Phase`] — the session's lifecycle state machine
//! - [`RoundParams`] — time limit and minimum word length per round
//! - [`validator`] — the ordered submission checks
//! - [`SessionRegistry`] — chat id → live session
//! - [`GameConfig`] — tunables (default difficulty, grace delay, ...)

mod config;
mod error;
mod registry;
mod round;
mod session;
pub mod validator;

pub use config::{GameConfig, Phase};
pub use error::{GameError, Rejection};
pub use registry::{SessionHandle, SessionRegistry};
pub use round::{RoundParams, random_letter};
pub use session::{Accepted, Forfeit, Player, RoundOutcome, Session, Verdict};
