//! # Lastword
//!
//! An elimination word game for group chats.
//!
//! Players join a lobby, then each round everyone must post a word that
//! starts with the round's letter before the clock runs out. Whoever
//! doesn't answer in time is out; the last player standing wins. Rounds
//! get shorter and words get longer as the game goes on.
//!
//! The host chat application plugs in three collaborators:
//!
//! - a [`Notifier`] that posts texts and reactions,
//! - a [`Dictionary`](lastword_lexicon::Dictionary) that knows real words,
//! - optionally a [`NameResolver`] for nice mentions.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lastword::{CommandRouter, EngineBuilder, Incoming, PlaceholderNames};
//! use lastword_lexicon::WordList;
//!
//! let engine = EngineBuilder::new().build(my_notifier, WordList::parse(&words), PlaceholderNames);
//! let router = CommandRouter::new(engine);
//!
//! // For every chat message:
//! router.handle(&Incoming::new(origin, sender, text)).await;
//! ```

mod engine;
mod error;
mod messages;
mod notify;
mod router;

pub use engine::{Engine, EngineBuilder};
pub use error::{LastwordError, NotifyError};
pub use notify::{NameResolver, Notifier, PlaceholderNames};
pub use router::{CommandRouter, Incoming, REACT_GAME, REACT_OK, REACT_REJECTED, RouterConfig};
