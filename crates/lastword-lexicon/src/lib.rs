//! Word legality for Lastword.
//!
//! This crate answers one question: "is this a real word?"
//!
//! 1. **The oracle** — an external source of truth ([`Dictionary`] trait),
//!    typically a network API or a bundled word list ([`WordList`]).
//! 2. **The cache** — [`WordCache`] memoizes the oracle's answers for the
//!    lifetime of the process, shared by every chat.
//!
//! # How it fits in the stack
//!
//! ```text
//! Engine (above)  ← asks the cache during word submission
//!     ↕
//! Lexicon (this crate)  ← cache + oracle
//!     ↕
//! Dictionary implementation (outside)  ← network lookup, word list, ...
//! ```

#![allow(async_fn_in_trait)]

mod cache;
mod dictionary;
mod error;

pub use cache::WordCache;
pub use dictionary::{Dictionary, WordList};
pub use error::LexiconError;
