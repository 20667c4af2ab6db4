//! The dictionary oracle hook.
//!
//! Lastword doesn't ship a dictionary of its own. Hosts plug in whatever
//! source of truth they have (a REST API, a spell checker, a word list on
//! disk) by implementing [`Dictionary`]. The engine only ever sees the
//! trait, so tests use a [`WordList`] or a hand-written fake.

use std::collections::HashSet;

use crate::LexiconError;

/// Decides whether a lowercase word is legal.
///
/// # Trait bounds
///
/// - `Send + Sync` → one dictionary is shared by every chat's tasks.
/// - `'static` → it lives as long as the engine.
///
/// # Example
///
/// ```rust
/// use lastword_lexicon::{Dictionary, LexiconError};
///
/// /// Accepts every word. Handy for local play-testing.
/// struct AnyWord;
///
/// impl Dictionary for AnyWord {
///     async fn is_valid_word(&self, _word: &str) -> Result<bool, LexiconError> {
///         Ok(true)
///     }
/// }
/// ```
pub trait Dictionary: Send + Sync + 'static {
    /// Looks up `word`, which the caller has already lowercased.
    ///
    /// # Returns
    /// - `Ok(true)` / `Ok(false)` — a definitive answer, safe to cache
    /// - `Err(_)` — the oracle failed; the answer must not be cached
    fn is_valid_word(
        &self,
        word: &str,
    ) -> impl std::future::Future<Output = Result<bool, LexiconError>> + Send;
}

/// A fixed, in-memory word list.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: HashSet<String>,
}

impl WordList {
    /// Builds a list from any iterator of words. Entries are lowercased.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Parses one word per line. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Self {
        Self::from_words(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Dictionary for WordList {
    async fn is_valid_word(&self, word: &str) -> Result<bool, LexiconError> {
        Ok(self.contains(word))
    }
}
