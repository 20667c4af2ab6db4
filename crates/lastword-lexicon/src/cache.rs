//! The word cache: remembers every definitive dictionary answer.
//!
//! Dictionary oracles are usually slow (network round-trips) and their
//! answers never change, so each lowercase word is looked up at most once
//! per process. The cache is shared by every chat.
//!
//! # Concurrency note
//!
//! The map sits behind a `tokio::sync::RwLock`. Lookups for different
//! words from different chats proceed in parallel; the lock is never held
//! while the oracle is being consulted, so a slow lookup doesn't block
//! cache hits. Two chats missing on the same word at the same moment may
//! both ask the oracle; the second insert simply overwrites the first
//! with the same answer.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{Dictionary, LexiconError};

/// Memoizing front for a [`Dictionary`].
pub struct WordCache<D> {
    dictionary: D,
    /// Lowercase word → definitive answer. Failed lookups are never stored.
    entries: RwLock<HashMap<String, bool>>,
}

impl<D: Dictionary> WordCache<D> {
    pub fn new(dictionary: D) -> Self {
        Self {
            dictionary,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns whether `word` is legal, consulting the oracle on a miss.
    ///
    /// The word is lowercased before lookup, so `Cat`, `CAT` and `cat`
    /// share one cache entry.
    ///
    /// # Errors
    /// Propagates the oracle's [`LexiconError`]. Nothing is cached in that
    /// case, so the next submission of the same word asks again.
    pub async fn is_valid(&self, word: &str) -> Result<bool, LexiconError> {
        let key = word.to_lowercase();

        if let Some(&known) = self.entries.read().await.get(&key) {
            tracing::trace!(word = %key, valid = known, "word cache hit");
            return Ok(known);
        }

        let valid = self.dictionary.is_valid_word(&key).await?;
        tracing::debug!(word = %key, valid, "dictionary answered, caching");
        self.entries.write().await.insert(key, valid);
        Ok(valid)
    }

    /// The cached answer for `word`, without consulting the oracle.
    pub async fn cached(&self, word: &str) -> Option<bool> {
        self.entries.read().await.get(&word.to_lowercase()).copied()
    }

    /// Number of words with a cached answer.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// The wrapped oracle.
    pub fn dictionary(&self) -> &D {
        &self.dictionary
    }
}
