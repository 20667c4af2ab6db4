//! Fakes shared by the engine and router tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lastword::{Engine, NameResolver, Notifier, NotifyError, PlaceholderNames};
use lastword_game::GameConfig;
use lastword_lexicon::{Dictionary, LexiconError};
use lastword_protocol::{ChatId, MessageRef, Notice, PlayerId};

// =========================================================================
// Notifier
// =========================================================================

/// Records every notice. Clones share the record.
#[derive(Clone, Default)]
pub struct Recorder {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl Recorder {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Text { text, .. } => Some(text),
                Notice::Reaction { .. } => None,
            })
            .collect()
    }

    pub fn reactions(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Reaction { emoji, .. } => Some(emoji),
                Notice::Text { .. } => None,
            })
            .collect()
    }

    /// Texts containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.texts().iter().filter(|t| t.contains(needle)).count()
    }

    pub fn last_text(&self) -> String {
        self.texts().pop().unwrap_or_default()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }
}

impl Notifier for Recorder {
    async fn send_text(
        &self,
        chat: &ChatId,
        text: &str,
        mentions: &[PlayerId],
    ) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .unwrap()
            .push(Notice::text(chat, text, mentions.to_vec()));
        Ok(())
    }

    async fn send_reaction(&self, origin: &MessageRef, emoji: &str) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .unwrap()
            .push(Notice::reaction(origin, emoji));
        Ok(())
    }
}

// =========================================================================
// Dictionaries
// =========================================================================

/// Accepts every word except those ending in one of `rejects`; counts
/// lookups. Suffixes keep it usable with random round letters.
#[derive(Clone, Default)]
pub struct Lenient {
    pub rejects: Vec<String>,
    pub calls: Arc<AtomicUsize>,
}

impl Lenient {
    pub fn rejecting(suffixes: &[&str]) -> Self {
        Self {
            rejects: suffixes.iter().map(|w| w.to_string()).collect(),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Dictionary for Lenient {
    async fn is_valid_word(&self, word: &str) -> Result<bool, LexiconError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(!self.rejects.iter().any(|r| word.ends_with(r.as_str())))
    }
}

/// Always fails; counts lookups.
#[derive(Clone, Default)]
pub struct Broken {
    pub calls: Arc<AtomicUsize>,
}

impl Dictionary for Broken {
    async fn is_valid_word(&self, _word: &str) -> Result<bool, LexiconError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LexiconError::Lookup("503 from upstream".into()))
    }
}

/// Answers `true`, but only after `delay`.
pub struct Slow {
    pub delay: Duration,
}

impl Dictionary for Slow {
    async fn is_valid_word(&self, _word: &str) -> Result<bool, LexiconError> {
        tokio::time::sleep(self.delay).await;
        Ok(true)
    }
}

/// Answers `true`; words ending in `suffix` take `delay` first.
pub struct SlowFor {
    pub suffix: String,
    pub delay: Duration,
}

impl Dictionary for SlowFor {
    async fn is_valid_word(&self, word: &str) -> Result<bool, LexiconError> {
        if word.ends_with(self.suffix.as_str()) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(true)
    }
}

// =========================================================================
// Name resolvers
// =========================================================================

/// Fails for every id.
pub struct Unreachable;

impl NameResolver for Unreachable {
    async fn resolve(&self, _player: &PlayerId) -> Result<String, NotifyError> {
        Err(NotifyError::NameLookup("profile service down".into()))
    }
}

/// Capitalizes the id, without an `@`.
pub struct Capitalized;

impl NameResolver for Capitalized {
    async fn resolve(&self, player: &PlayerId) -> Result<String, NotifyError> {
        let mut name = player.as_str().to_string();
        if let Some(first) = name.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Ok(name)
    }
}

/// Echoes the id, taking `delay` for `player` only.
pub struct SlowNames {
    pub player: PlayerId,
    pub delay: Duration,
}

impl NameResolver for SlowNames {
    async fn resolve(&self, player: &PlayerId) -> Result<String, NotifyError> {
        if *player == self.player {
            tokio::time::sleep(self.delay).await;
        }
        Ok(player.as_str().to_string())
    }
}

// =========================================================================
// Helpers
// =========================================================================

pub fn chat() -> ChatId {
    ChatId::new("group-1")
}

pub fn pid(id: &str) -> PlayerId {
    PlayerId::new(id)
}

pub fn engine<D: Dictionary>(dictionary: D) -> (Engine<Recorder, D>, Recorder) {
    let recorder = Recorder::default();
    let engine = Engine::new(GameConfig::default(), recorder.clone(), dictionary, PlaceholderNames);
    (engine, recorder)
}

/// A valid-looking word for `letter`: the letter followed by `tail`.
pub fn word(letter: char, tail: &str) -> String {
    format!("{}{tail}", letter.to_ascii_lowercase())
}

pub async fn secs(n: u64) {
    tokio::time::sleep(Duration::from_secs(n)).await;
}
