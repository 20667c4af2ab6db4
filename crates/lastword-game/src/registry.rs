//! Chat id → live session.
//!
//! The registry lock only guards the map. Session state lives behind each
//! session's own mutex so unrelated chats never wait on each other.
//!
//! Lock order: take the registry lock first, or a session lock alone.
//! Never ask the registry for anything while holding a session lock.

use std::collections::HashMap;
use std::sync::Arc;

use lastword_protocol::ChatId;
use tokio::sync::Mutex;

use crate::{Rejection, Session};

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Tracks the single live session of every chat.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ChatId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chat's session handle, if any.
    pub async fn get(&self, chat: &ChatId) -> Option<SessionHandle> {
        self.sessions.lock().await.get(chat).cloned()
    }

    /// Installs `session` for its chat.
    ///
    /// A lobby or an ended session already registered for the chat is
    /// replaced. A game in progress is not.
    ///
    /// A replaced lobby is closed before it is dropped, so callers still
    /// holding its handle see it as ended.
    ///
    /// # Errors
    /// [`Rejection::SessionAlreadyActive`] if the chat is mid-game.
    pub async fn create(&self, session: Session) -> Result<SessionHandle, Rejection> {
        let chat = session.chat_id().clone();
        let mut sessions = self.sessions.lock().await;

        if let Some(existing) = sessions.get(&chat) {
            // Lock order: registry, then session. Nothing here calls back
            // into the registry.
            let mut existing = existing.lock().await;
            let phase = existing.phase();
            if phase.is_in_game() {
                return Err(Rejection::SessionAlreadyActive);
            }
            if let Err(e) = existing.close() {
                tracing::error!(chat_id = %chat, %phase, error = %e, "failed to close replaced session");
            }
            tracing::debug!(chat_id = %chat, %phase, "replacing session");
        }

        let handle = Arc::new(Mutex::new(session));
        sessions.insert(chat.clone(), Arc::clone(&handle));
        tracing::info!(chat_id = %chat, active = sessions.len(), "session created");
        Ok(handle)
    }

    /// Removes whatever session the chat has.
    pub async fn remove(&self, chat: &ChatId) -> Option<SessionHandle> {
        let removed = self.sessions.lock().await.remove(chat);
        if removed.is_some() {
            tracing::info!(chat_id = %chat, "session removed");
        }
        removed
    }

    /// Removes the chat's session only if it is still `handle`.
    ///
    /// Cleanup after a game ends uses this so it can't evict a newer
    /// session that took the chat in the meantime.
    pub async fn remove_if_same(&self, chat: &ChatId, handle: &SessionHandle) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(chat) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                sessions.remove(chat);
                tracing::info!(chat_id = %chat, "session removed");
                true
            }
            _ => false,
        }
    }

    /// Removes every session, returning their handles.
    pub async fn drain(&self) -> Vec<(ChatId, SessionHandle)> {
        self.sessions.lock().await.drain().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    pub async fn chat_ids(&self) -> Vec<ChatId> {
        self.sessions.lock().await.keys().cloned().collect()
    }
}
