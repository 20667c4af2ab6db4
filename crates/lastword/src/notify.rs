//! Hooks into the host chat application.
//!
//! Lastword doesn't send messages or look up user profiles itself. The
//! host implements [`Notifier`] (post text, react to a message) and,
//! optionally, [`NameResolver`] (turn a user id into a display name).
//! Both may fail; neither failure ever stops a game.

use lastword_protocol::{ChatId, MessageRef, Notice, PlayerId};

use crate::NotifyError;

/// Delivers notices to a chat.
///
/// # Example
///
/// ```rust
/// use lastword::{Notifier, NotifyError};
/// use lastword_protocol::{ChatId, MessageRef, PlayerId};
///
/// /// Prints everything to stdout.
/// struct Stdout;
///
/// impl Notifier for Stdout {
///     async fn send_text(
///         &self,
///         chat: &ChatId,
///         text: &str,
///         _mentions: &[PlayerId],
///     ) -> Result<(), NotifyError> {
///         println!("[{chat}] {text}");
///         Ok(())
///     }
///
///     async fn send_reaction(&self, origin: &MessageRef, emoji: &str) -> Result<(), NotifyError> {
///         println!("[{}] {emoji} on {}", origin.chat, origin.id);
///         Ok(())
///     }
/// }
/// ```
pub trait Notifier: Send + Sync + 'static {
    /// Posts `text` to `chat`, highlighting `mentions`.
    fn send_text(
        &self,
        chat: &ChatId,
        text: &str,
        mentions: &[PlayerId],
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;

    /// Reacts to an inbound message.
    fn send_reaction(
        &self,
        origin: &MessageRef,
        emoji: &str,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// Resolves a player's display name for mentions.
pub trait NameResolver: Send + Sync + 'static {
    /// Returns the name to show for `player`, with or without a leading `@`.
    fn resolve(
        &self,
        player: &PlayerId,
    ) -> impl std::future::Future<Output = Result<String, NotifyError>> + Send;
}

/// Names every player after their id, e.g. `+15551234@s.net` → `@15551234`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderNames;

impl NameResolver for PlaceholderNames {
    async fn resolve(&self, player: &PlayerId) -> Result<String, NotifyError> {
        Ok(player.placeholder_name())
    }
}

/// Sends `notices` in order. Failures are logged and skipped.
pub(crate) async fn deliver<N: Notifier>(notifier: &N, notices: Vec<Notice>) {
    for notice in notices {
        let result = match &notice {
            Notice::Text {
                chat,
                text,
                mentions,
            } => notifier.send_text(chat, text, mentions).await,
            Notice::Reaction { origin, emoji } => notifier.send_reaction(origin, emoji).await,
        };
        if let Err(e) = result {
            tracing::warn!(chat_id = %notice.chat(), error = %e, "failed to deliver notice");
        }
    }
}

/// Resolves a display name, falling back to the id's placeholder.
pub(crate) async fn display_name<R: NameResolver>(names: &R, player: &PlayerId) -> String {
    match names.resolve(player).await {
        Ok(name) => {
            let name = name.trim();
            if name.is_empty() || name == "@" {
                player.placeholder_name()
            } else if name.starts_with('@') {
                name.to_string()
            } else {
                format!("@{name}")
            }
        }
        Err(e) => {
            tracing::warn!(player_id = %player, error = %e, "name lookup failed, using placeholder");
            player.placeholder_name()
        }
    }
}
