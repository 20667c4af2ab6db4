//! Turns chat messages into engine calls and replies to the sender.

use lastword_lexicon::Dictionary;
use lastword_protocol::{ChatId, Command, MessageRef, Notice, PlayerId, split_command};
use serde::{Deserialize, Serialize};

use crate::notify::{NameResolver, Notifier};
use crate::{Engine, LastwordError, messages};

/// Reaction for a command that went through.
pub const REACT_OK: &str = "✅";
/// Reaction for a command the rules refused.
pub const REACT_REJECTED: &str = "❌";
/// Reaction for a command that opened a lobby or started the game.
pub const REACT_GAME: &str = "🎮";

/// How chat text is recognized as a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Text every command starts with, e.g. `+` in `+wjoin`.
    pub prefix: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            prefix: "+".to_string(),
        }
    }
}

/// A chat message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub origin: MessageRef,
    pub sender: PlayerId,
    pub text: String,
}

impl Incoming {
    pub fn new(origin: MessageRef, sender: PlayerId, text: impl Into<String>) -> Self {
        Self {
            origin,
            sender,
            text: text.into(),
        }
    }

    pub fn chat(&self) -> &ChatId {
        &self.origin.chat
    }
}

/// Dispatches word-game commands to an [`Engine`].
pub struct CommandRouter<N, D, R> {
    engine: Engine<N, D, R>,
}

impl<N, D, R> CommandRouter<N, D, R>
where
    N: Notifier,
    D: Dictionary,
    R: NameResolver,
{
    pub fn new(engine: Engine<N, D, R>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine<N, D, R> {
        &self.engine
    }

    /// Handles one chat message.
    ///
    /// Returns the command it ran, or `None` if the text wasn't a
    /// word-game command (left for the host's other handlers).
    pub async fn handle(&self, incoming: &Incoming) -> Option<Command> {
        let (verb, args) = split_command(&self.engine.router_config().prefix, &incoming.text)?;
        let command = Command::parse(&verb, &args)?;
        tracing::debug!(
            chat_id = %incoming.chat(),
            player_id = %incoming.sender,
            command = command.name(),
            "word game command"
        );

        let result = self.dispatch(incoming, &command).await;
        self.reply(incoming, &command, result).await;
        Some(command)
    }

    /// Runs `command`. `Ok(true)` means a lobby opened or a game started.
    async fn dispatch(&self, incoming: &Incoming, command: &Command) -> Result<bool, LastwordError> {
        let chat = incoming.chat();
        let sender = &incoming.sender;
        match command {
            Command::Lobby { difficulty: None } => {
                self.engine.start_lobby(chat, sender, None).await?;
                Ok(true)
            }
            Command::Lobby {
                difficulty: Some(difficulty),
            } => {
                let in_lobby = self
                    .engine
                    .snapshot(chat)
                    .await
                    .is_some_and(|s| s.phase().is_lobby());
                if in_lobby {
                    self.engine.set_difficulty(chat, *difficulty).await?;
                    Ok(false)
                } else {
                    self.engine.start_lobby(chat, sender, Some(*difficulty)).await?;
                    Ok(true)
                }
            }
            Command::Join => self.engine.join(chat, sender).await.map(|_| false),
            Command::Start => self.engine.start(chat).await.map(|_| true),
            Command::Submit { word } => self.engine.submit(chat, sender, word).await.map(|_| false),
            Command::Forfeit => self.engine.forfeit(chat, sender).await.map(|_| false),
            Command::End => self.engine.end(chat, sender).await.map(|_| false),
        }
    }

    async fn reply(&self, incoming: &Incoming, command: &Command, result: Result<bool, LastwordError>) {
        let notices = match result {
            Ok(started) => {
                let emoji = if started { REACT_GAME } else { REACT_OK };
                vec![Notice::reaction(&incoming.origin, emoji)]
            }
            Err(e) => match e.rejection() {
                Some(rejection) => {
                    tracing::debug!(
                        chat_id = %incoming.chat(),
                        player_id = %incoming.sender,
                        command = command.name(),
                        %rejection,
                        "command rejected"
                    );
                    let name = self.engine.display_name(incoming.chat(), &incoming.sender).await;
                    vec![
                        Notice::reaction(&incoming.origin, REACT_REJECTED),
                        Notice::text(
                            incoming.chat(),
                            messages::rejected(&name, rejection),
                            vec![incoming.sender.clone()],
                        ),
                    ]
                }
                None => {
                    tracing::error!(
                        chat_id = %incoming.chat(),
                        command = command.name(),
                        error = %e,
                        "word game command failed"
                    );
                    vec![Notice::text(incoming.chat(), messages::internal_error(), Vec::new())]
                }
            },
        };
        self.engine.deliver(notices).await;
    }
}
