//! The game engine: sessions, timers, the dictionary, and the chat, wired
//! together.
//!
//! Every public operation follows the same shape:
//!
//!   1. look the session up in the registry (registry lock, released)
//!   2. lock the session, apply the rule, arm or cancel its timer, and
//!      collect the notices to send
//!   3. unlock, drop the session from the registry if the game ended
//!   4. deliver the notices
//!
//! Dictionary lookups, name lookups, and notice delivery never run while a
//! session lock is held.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::future::join_all;
use lastword_game::{
    Accepted, Forfeit, GameConfig, GameError, Phase, Player, Rejection, Session, SessionHandle,
    SessionRegistry, random_letter, validator,
};
use lastword_lexicon::{Dictionary, WordCache};
use lastword_protocol::{ChatId, Difficulty, Notice, PlayerId};
use lastword_timer::{TimerFuture, TimerManager, TimerToken};

use crate::notify::{self, NameResolver, Notifier, PlaceholderNames};
use crate::{LastwordError, RouterConfig, messages};

/// Shared engine state. One per process; timer tasks only hold a `Weak`.
struct Inner<N, D, R> {
    config: GameConfig,
    router: RouterConfig,
    registry: SessionRegistry,
    timers: TimerManager<ChatId>,
    words: WordCache<D>,
    notifier: N,
    names: R,
}

/// Builder for an [`Engine`].
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new()
///     .config(GameConfig::from_json(&text)?)
///     .build(my_notifier, WordList::parse(&words), PlaceholderNames);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: GameConfig,
    router: RouterConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the game configuration. Out-of-range values are clamped.
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config.validated();
        self
    }

    /// Sets the command configuration used in help texts and by the
    /// [`CommandRouter`](crate::CommandRouter).
    pub fn router_config(mut self, router: RouterConfig) -> Self {
        self.router = router;
        self
    }

    pub fn build<N, D, R>(self, notifier: N, dictionary: D, names: R) -> Engine<N, D, R>
    where
        N: Notifier,
        D: Dictionary,
        R: NameResolver,
    {
        Engine {
            inner: Arc::new(Inner {
                config: self.config,
                router: self.router,
                registry: SessionRegistry::new(),
                timers: TimerManager::new(),
                words: WordCache::new(dictionary),
                notifier,
                names,
            }),
        }
    }
}

/// Runs every chat's word game.
///
/// Cheap to clone; clones share all state.
pub struct Engine<N, D, R = PlaceholderNames> {
    inner: Arc<Inner<N, D, R>>,
}

impl<N, D, R> Clone for Engine<N, D, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N, D, R> Engine<N, D, R>
where
    N: Notifier,
    D: Dictionary,
    R: NameResolver,
{
    /// Creates an engine with default router settings.
    pub fn new(config: GameConfig, notifier: N, dictionary: D, names: R) -> Self {
        EngineBuilder::new()
            .config(config)
            .build(notifier, dictionary, names)
    }

    pub fn config(&self) -> &GameConfig {
        &self.inner.config
    }

    pub fn router_config(&self) -> &RouterConfig {
        &self.inner.router
    }

    pub fn words(&self) -> &WordCache<D> {
        &self.inner.words
    }

    pub fn notifier(&self) -> &N {
        &self.inner.notifier
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    /// Opens a lobby in `chat` with `host` as its first player.
    ///
    /// An existing lobby is replaced. Uses the configured default
    /// difficulty when `difficulty` is `None`.
    ///
    /// # Errors
    /// [`Rejection::SessionAlreadyActive`] if a game is running.
    pub async fn start_lobby(
        &self,
        chat: &ChatId,
        host: &PlayerId,
        difficulty: Option<Difficulty>,
    ) -> Result<Session, LastwordError> {
        let host = Player::new(host.clone(), self.resolve_name(host).await);
        let difficulty = difficulty.unwrap_or(self.inner.config.default_difficulty);

        let session = Session::new_lobby(chat.clone(), host.clone(), difficulty);
        let handle = self.inner.registry.create(session).await?;
        let snapshot = handle.lock().await.clone();
        tracing::info!(chat_id = %chat, player_id = %host.id, %difficulty, "lobby opened");

        let text = messages::lobby_opened(&snapshot, &host, self.prefix());
        self.deliver(vec![Notice::text(chat, text, vec![host.id])])
            .await;
        Ok(snapshot)
    }

    /// Adds `player` to the chat's lobby.
    ///
    /// # Errors
    /// [`Rejection::NoLobby`] without a lobby, [`Rejection::AlreadyJoined`]
    /// for a repeat join.
    pub async fn join(&self, chat: &ChatId, player: &PlayerId) -> Result<Session, LastwordError> {
        let handle = self.live(chat).await.ok_or(Rejection::NoLobby)?;
        {
            let session = handle.lock().await;
            if !session.phase().is_lobby() {
                return Err(Rejection::NoLobby.into());
            }
            if session.is_player(player) {
                return Err(Rejection::AlreadyJoined.into());
            }
        }

        let player = Player::new(player.clone(), self.resolve_name(player).await);
        let (snapshot, text) = {
            let mut session = handle.lock().await;
            session.join(player.clone())?;
            let text = messages::joined(&player, session.players().len());
            (session.clone(), text)
        };
        tracing::info!(chat_id = %chat, player_id = %player.id, players = snapshot.players().len(), "player joined");

        self.deliver(vec![Notice::text(chat, text, vec![player.id])])
            .await;
        Ok(snapshot)
    }

    /// Changes the lobby's difficulty.
    ///
    /// # Errors
    /// [`Rejection::NoLobby`] unless a lobby is open.
    pub async fn set_difficulty(
        &self,
        chat: &ChatId,
        difficulty: Difficulty,
    ) -> Result<Session, LastwordError> {
        let handle = self.live(chat).await.ok_or(Rejection::NoLobby)?;
        let snapshot = {
            let mut session = handle.lock().await;
            session.set_difficulty(difficulty)?;
            session.clone()
        };
        tracing::info!(chat_id = %chat, %difficulty, "difficulty changed");

        let text = messages::difficulty_set(&snapshot);
        self.deliver(vec![Notice::text(chat, text, Vec::new())]).await;
        Ok(snapshot)
    }

    /// Starts the game: opens round 1 and arms its timer.
    ///
    /// # Errors
    /// [`Rejection::NoLobby`] without a lobby,
    /// [`Rejection::NotEnoughPlayers`] below the configured minimum.
    pub async fn start(&self, chat: &ChatId) -> Result<Session, LastwordError> {
        let handle = self.live(chat).await.ok_or(Rejection::NoLobby)?;
        let (snapshot, notice) = {
            let mut session = handle.lock().await;
            let params = session.start(self.inner.config.min_players, random_letter())?;
            self.arm_round_timeout(chat, params.round, params.time_limit);
            (session.clone(), self.round_notice(&session))
        };

        self.deliver(vec![notice]).await;
        Ok(snapshot)
    }

    // -----------------------------------------------------------------------
    // Playing
    // -----------------------------------------------------------------------

    /// Submits `word` for `player` in the chat's current round.
    ///
    /// The word is checked in two passes around the dictionary lookup so
    /// the session isn't locked while the dictionary is consulted. If the
    /// round changed in between, the word is refused with
    /// [`Rejection::NoActiveRound`]. A failed lookup counts as
    /// [`Rejection::NotAWord`].
    ///
    /// When this was the last missing answer, the round is resolved on the
    /// spot and its timer cancelled.
    pub async fn submit(
        &self,
        chat: &ChatId,
        player: &PlayerId,
        word: &str,
    ) -> Result<Accepted, LastwordError> {
        let handle = self.live(chat).await.ok_or(Rejection::NoActiveRound)?;

        let (lower, round) = {
            let session = handle.lock().await;
            let lower = validator::check_shape(Some(&*session), player, word)?;
            (lower, session.round())
        };

        let in_dictionary = match self.inner.words.is_valid(&lower).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(chat_id = %chat, word = %lower, error = %e, "dictionary lookup failed");
                false
            }
        };

        let (accepted, mut notices, ended) = {
            let mut session = handle.lock().await;
            if session.round() != round {
                tracing::debug!(chat_id = %chat, round, "round moved on during lookup");
                return Err(Rejection::NoActiveRound.into());
            }
            let accepted = session.submit(player, word, in_dictionary)?;
            tracing::info!(
                chat_id = %chat,
                round,
                player_id = %player,
                word = %accepted.word,
                responded = accepted.responded,
                expected = accepted.expected,
                "word accepted"
            );

            let mut notices = Vec::new();
            let mut ended = false;
            if accepted.completes_round() {
                self.inner.timers.cancel(chat);
                if session.claim_resolution(round)? {
                    let (resolved, game_over) = self.resolve_claimed(&mut session)?;
                    notices = resolved;
                    ended = game_over;
                }
            }
            (accepted, notices, ended)
        };

        if ended {
            self.finish(chat, &handle).await;
        }
        notices.insert(
            0,
            Notice::text(chat, messages::accepted(&accepted), vec![player.clone()]),
        );
        self.deliver(notices).await;
        Ok(accepted)
    }

    /// Takes `player` out of the running game.
    ///
    /// Closes the current round. With two or more players left, a fresh
    /// round starts after the grace delay; otherwise the game ends.
    ///
    /// # Errors
    /// [`Rejection::NoActiveRound`] before the first round,
    /// [`Rejection::NotAPlayer`] for outsiders.
    pub async fn forfeit(&self, chat: &ChatId, player: &PlayerId) -> Result<Forfeit, LastwordError> {
        let handle = self.live(chat).await.ok_or(Rejection::NoActiveRound)?;
        let forfeit = {
            let mut session = handle.lock().await;
            let forfeit = session.forfeit(player)?;
            self.inner.timers.cancel(chat);
            if !forfeit.verdict.ends_game() {
                self.arm_next_round(chat, session.round());
            }
            forfeit
        };

        if forfeit.verdict.ends_game() {
            self.finish(chat, &handle).await;
        }
        let mentions =
            messages::verdict_mentions(std::slice::from_ref(&forfeit.player), &forfeit.verdict);
        let text = messages::forfeited(&forfeit);
        self.deliver(vec![Notice::text(chat, text, mentions)]).await;
        Ok(forfeit)
    }

    /// Ends the chat's game at a player's request.
    ///
    /// # Errors
    /// [`Rejection::NoActiveRound`] if there is no game (including a second
    /// `end`), [`Rejection::NotAPlayer`] for outsiders.
    pub async fn end(&self, chat: &ChatId, player: &PlayerId) -> Result<(), LastwordError> {
        let handle = self.live(chat).await.ok_or(Rejection::NoActiveRound)?;
        let name = {
            let mut session = handle.lock().await;
            session.end(player)?;
            self.inner.timers.cancel(chat);
            session
                .player(player)
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| player.placeholder_name())
        };

        self.finish(chat, &handle).await;
        self.deliver(vec![Notice::text(chat, messages::ended_by(&name), Vec::new())])
            .await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// A copy of the chat's live session.
    pub async fn snapshot(&self, chat: &ChatId) -> Option<Session> {
        let handle = self.live(chat).await?;
        let session = handle.lock().await;
        (!session.phase().is_ended()).then(|| session.clone())
    }

    /// Number of chats with a lobby or game.
    pub async fn active_sessions(&self) -> usize {
        self.inner.registry.len().await
    }

    /// The display name to use for `player` in `chat`: the one stored on
    /// their player record, or a fresh lookup for non-players.
    pub async fn display_name(&self, chat: &ChatId, player: &PlayerId) -> String {
        if let Some(handle) = self.live(chat).await {
            if let Some(known) = handle.lock().await.player(player) {
                return known.display_name.clone();
            }
        }
        self.resolve_name(player).await
    }

    /// Stops every game: cancels all timers, ends and forgets every
    /// session, and tells each affected chat. Returns how many games were
    /// stopped.
    pub async fn shutdown(&self) -> usize {
        let timers = self.inner.timers.cancel_all();
        let mut stopped = Vec::new();
        for (chat, handle) in self.inner.registry.drain().await {
            match handle.lock().await.close() {
                Ok(true) => stopped.push(chat),
                Ok(false) => {}
                Err(e) => tracing::error!(chat_id = %chat, error = %e, "failed to close session"),
            }
        }

        join_all(stopped.iter().map(|chat| {
            self.deliver(vec![Notice::text(chat, messages::shutting_down(), Vec::new())])
        }))
        .await;
        tracing::info!(sessions = stopped.len(), timers, "engine shut down");
        stopped.len()
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    // Timer tasks hold a `Weak` so a pending timer doesn't keep the engine
    // alive. Once the last `Engine` is dropped, the timer manager goes with
    // it and aborts whatever is still pending.

    fn arm_round_timeout(&self, chat: &ChatId, round: u32, limit: Duration) {
        let inner = Arc::downgrade(&self.inner);
        self.inner
            .timers
            .schedule(chat.clone(), limit, move |token| -> TimerFuture {
                Box::pin(async move {
                    if let Some(engine) = Self::upgrade(&inner) {
                        engine.on_round_timeout(token, round).await;
                    }
                })
            });
    }

    fn arm_next_round(&self, chat: &ChatId, after_round: u32) {
        let inner = Arc::downgrade(&self.inner);
        self.inner.timers.schedule(
            chat.clone(),
            self.inner.config.next_round_delay(),
            move |token| -> TimerFuture {
                Box::pin(async move {
                    if let Some(engine) = Self::upgrade(&inner) {
                        engine.on_next_round(token, after_round).await;
                    }
                })
            },
        );
    }

    fn upgrade(inner: &Weak<Inner<N, D, R>>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    async fn on_round_timeout(&self, token: TimerToken<ChatId>, round: u32) {
        let chat = token.key().clone();
        let Some(handle) = self.live(&chat).await else {
            tracing::debug!(chat_id = %chat, round, "round timer fired without a session");
            return;
        };

        let resolved = {
            let mut session = handle.lock().await;
            if !self.inner.timers.claim(&token) {
                tracing::debug!(chat_id = %chat, round, "stale round timer ignored");
                return;
            }
            match session.claim_resolution(round) {
                Ok(true) => self.resolve_claimed(&mut session),
                Ok(false) => {
                    tracing::debug!(chat_id = %chat, round, "round already resolved");
                    return;
                }
                Err(e) => Err(e),
            }
        };

        match resolved {
            Ok((notices, ended)) => {
                if ended {
                    self.finish(&chat, &handle).await;
                }
                self.deliver(notices).await;
            }
            Err(e) => tracing::error!(chat_id = %chat, round, error = %e, "round timeout failed"),
        }
    }

    async fn on_next_round(&self, token: TimerToken<ChatId>, after_round: u32) {
        let chat = token.key().clone();
        let Some(handle) = self.live(&chat).await else {
            tracing::debug!(chat_id = %chat, "next-round timer fired without a session");
            return;
        };

        let notice = {
            let mut session = handle.lock().await;
            if !self.inner.timers.claim(&token) {
                tracing::debug!(chat_id = %chat, after_round, "stale next-round timer ignored");
                return;
            }
            if session.phase() != Phase::RoundResolving || session.round() != after_round {
                tracing::debug!(
                    chat_id = %chat,
                    after_round,
                    phase = %session.phase(),
                    "session moved on, not starting next round"
                );
                return;
            }
            match session.begin_round(random_letter()) {
                Ok(params) => {
                    self.arm_round_timeout(&chat, params.round, params.time_limit);
                    self.round_notice(&session)
                }
                Err(e) => {
                    tracing::error!(chat_id = %chat, after_round, error = %e, "failed to start next round");
                    return;
                }
            }
        };

        self.deliver(vec![notice]).await;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Resolves a round this caller has just claimed, and arms the next
    /// round when the game goes on. Returns the notices to send and whether
    /// the game is over.
    fn resolve_claimed(&self, session: &mut Session) -> Result<(Vec<Notice>, bool), GameError> {
        let outcome = session.resolve()?;
        let chat = session.chat_id().clone();
        let ended = outcome.verdict.ends_game();

        if ended {
            self.inner.timers.cancel(&chat);
        } else {
            self.arm_next_round(&chat, outcome.round);
        }
        tracing::info!(
            chat_id = %chat,
            round = outcome.round,
            eliminated = outcome.eliminated.len(),
            remaining = session.players().len(),
            "round resolved"
        );

        let mentions = messages::verdict_mentions(&outcome.eliminated, &outcome.verdict);
        let text = messages::round_outcome(&outcome);
        Ok((vec![Notice::text(&chat, text, mentions)], ended))
    }

    fn round_notice(&self, session: &Session) -> Notice {
        Notice::text(
            session.chat_id(),
            messages::round_started(session, self.prefix()),
            session.player_ids(),
        )
    }

    /// Forgets an ended session, unless the chat has moved on to a new one.
    async fn finish(&self, chat: &ChatId, handle: &SessionHandle) {
        if self.inner.registry.remove_if_same(chat, handle).await {
            tracing::info!(chat_id = %chat, "game ended");
        }
    }

    /// The chat's session handle, if it has one.
    async fn live(&self, chat: &ChatId) -> Option<SessionHandle> {
        self.inner.registry.get(chat).await
    }

    async fn resolve_name(&self, player: &PlayerId) -> String {
        notify::display_name(&self.inner.names, player).await
    }

    fn prefix(&self) -> &str {
        &self.inner.router.prefix
    }

    pub(crate) async fn deliver(&self, notices: Vec<Notice>) {
        notify::deliver(&self.inner.notifier, notices).await;
    }
}
