//! The session: one chat's game, from lobby to the last player standing.
//!
//! A `Session` is plain data plus the rules for changing it. It never
//! touches a clock or the network; the engine decides *when* a round
//! starts or times out and calls into the session to make it happen.
//!
//! # Resolving exactly once
//!
//! A round can close two ways: its timer fires, or the last player's word
//! arrives. Both paths must call [`Session::claim_resolution`] with the
//! round number they believe is open. The first claim wins and moves the
//! session to `RoundResolving`; every later claim for that round returns
//! `false`. [`Session::resolve`] refuses to run unless the current round
//! was claimed and not yet resolved.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use lastword_protocol::{ChatId, Difficulty, PlayerId};
use serde::{Deserialize, Serialize};

use crate::{GameError, Phase, Rejection, RoundParams, validator};

// ---------------------------------------------------------------------------
// Player and outcomes
// ---------------------------------------------------------------------------

/// A participant, with the display name resolved when they joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Mention-style name, e.g. `@alice`.
    pub display_name: String,
}

impl Player {
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// A word that passed every check and was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub player: Player,
    /// The word as the player typed it.
    pub word: String,
    pub round: u32,
    /// Players who have answered this round, including this one.
    pub responded: usize,
    /// Players still in the game.
    pub expected: usize,
}

impl Accepted {
    /// `true` if this was the last missing answer of the round.
    pub fn completes_round(&self) -> bool {
        self.responded == self.expected
    }
}

/// What happens to the game after players leave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Everyone is out. The session has ended.
    NoWinner,
    /// One player is left. The session has ended.
    Winner(Player),
    /// The game goes on with these players after the grace delay.
    Continue { remaining: Vec<Player> },
}

impl Verdict {
    pub fn ends_game(&self) -> bool {
        !matches!(self, Self::Continue { .. })
    }
}

/// The result of resolving a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub round: u32,
    /// Players who didn't answer in time, in join order.
    pub eliminated: Vec<Player>,
    pub verdict: Verdict,
}

/// The result of a player forfeiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forfeit {
    pub player: Player,
    pub verdict: Verdict,
}

// ---------------------------------------------------------------------------
// Resolution guard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    /// The round is open and nobody has claimed it.
    Armed,
    /// A trigger claimed the round; resolution is pending.
    Claimed,
    /// The round is closed for good.
    Closed,
}

/// One-shot, round-scoped claim. Lives inside the session's mutex, so
/// compare-and-set is a plain read-then-write.
#[derive(Debug, Clone, Copy)]
struct ResolutionGuard {
    round: u32,
    state: GuardState,
}

impl ResolutionGuard {
    fn closed() -> Self {
        Self {
            round: 0,
            state: GuardState::Closed,
        }
    }

    fn arm(&mut self, round: u32) {
        self.round = round;
        self.state = GuardState::Armed;
    }

    fn try_claim(&mut self, round: u32) -> bool {
        if self.round == round && self.state == GuardState::Armed {
            self.state = GuardState::Claimed;
            true
        } else {
            false
        }
    }

    /// Claimed → Closed. `false` if the round wasn't claimed.
    fn complete(&mut self) -> bool {
        if self.state == GuardState::Claimed {
            self.state = GuardState::Closed;
            true
        } else {
            false
        }
    }

    fn close(&mut self) {
        self.state = GuardState::Closed;
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ActiveRound {
    params: RoundParams,
    letter: char,
}

/// One chat's word game.
#[derive(Debug, Clone)]
pub struct Session {
    chat_id: ChatId,
    phase: Phase,
    /// Join order. Never contains the same id twice.
    players: Vec<Player>,
    difficulty: Difficulty,
    /// 0 in the lobby; bumped once per round start.
    round: u32,
    current: Option<ActiveRound>,
    /// Player → word as typed. Cleared at every round start.
    responses: HashMap<PlayerId, String>,
    /// Lowercase words of the current round.
    round_words: HashSet<String>,
    /// Lowercase words of the whole game.
    game_words: HashSet<String>,
    guard: ResolutionGuard,
}

impl Session {
    /// Opens a lobby with `host` as its only player.
    pub fn new_lobby(chat_id: ChatId, host: Player, difficulty: Difficulty) -> Self {
        Self {
            chat_id,
            phase: Phase::Lobby,
            players: vec![host],
            difficulty,
            round: 0,
            current: None,
            responses: HashMap::new(),
            round_words: HashSet::new(),
            game_words: HashSet::new(),
            guard: ResolutionGuard::closed(),
        }
    }

    // -- lobby -------------------------------------------------------------

    /// Adds a player to the lobby.
    ///
    /// # Errors
    /// [`Rejection::NoLobby`] once the game has started,
    /// [`Rejection::AlreadyJoined`] for a player already in.
    pub fn join(&mut self, player: Player) -> Result<(), Rejection> {
        if !self.phase.is_lobby() {
            return Err(Rejection::NoLobby);
        }
        if self.is_player(&player.id) {
            return Err(Rejection::AlreadyJoined);
        }
        tracing::debug!(chat_id = %self.chat_id, player_id = %player.id, "player joined lobby");
        self.players.push(player);
        Ok(())
    }

    /// Changes the difficulty. Only allowed in the lobby.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<(), Rejection> {
        if !self.phase.is_lobby() {
            return Err(Rejection::NoLobby);
        }
        self.difficulty = difficulty;
        Ok(())
    }

    /// Leaves the lobby and opens round 1 with `letter`.
    ///
    /// # Errors
    /// [`Rejection::NoLobby`] if not in the lobby,
    /// [`Rejection::NotEnoughPlayers`] below `min_players`.
    pub fn start(&mut self, min_players: usize, letter: char) -> Result<RoundParams, GameError> {
        if !self.phase.is_lobby() {
            return Err(Rejection::NoLobby.into());
        }
        if self.players.len() < min_players {
            return Err(Rejection::NotEnoughPlayers {
                needed: min_players,
            }
            .into());
        }
        self.begin_round(letter)
    }

    // -- rounds ------------------------------------------------------------

    /// Opens the next round: bumps the round number, derives its
    /// parameters, clears last round's answers, and arms the guard.
    ///
    /// Valid from the lobby (via [`start`](Self::start)) or after a
    /// resolved round.
    pub fn begin_round(&mut self, letter: char) -> Result<RoundParams, GameError> {
        if self.guard.state == GuardState::Claimed {
            return Err(GameError::Invariant(format!(
                "round {} started before round {} was resolved",
                self.round + 1,
                self.round
            )));
        }
        self.transition(Phase::RoundActive)?;

        self.round += 1;
        let params = RoundParams::derive(self.difficulty, self.round);
        let letter = letter.to_ascii_uppercase();
        self.current = Some(ActiveRound { params, letter });
        self.responses.clear();
        self.round_words.clear();
        self.guard.arm(self.round);

        tracing::info!(
            chat_id = %self.chat_id,
            round = self.round,
            %letter,
            time_limit_secs = params.time_limit_secs(),
            min_word_length = params.min_word_length,
            players = self.players.len(),
            "round started"
        );
        Ok(params)
    }

    /// Records a submission that passes every check.
    ///
    /// `in_dictionary` is the dictionary's verdict on the word, looked up
    /// by the caller. Nothing changes on rejection.
    pub fn submit(
        &mut self,
        player_id: &PlayerId,
        raw: &str,
        in_dictionary: bool,
    ) -> Result<Accepted, Rejection> {
        let lower = validator::validate(Some(&*self), player_id, raw, in_dictionary)?;
        let player = self.player(player_id).cloned().ok_or(Rejection::NotAPlayer)?;

        self.responses.insert(player_id.clone(), raw.to_string());
        self.round_words.insert(lower.clone());
        self.game_words.insert(lower);

        Ok(Accepted {
            player,
            word: raw.to_string(),
            round: self.round,
            responded: self.responses.len(),
            expected: self.players.len(),
        })
    }

    /// Claims the right to resolve `round`.
    ///
    /// Returns `Ok(true)` for the first claim on the open round and moves
    /// the session to `RoundResolving`; `Ok(false)` if the round is not
    /// open (already claimed, a different round, or no round at all).
    pub fn claim_resolution(&mut self, round: u32) -> Result<bool, GameError> {
        if !self.guard.try_claim(round) {
            return Ok(false);
        }
        self.transition(Phase::RoundResolving)?;
        Ok(true)
    }

    /// Eliminates everyone who didn't answer and decides what's next.
    ///
    /// Must follow a successful [`claim_resolution`](Self::claim_resolution)
    /// for the current round. Ends the session when fewer than two players
    /// remain; otherwise leaves it in `RoundResolving` for the next
    /// [`begin_round`](Self::begin_round).
    pub fn resolve(&mut self) -> Result<RoundOutcome, GameError> {
        if self.phase != Phase::RoundResolving || !self.guard.complete() {
            return Err(GameError::Invariant(format!(
                "round {} resolved without a claim (phase {})",
                self.round, self.phase
            )));
        }

        let responses = &self.responses;
        let (survivors, eliminated): (Vec<Player>, Vec<Player>) = std::mem::take(&mut self.players)
            .into_iter()
            .partition(|p| responses.contains_key(&p.id));
        self.players = survivors;

        for player in &eliminated {
            tracing::info!(
                chat_id = %self.chat_id,
                round = self.round,
                player_id = %player.id,
                "player eliminated"
            );
        }

        let verdict = self.decide()?;
        Ok(RoundOutcome {
            round: self.round,
            eliminated,
            verdict,
        })
    }

    // -- leaving -----------------------------------------------------------

    /// Removes a player from a running game.
    ///
    /// An open round is closed on the spot (its guard is spent, so a
    /// pending timeout can't resolve it). The remaining players then go
    /// through the same zero / one / many decision as a resolved round.
    ///
    /// # Errors
    /// [`Rejection::NoActiveRound`] before the first round or after the
    /// end, [`Rejection::NotAPlayer`] for outsiders.
    pub fn forfeit(&mut self, player_id: &PlayerId) -> Result<Forfeit, GameError> {
        if !self.phase.is_in_game() {
            return Err(Rejection::NoActiveRound.into());
        }
        let index = self
            .players
            .iter()
            .position(|p| &p.id == player_id)
            .ok_or(Rejection::NotAPlayer)?;

        let player = self.players.remove(index);
        self.responses.remove(player_id);
        self.guard.close();
        if self.phase == Phase::RoundActive {
            self.transition(Phase::RoundResolving)?;
        }
        tracing::info!(chat_id = %self.chat_id, player_id = %player.id, "player forfeited");

        let verdict = self.decide()?;
        Ok(Forfeit { player, verdict })
    }

    /// Ends the game unconditionally on a player's request.
    ///
    /// # Errors
    /// [`Rejection::NoActiveRound`] if already ended,
    /// [`Rejection::NotAPlayer`] for outsiders.
    pub fn end(&mut self, player_id: &PlayerId) -> Result<(), GameError> {
        if self.phase.is_ended() {
            return Err(Rejection::NoActiveRound.into());
        }
        if !self.is_player(player_id) {
            return Err(Rejection::NotAPlayer.into());
        }
        self.close().map(|_| ())
    }

    /// Ends the game without anyone asking, e.g. when the host shuts down.
    ///
    /// Returns `false` if the session had already ended.
    pub fn close(&mut self) -> Result<bool, GameError> {
        if self.phase.is_ended() {
            return Ok(false);
        }
        self.guard.close();
        self.transition(Phase::Ended)?;
        Ok(true)
    }

    fn decide(&mut self) -> Result<Verdict, GameError> {
        let verdict = match self.players.as_slice() {
            [] => Verdict::NoWinner,
            [winner] => Verdict::Winner(winner.clone()),
            remaining => Verdict::Continue {
                remaining: remaining.to_vec(),
            },
        };
        if verdict.ends_game() {
            self.transition(Phase::Ended)?;
        }
        Ok(verdict)
    }

    fn transition(&mut self, to: Phase) -> Result<(), GameError> {
        if !self.phase.can_transition_to(to) {
            return Err(GameError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!(chat_id = %self.chat_id, from = %self.phase, %to, "phase transition");
        self.phase = to;
        Ok(())
    }

    // -- accessors ---------------------------------------------------------

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn is_player(&self, id: &PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// The current (or last) round number; 0 in the lobby.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Parameters of the current (or last) round.
    pub fn round_params(&self) -> Option<RoundParams> {
        self.current.as_ref().map(|r| r.params)
    }

    /// Parameters the next round will get.
    pub fn upcoming_params(&self) -> RoundParams {
        RoundParams::derive(self.difficulty, self.round + 1)
    }

    pub fn current_letter(&self) -> Option<char> {
        self.current.as_ref().map(|r| r.letter)
    }

    /// Time limit of the current round, or of round 1 while in the lobby.
    pub fn time_limit(&self) -> Duration {
        self.round_params()
            .unwrap_or_else(|| self.upcoming_params())
            .time_limit
    }

    /// Minimum word length of the current round, or of round 1 in the lobby.
    pub fn min_word_length(&self) -> usize {
        self.round_params()
            .unwrap_or_else(|| self.upcoming_params())
            .min_word_length
    }

    pub fn responses(&self) -> &HashMap<PlayerId, String> {
        &self.responses
    }

    pub fn has_responded(&self, id: &PlayerId) -> bool {
        self.responses.contains_key(id)
    }

    pub fn all_responded(&self) -> bool {
        !self.players.is_empty() && self.responses.len() == self.players.len()
    }

    /// `true` while the current round is open and unclaimed.
    pub fn is_round_open(&self) -> bool {
        self.phase == Phase::RoundActive && self.guard.state == GuardState::Armed
    }

    /// Whether `word` (any case) was accepted earlier in this game.
    pub fn used_in_game(&self, word: &str) -> bool {
        self.game_words.contains(&word.to_ascii_lowercase())
    }

    /// Whether `word` (any case) was accepted earlier in this round.
    pub fn used_in_round(&self, word: &str) -> bool {
        self.round_words.contains(&word.to_ascii_lowercase())
    }
}
