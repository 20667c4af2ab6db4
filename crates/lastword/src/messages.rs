//! Chat-facing texts.

use lastword_game::{Accepted, Forfeit, Player, RoundOutcome, Session, Verdict};
use lastword_protocol::PlayerId;

pub(crate) fn lobby_opened(session: &Session, host: &Player, prefix: &str) -> String {
    let first = session.upcoming_params();
    format!(
        "🎲 Word game lobby started on {} mode by {}!\n\
         ⏱️ Starting time: {} seconds\n\
         📏 Starting word length: {} letters\n\n\
         Use {prefix}wjoin to join, {prefix}wg easy/medium/hard to set difficulty, or {prefix}wstart to begin.",
        session.difficulty(),
        host.display_name,
        first.time_limit_secs(),
        first.min_word_length,
    )
}

pub(crate) fn difficulty_set(session: &Session) -> String {
    format!(
        "Difficulty set to {}. Starting time: {} seconds.",
        session.difficulty(),
        session.upcoming_params().time_limit_secs()
    )
}

pub(crate) fn joined(player: &Player, count: usize) -> String {
    format!(
        "{} joined the word game! Current players: {count}",
        player.display_name
    )
}

pub(crate) fn round_started(session: &Session, prefix: &str) -> String {
    format!(
        "Round {}: Submit a word starting with \"{}\" (min {} letters) with {prefix}w <word>. \
         Time: {} seconds!\n\n\
         Round progression: Time ⏱️ decreases, Word length 📏 increases!",
        session.round(),
        session.current_letter().unwrap_or('?'),
        session.min_word_length(),
        session.time_limit().as_secs(),
    )
}

pub(crate) fn accepted(accepted: &Accepted) -> String {
    format!(
        "{} submitted \"{}\"!",
        accepted.player.display_name, accepted.word
    )
}

/// "Time's up" line followed by the verdict.
pub(crate) fn round_outcome(outcome: &RoundOutcome) -> String {
    let mut text = String::new();
    if !outcome.eliminated.is_empty() {
        text.push_str(&format!(
            "⏰ Time's up! Eliminated: {}\n",
            names(&outcome.eliminated)
        ));
    }
    text.push_str(&verdict(&outcome.verdict));
    text
}

pub(crate) fn forfeited(forfeit: &Forfeit) -> String {
    format!(
        "{} has forfeited!\n{}",
        forfeit.player.display_name,
        verdict(&forfeit.verdict)
    )
}

pub(crate) fn ended_by(name: &str) -> String {
    format!("Word game ended by {name}.")
}

pub(crate) fn shutting_down() -> String {
    "Word game stopped: the game server is shutting down.".to_string()
}

pub(crate) fn rejected(name: &str, reason: &impl std::fmt::Display) -> String {
    format!("{name}, {reason}.")
}

pub(crate) fn internal_error() -> String {
    "Something went wrong with the word game. Please try again.".to_string()
}

fn verdict(verdict: &Verdict) -> String {
    match verdict {
        Verdict::NoWinner => "🏁 Game over! No winner.".to_string(),
        Verdict::Winner(winner) => format!("🏆 Game over! Winner: {}", winner.display_name),
        Verdict::Continue { remaining } => format!(
            "🎯 Remaining: {}\n🔄 Next round starting...",
            names(remaining)
        ),
    }
}

fn names(players: &[Player]) -> String {
    players
        .iter()
        .map(|p| p.display_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everyone a round outcome or forfeit text talks about.
pub(crate) fn verdict_mentions(eliminated: &[Player], verdict: &Verdict) -> Vec<PlayerId> {
    let named: &[Player] = match verdict {
        Verdict::NoWinner => &[],
        Verdict::Winner(winner) => std::slice::from_ref(winner),
        Verdict::Continue { remaining } => remaining,
    };
    eliminated.iter().chain(named).map(|p| p.id.clone()).collect()
}
