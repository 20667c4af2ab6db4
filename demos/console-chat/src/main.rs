//! A one-room chat in the terminal.
//!
//! Type `name: message` lines, e.g. `ana: +wg easy`, `bo: +wjoin`,
//! `ana: +wstart`, `bo: +w apple`. Bot replies are printed with `bot>`.
//!
//! ```text
//! cargo run -p console-chat -- [WORDS_FILE]
//! ```
//!
//! With a words file (one word per line) only listed words count. Without
//! one, any word does. `LASTWORD_CONFIG` may point at a JSON game config;
//! `RUST_LOG` controls log output.

use lastword::{CommandRouter, EngineBuilder, Incoming, Notifier, NotifyError, PlaceholderNames};
use lastword_game::GameConfig;
use lastword_lexicon::{Dictionary, LexiconError, WordList};
use lastword_protocol::{ChatId, MessageRef, PlayerId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Prints everything the bot says.
struct Console;

impl Notifier for Console {
    async fn send_text(
        &self,
        _chat: &ChatId,
        text: &str,
        mentions: &[PlayerId],
    ) -> Result<(), NotifyError> {
        for line in text.lines() {
            println!("bot> {line}");
        }
        if !mentions.is_empty() {
            let ids: Vec<&str> = mentions.iter().map(PlayerId::as_str).collect();
            println!("bot> (mentions: {})", ids.join(", "));
        }
        Ok(())
    }

    async fn send_reaction(&self, origin: &MessageRef, emoji: &str) -> Result<(), NotifyError> {
        println!("bot> {emoji} on {}", origin.id);
        Ok(())
    }
}

enum Words {
    Anything,
    List(WordList),
}

impl Dictionary for Words {
    async fn is_valid_word(&self, word: &str) -> Result<bool, LexiconError> {
        Ok(match self {
            Self::Anything => true,
            Self::List(list) => list.contains(word),
        })
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn load_config() -> Result<GameConfig, Box<dyn std::error::Error>> {
    match std::env::var("LASTWORD_CONFIG") {
        Ok(path) => Ok(GameConfig::from_json(&std::fs::read_to_string(path)?)?),
        Err(_) => Ok(GameConfig::default()),
    }
}

fn load_words() -> Result<Words, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let list = WordList::parse(&std::fs::read_to_string(&path)?);
            tracing::info!(%path, words = list.len(), "word list loaded");
            Ok(Words::List(list))
        }
        None => Ok(Words::Anything),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = EngineBuilder::new()
        .config(load_config()?)
        .build(Console, load_words()?, PlaceholderNames);
    let router = CommandRouter::new(engine);
    let chat = ChatId::new("console");

    eprintln!("lastword console chat: type `name: message`, Ctrl-D to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seq: u64 = 0;
    while let Some(line) = lines.next_line().await? {
        let Some((sender, text)) = line.split_once(':') else {
            eprintln!("expected `name: message`");
            continue;
        };
        seq += 1;
        let origin = MessageRef::new(chat.clone(), format!("m{seq}"));
        let incoming = Incoming::new(origin, PlayerId::new(sender.trim()), text.trim());
        if router.handle(&incoming).await.is_none() {
            tracing::debug!(text = %incoming.text, "not a word game command");
        }
    }

    let stopped = router.engine().shutdown().await;
    tracing::info!(stopped, "bye");
    Ok(())
}
