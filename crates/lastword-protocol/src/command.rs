//! Inbound command grammar.
//!
//! Chat text like `+w Apple` or `+wg hard` is first split into a verb and
//! arguments by [`split_command`], then recognized by [`Command::parse`].
//! Anything that isn't a word-game verb parses to `None` so the host
//! application can hand it to its other command handlers.

use crate::Difficulty;

/// A recognized word-game command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `wordgame` / `wg`, optionally with a difficulty.
    ///
    /// Opens a lobby, or changes the difficulty of an existing lobby when
    /// a difficulty is given. Unrecognized arguments are ignored.
    Lobby { difficulty: Option<Difficulty> },
    /// `wjoin`
    Join,
    /// `wstart`
    Start,
    /// `w <word>`. A missing word is an empty string and is rejected by
    /// the validator, not here.
    Submit { word: String },
    /// `wg forfeit`
    Forfeit,
    /// `wg end`
    End,
}

impl Command {
    /// Recognizes a word-game command from an already-split verb and args.
    ///
    /// Verbs and sub-commands are case-insensitive. Returns `None` for
    /// verbs this game doesn't own.
    pub fn parse<S: AsRef<str>>(verb: &str, args: &[S]) -> Option<Self> {
        let first = args.first().map(|a| a.as_ref().trim());
        match verb.to_ascii_lowercase().as_str() {
            "wordgame" | "wg" => Some(match first.map(str::to_ascii_lowercase).as_deref() {
                Some("forfeit") => Self::Forfeit,
                Some("end") => Self::End,
                Some(other) => Self::Lobby {
                    difficulty: other.parse().ok(),
                },
                None => Self::Lobby { difficulty: None },
            }),
            "wjoin" => Some(Self::Join),
            "wstart" => Some(Self::Start),
            "w" => Some(Self::Submit {
                word: first.unwrap_or_default().to_string(),
            }),
            _ => None,
        }
    }

    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lobby { .. } => "lobby",
            Self::Join => "join",
            Self::Start => "start",
            Self::Submit { .. } => "submit",
            Self::Forfeit => "forfeit",
            Self::End => "end",
        }
    }
}

/// Splits prefixed chat text into a lowercase verb and its arguments.
///
/// Returns `None` if the text doesn't start with `prefix` or has nothing
/// after it.
///
/// ```
/// use lastword_protocol::split_command;
///
/// let (verb, args) = split_command("+", "+W  Apple pie").unwrap();
/// assert_eq!(verb, "w");
/// assert_eq!(args, vec!["Apple", "pie"]);
/// assert!(split_command("+", "hello").is_none());
/// ```
pub fn split_command(prefix: &str, text: &str) -> Option<(String, Vec<String>)> {
    let rest = text.trim_start().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let verb = parts.next()?.to_ascii_lowercase();
    Some((verb, parts.map(str::to_string).collect()))
}
