//! Error types for the lexicon layer.

/// Errors a dictionary oracle can report.
///
/// None of these are fatal to a game: the engine treats any lookup
/// failure as "not a word" for that one submission and does not cache it.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    /// The oracle could not be reached or answered with garbage.
    #[error("dictionary lookup failed: {0}")]
    Lookup(String),

    /// The oracle is deliberately unavailable (rate limited, shut down).
    #[error("dictionary unavailable")]
    Unavailable,
}
