//! Unified error type for Lastword.

use lastword_game::{GameError, Rejection};

/// A chat collaborator (notifier or name resolver) failed.
///
/// Never fatal: the engine logs these and carries on.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// A text or reaction could not be delivered.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// A display name could not be looked up.
    #[error("name lookup failed: {0}")]
    NameLookup(String),
}

/// Error returned by every [`Engine`](crate::Engine) operation.
///
/// Dictionary and collaborator failures never get this far: a failed
/// lookup rejects the word, and notifier or name resolver failures are
/// logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum LastwordError {
    /// A rule refused the request, or the game broke an invariant.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl From<Rejection> for LastwordError {
    fn from(rejection: Rejection) -> Self {
        Self::Game(GameError::Rejected(rejection))
    }
}

impl LastwordError {
    /// The rejection inside, if a player's request was refused.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Game(err) => err.rejection(),
        }
    }

    /// `true` for refusals that belong in the chat rather than the logs.
    pub fn is_user_facing(&self) -> bool {
        self.rejection().is_some()
    }
}
