//! Error types for the protocol layer.
//!
//! Each crate in Lastword defines its own error enum. A `ProtocolError`
//! always means the problem is in how chat text was interpreted, not in
//! game rules or collaborators.

/// Errors that can occur while interpreting inbound chat text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The text named a difficulty level that doesn't exist.
    ///
    /// Only `easy`, `medium`, and `hard` are recognized (any case).
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}
