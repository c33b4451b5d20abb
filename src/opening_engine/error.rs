//! Error types for the opening drill engine.

use thiserror::Error;

use crate::opening_engine::session::Phase;

/// Main error type for the crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("variation index {index} is out of range for '{family}' ({len} variations)")]
    VariationIndexOutOfRange {
        family: String,
        index: usize,
        len: usize,
    },

    #[error("no opening family named '{name}' in the catalog")]
    UnknownFamily { name: String },

    #[error("illegal move '{san}' in the current position")]
    IllegalMove { san: String },

    #[error("book move '{san}' was refused by the rules engine after [{}]", .history.join(" "))]
    BookMoveRejected { san: String, history: Vec<String> },

    #[error("move history [{}] does not follow any line in the book", .history.join(" "))]
    DivergedHistory { history: Vec<String> },

    #[error("session is not waiting for a player move (phase: {phase:?})")]
    NotAwaitingPlayer { phase: Phase },

    #[error("catalog parse error: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for results carrying the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
