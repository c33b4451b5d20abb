//! Core drill engine: book compilation, practice sessions, and chess-rules glue.
//!
//! ## Module overview
//!
//! | Module       | Purpose |
//! |--------------|---------|
//! | `models`     | Shared types: sides, opening families, variations, SAN helpers |
//! | `catalog`    | Immutable catalog of opening families, built-in copy, search |
//! | `book`       | Prefix-tree compilation and the read-only book queries |
//! | `rules`      | `RulesEngine` trait and the `shakmaty`-backed implementation |
//! | `session`    | Turn-taking practice state machine, scoring and hints |
//! | `config`     | Session tunables (opponent delay) |
//! | `board_view` | JSON payload for a board widget |
//! | `error`      | Crate error type |

pub mod board_view;
pub mod book;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod rules;
pub mod session;

// Re-export the public API surface so callers can use
// `opening_engine::BookTree` without reaching into sub-modules.
pub use board_view::to_board_state;
pub use book::{BookTree, PositionInfo, TrieNode};
pub use catalog::Catalog;
pub use config::PracticeConfig;
pub use error::{Error, Result};
pub use models::{same_move, strip_annotations, MoveToken, OpeningFamily, Side, Variation};
pub use rules::{AppliedMove, GameStatus, LegalMove, RulesEngine, ShakmatyEngine};
pub use session::{
    Hint, MoveVerdict, OpponentReply, Phase, PracticeSession, PracticeSessionState, Progress,
    ScheduledMove, SessionSummary,
};
