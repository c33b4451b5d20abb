//! # opening_drill
//!
//! An offline chess-opening trainer: browse named opening lines, then practise
//! playing them from memory against a scripted "book" opponent.
//!
//! ## How it works
//!
//! 1. Load a [`Catalog`] of opening families (the bundled one via
//!    [`Catalog::builtin`], or your own JSON with [`Catalog::from_path`]).
//! 2. Compile a family into a [`BookTree`], a prefix tree that merges every
//!    variation, so overlapping lines share their common moves. Pass a
//!    variation index to drill a single line.
//! 3. Start a [`PracticeSession`] with the tree and a colour. The session
//!    owns a chess position (via [`RulesEngine`]), plays book replies for the
//!    opponent after a short delay, and grades every player move: on book it
//!    advances, off book it is taken back and counted as a mistake.
//! 4. When no book move is left the session is [`Phase::Complete`] and
//!    [`PracticeSession::summary`] reports corrects, mistakes and hints.
//!
//! ## Key features
//!
//! - **Shared books**: a built tree is immutable; wrap it in an `Arc` and run
//!   as many sessions against it as you like, on any thread.
//! - **Deterministic opponents**: [`PracticeSession::seeded`] (or any `Rng`
//!   through [`PracticeSession::with_parts`]) reproduces the same replies.
//! - **Caller-driven time**: every transition takes `now`; the pending
//!   opponent reply is fired by [`PracticeSession::poll`] and dropped by any
//!   restart, colour change or book change.
//! - **Hints without spoilers**: [`PracticeSession::request_hint`] returns
//!   only the squares of the pieces that have a book move.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//! use opening_drill::{Catalog, Phase, PracticeConfig, PracticeSession, Side};
//!
//! let catalog = Catalog::builtin().unwrap();
//! let book = Arc::new(catalog.book("Italian Game", Some(0)).unwrap());
//!
//! let start = Instant::now();
//! let mut session = PracticeSession::seeded(book, Side::White, PracticeConfig::default(), 42, start);
//! assert_eq!(session.phase(), Phase::AwaitingPlayerMove);
//!
//! let verdict = session.submit_move("e4", start).unwrap();
//! assert!(verdict.is_correct());
//!
//! // The book opponent answers once its delay has passed.
//! let reply = session.poll(start + Duration::from_millis(500)).unwrap().unwrap();
//! println!("opponent played {}", reply.san);
//! ```

pub mod opening_engine;

// Convenience re-exports so callers can use `opening_drill::BookTree`
// directly without reaching into `opening_engine::`.
pub use opening_engine::{
    to_board_state, BookTree, Catalog, Error, GameStatus, Hint, MoveVerdict, OpeningFamily,
    OpponentReply, Phase, PositionInfo, PracticeConfig, PracticeSession, PracticeSessionState,
    Progress, Result, RulesEngine, ScheduledMove, SessionSummary, ShakmatyEngine, Side, TrieNode,
    Variation,
};
