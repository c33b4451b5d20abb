//! Practice session: the turn-taking drill over a book tree.
//!
//! ## Phases
//!
//! | Phase | Left by |
//! |-------|---------|
//! | `AwaitingOpponentMove` | the scheduled book reply firing (`poll` / `fire`) |
//! | `AwaitingPlayerMove` | a correct `submit_move` (off-book attempts stay here) |
//! | `Complete` | `restart`, `set_player_color`, `set_book` |
//!
//! Whose turn it is always comes from ply parity (`moves_played.len() % 2 == 0`
//! means White) compared with the player's colour, never from the previous
//! phase, so consecutive plies for one side are handled the same way as
//! ordinary alternation.
//!
//! ## Timing
//!
//! The session owns at most one [`ScheduledMove`]. Nothing runs in the
//! background: the caller passes `now` into every transition, polls with
//! [`PracticeSession::poll`], or arms its own timer from
//! [`PracticeSession::next_deadline`] and hands the ticket back to
//! [`PracticeSession::fire`]. Every reset clears the slot and bumps the epoch
//! before touching any other state, so a ticket from an earlier run is refused.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use shakmaty::Square;

use crate::opening_engine::{
    book::BookTree,
    config::PracticeConfig,
    error::{Error, Result},
    models::{same_move, MoveToken, Side},
    rules::{RulesEngine, ShakmatyEngine},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    AwaitingOpponentMove,
    AwaitingPlayerMove,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSessionState {
    pub moves_played: Vec<MoveToken>,
    pub mistakes: u32,
    pub corrects: u32,
    pub current_variation_label: Option<String>,
    pub completed: bool,
    pub player_color: Side,
    /// Outcome of the player's most recent attempt; `None` before the first one.
    pub last_move_correct: Option<bool>,
    pub hint_shown: bool,
    pub hints_used: u32,
}

impl PracticeSessionState {
    fn new(player_color: Side) -> Self {
        PracticeSessionState {
            moves_played: Vec::new(),
            mistakes: 0,
            corrects: 0,
            current_variation_label: None,
            completed: false,
            player_color,
            last_move_correct: None,
            hint_shown: false,
            hints_used: 0,
        }
    }
}

/// A pending book reply. Only the ticket matching the session's current
/// pending move is honoured by [`PracticeSession::fire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledMove {
    pub due: Instant,
    pub epoch: u64,
}

/// Result of a legal player move checked against the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveVerdict {
    /// On book. `book_move` is the token as written in the book.
    Correct { book_move: MoveToken },
    /// Legal but not in the trained line; the move has been taken back.
    OffBook { attempted: String },
}

impl MoveVerdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, MoveVerdict::Correct { .. })
    }
}

/// A book move played by the scripted opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpponentReply {
    pub san: MoveToken,
    pub position_id: String,
}

/// Squares holding the piece(s) that have a book move, without destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub from_squares: Vec<Square>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub plies_played: usize,
    /// Longest book continuation from here.
    pub plies_remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub family: String,
    pub variation: Option<String>,
    pub corrects: u32,
    pub mistakes: u32,
    pub hints_used: u32,
    pub plies: usize,
    pub completed: bool,
}

impl SessionSummary {
    /// Share of attempts that were on book; 1.0 when nothing was attempted.
    pub fn accuracy(&self) -> f64 {
        let attempts = self.corrects + self.mistakes;
        if attempts == 0 {
            1.0
        } else {
            f64::from(self.corrects) / f64::from(attempts)
        }
    }
}

pub struct PracticeSession<E = ShakmatyEngine, R = StdRng> {
    book: Arc<BookTree>,
    engine: E,
    rng: R,
    config: PracticeConfig,
    state: PracticeSessionState,
    phase: Phase,
    pending: Option<ScheduledMove>,
    epoch: u64,
    hint: Option<Hint>,
}

impl PracticeSession<ShakmatyEngine, StdRng> {
    /// Start a session on a fresh `shakmaty` board with an entropy-seeded RNG.
    pub fn new(book: Arc<BookTree>, player_color: Side, config: PracticeConfig, now: Instant) -> Self {
        Self::with_parts(
            book,
            ShakmatyEngine::new(),
            StdRng::from_entropy(),
            player_color,
            config,
            now,
        )
    }

    /// Same as [`PracticeSession::new`] with a reproducible opponent.
    pub fn seeded(
        book: Arc<BookTree>,
        player_color: Side,
        config: PracticeConfig,
        seed: u64,
        now: Instant,
    ) -> Self {
        Self::with_parts(
            book,
            ShakmatyEngine::new(),
            StdRng::seed_from_u64(seed),
            player_color,
            config,
            now,
        )
    }
}

impl<E: RulesEngine, R: Rng> PracticeSession<E, R> {
    pub fn with_parts(
        book: Arc<BookTree>,
        engine: E,
        rng: R,
        player_color: Side,
        config: PracticeConfig,
        now: Instant,
    ) -> Self {
        let mut session = PracticeSession {
            book,
            engine,
            rng,
            config,
            state: PracticeSessionState::new(player_color),
            phase: Phase::Complete,
            pending: None,
            epoch: 0,
            hint: None,
        };
        session.restart(now);
        session
    }

    // -- accessors ----------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &PracticeSessionState {
        &self.state
    }

    pub fn book(&self) -> &Arc<BookTree> {
        &self.book
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &PracticeConfig {
        &self.config
    }

    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    pub fn is_player_turn(&self) -> bool {
        self.phase == Phase::AwaitingPlayerMove
    }

    /// The pending opponent move, if one is scheduled.
    pub fn next_deadline(&self) -> Option<ScheduledMove> {
        self.pending
    }

    // -- resets -------------------------------------------------------------

    /// Start the drill over from the initial position, keeping book and colour.
    pub fn restart(&mut self, now: Instant) {
        self.cancel_pending();
        self.engine.reset();
        self.hint = None;
        self.state = PracticeSessionState::new(self.state.player_color);

        if self.book.root().has_children() {
            self.enter_turn(now);
        } else {
            debug!("book '{}' has no moves", self.book.family());
            self.complete();
        }
    }

    pub fn set_player_color(&mut self, color: Side, now: Instant) {
        self.cancel_pending();
        self.state.player_color = color;
        self.restart(now);
    }

    /// Switch to another family or variation selection.
    pub fn set_book(&mut self, book: Arc<BookTree>, now: Instant) {
        self.cancel_pending();
        self.book = book;
        self.restart(now);
    }

    fn cancel_pending(&mut self) {
        if let Some(stale) = self.pending.take() {
            debug!("cancelled opponent move scheduled for epoch {}", stale.epoch);
        }
        self.epoch += 1;
    }

    // -- opponent -----------------------------------------------------------

    /// Play the scheduled opponent move if it is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Result<Option<OpponentReply>> {
        match self.pending {
            Some(scheduled) if scheduled.due <= now => self.play_opponent_move(now),
            _ => Ok(None),
        }
    }

    /// Play the opponent move for `ticket`, as handed out by
    /// [`PracticeSession::next_deadline`]. Tickets from before a reset, or
    /// already consumed, are ignored.
    pub fn fire(&mut self, ticket: ScheduledMove, now: Instant) -> Result<Option<OpponentReply>> {
        if self.pending != Some(ticket) {
            debug!("ignoring stale opponent ticket (epoch {})", ticket.epoch);
            return Ok(None);
        }
        self.play_opponent_move(now)
    }

    fn play_opponent_move(&mut self, now: Instant) -> Result<Option<OpponentReply>> {
        self.pending = None;
        self.ensure_on_book()?;

        let token = match self.book.pick_random_move(&self.state.moves_played, &mut self.rng) {
            Some(token) => token.to_string(),
            None => {
                self.complete();
                return Ok(None);
            }
        };

        let applied = match self.engine.apply_san(&token) {
            Ok(applied) => applied,
            Err(err) => {
                error!("book move {} refused by the rules engine: {}", token, err);
                let history = self.state.moves_played.clone();
                self.complete();
                return Err(Error::BookMoveRejected { san: token, history });
            }
        };

        debug!("opponent plays {} at ply {}", token, self.state.moves_played.len());
        self.state.moves_played.push(token.clone());
        self.note_variation();
        self.settle(now)?;

        Ok(Some(OpponentReply {
            san: token,
            position_id: applied.position_id,
        }))
    }

    // -- player -------------------------------------------------------------

    /// Apply the player's move and grade it against the book.
    ///
    /// Moves the rules engine refuses come back as [`Error::IllegalMove`] and
    /// change nothing. Legal off-book moves are taken back and counted as a
    /// mistake.
    pub fn submit_move(&mut self, candidate: &str, now: Instant) -> Result<MoveVerdict> {
        if self.phase != Phase::AwaitingPlayerMove {
            return Err(Error::NotAwaitingPlayer { phase: self.phase });
        }
        self.ensure_on_book()?;

        let applied = self.engine.apply_san(candidate)?;
        let history = &self.state.moves_played;
        let book_move = self
            .book
            .book_move_for(history, &applied.san)
            .or_else(|| self.book.book_move_for(history, candidate))
            .map(str::to_string);

        let Some(book_move) = book_move else {
            self.engine.undo();
            self.state.mistakes += 1;
            self.state.last_move_correct = Some(false);
            debug!("off-book attempt {} (mistakes: {})", applied.san, self.state.mistakes);
            return Ok(MoveVerdict::OffBook { attempted: applied.san });
        };

        self.state.moves_played.push(book_move.clone());
        self.state.corrects += 1;
        self.state.last_move_correct = Some(true);
        self.state.hint_shown = false;
        self.hint = None;
        self.note_variation();
        self.settle(now)?;

        Ok(MoveVerdict::Correct { book_move })
    }

    /// Source squares of the pieces that have a book move right now.
    pub fn request_hint(&mut self) -> Result<Hint> {
        if self.phase != Phase::AwaitingPlayerMove {
            return Err(Error::NotAwaitingPlayer { phase: self.phase });
        }
        let node = self
            .book
            .node_at(&self.state.moves_played)
            .ok_or_else(|| self.diverged())?;

        let mut from_squares: Vec<Square> = Vec::new();
        for legal in self.engine.legal_moves() {
            let on_book = node.children().any(|(mv, _)| same_move(mv, &legal.san));
            if on_book && !from_squares.contains(&legal.from) {
                from_squares.push(legal.from);
            }
        }

        if !self.state.hint_shown {
            self.state.hint_shown = true;
            self.state.hints_used += 1;
        }
        let hint = Hint { from_squares };
        self.hint = Some(hint.clone());
        Ok(hint)
    }

    // -- reporting ----------------------------------------------------------

    pub fn progress(&self) -> Progress {
        Progress {
            plies_played: self.state.moves_played.len(),
            plies_remaining: self
                .book
                .max_depth_from(&self.state.moves_played)
                .unwrap_or(0),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            family: self.book.family().to_string(),
            variation: self.state.current_variation_label.clone(),
            corrects: self.state.corrects,
            mistakes: self.state.mistakes,
            hints_used: self.state.hints_used,
            plies: self.state.moves_played.len(),
            completed: self.state.completed,
        }
    }

    // -- transitions --------------------------------------------------------

    /// Pick the next phase after a move has been appended.
    fn settle(&mut self, now: Instant) -> Result<()> {
        let node = self
            .book
            .node_at(&self.state.moves_played)
            .ok_or_else(|| self.diverged())?;
        if node.has_children() {
            self.enter_turn(now);
        } else {
            self.complete();
        }
        Ok(())
    }

    fn enter_turn(&mut self, now: Instant) {
        let to_move = Side::to_move_at(self.state.moves_played.len());
        if to_move == self.state.player_color {
            self.phase = Phase::AwaitingPlayerMove;
        } else {
            self.phase = Phase::AwaitingOpponentMove;
            self.pending = Some(ScheduledMove {
                due: now + self.config.opponent_delay(),
                epoch: self.epoch,
            });
        }
        debug!("{:?} at ply {}", self.phase, self.state.moves_played.len());
    }

    fn complete(&mut self) {
        self.pending = None;
        self.phase = Phase::Complete;
        self.state.completed = true;
        info!(
            "drill '{}' complete after {} plies: {} correct, {} mistakes",
            self.book.family(),
            self.state.moves_played.len(),
            self.state.corrects,
            self.state.mistakes
        );
    }

    fn note_variation(&mut self) {
        let label = self
            .book
            .position_info(&self.state.moves_played)
            .and_then(|info| info.variation_name);
        if let Some(label) = label {
            self.state.current_variation_label = Some(label.to_string());
        }
    }

    fn ensure_on_book(&self) -> Result<()> {
        match self.book.node_at(&self.state.moves_played) {
            Some(_) => Ok(()),
            None => Err(self.diverged()),
        }
    }

    fn diverged(&self) -> Error {
        error!(
            "session history [{}] left the book for '{}'",
            self.state.moves_played.join(" "),
            self.book.family()
        );
        Error::DivergedHistory {
            history: self.state.moves_played.clone(),
        }
    }
}
