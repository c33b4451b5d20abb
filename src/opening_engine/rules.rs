//! Chess rules collaborator.
//!
//! The drill never decides chess legality itself. It talks to a [`RulesEngine`]
//! that owns one live position: apply a move, undo it, list legal moves and
//! report the game status. [`ShakmatyEngine`] is the production implementation.

use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::{Chess, Color, EnPassantMode, Position, Square};

use crate::opening_engine::error::{Error, Result};
use crate::opening_engine::models::Side;

/// A legal move in the current position, with the squares a board widget needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalMove {
    pub san: String,
    pub from: Square,
    pub to: Square,
}

/// Outcome of a successful [`RulesEngine::apply_san`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// Canonical SAN as the engine writes it (including `+` / `#`).
    pub san: String,
    /// Position identifier (FEN) after the move.
    pub position_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    Draw,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }
}

pub trait RulesEngine {
    /// Return to the initial position and forget the undo history.
    fn reset(&mut self);

    /// Apply a SAN move. Trailing `+` / `#` on the input are accepted.
    fn apply_san(&mut self, san: &str) -> Result<AppliedMove>;

    /// Take back the most recent applied move. Returns false if there is none.
    fn undo(&mut self) -> bool;

    fn legal_moves(&self) -> Vec<LegalMove>;

    fn position_id(&self) -> String;

    fn status(&self) -> GameStatus;

    fn side_to_move(&self) -> Side;
}

/// [`RulesEngine`] backed by `shakmaty`, with an undo stack of prior positions.
#[derive(Debug, Clone, Default)]
pub struct ShakmatyEngine {
    position: Chess,
    undo_stack: Vec<Chess>,
}

impl ShakmatyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Number of moves that can currently be undone.
    pub fn ply(&self) -> usize {
        self.undo_stack.len()
    }
}

impl RulesEngine for ShakmatyEngine {
    fn reset(&mut self) {
        self.position = Chess::default();
        self.undo_stack.clear();
    }

    fn apply_san(&mut self, san: &str) -> Result<AppliedMove> {
        let illegal = || Error::IllegalMove { san: san.to_string() };

        let parsed: SanPlus = san.trim().parse().map_err(|_| illegal())?;
        let mv = parsed.san.to_move(&self.position).map_err(|_| illegal())?;

        let mut next = self.position.clone();
        let played = SanPlus::from_move_and_play_unchecked(&mut next, &mv);
        self.undo_stack.push(std::mem::replace(&mut self.position, next));

        Ok(AppliedMove {
            san: played.to_string(),
            position_id: self.position_id(),
        })
    }

    fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                self.position = previous;
                true
            }
            None => false,
        }
    }

    fn legal_moves(&self) -> Vec<LegalMove> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(|m| {
                let from = m.from()?;
                Some(LegalMove {
                    san: San::from_move(&self.position, m).to_string(),
                    from,
                    to: m.to(),
                })
            })
            .collect()
    }

    fn position_id(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    fn status(&self) -> GameStatus {
        if self.position.is_checkmate() {
            GameStatus::Checkmate
        } else if self.position.is_stalemate() {
            GameStatus::Stalemate
        } else if self.position.is_insufficient_material() || self.position.halfmoves() >= 100 {
            GameStatus::Draw
        } else {
            GameStatus::Ongoing
        }
    }

    fn side_to_move(&self) -> Side {
        match self.position.turn() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}
