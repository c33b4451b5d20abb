use rand::Rng;
use serde_json::{json, Value};
use shakmaty::Square;

use crate::opening_engine::{
    rules::{GameStatus, RulesEngine},
    session::{Phase, PracticeSession},
};

/// Status label the board client shows above the board.
fn status_str(phase: Phase, last_move_correct: Option<bool>) -> &'static str {
    match (phase, last_move_correct) {
        (Phase::Complete, _)                         => "complete",
        (Phase::AwaitingPlayerMove, Some(false))     => "incorrect",
        (Phase::AwaitingPlayerMove, _)               => "your_turn",
        (Phase::AwaitingOpponentMove, _)             => "waiting",
    }
}

fn game_status_str(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Ongoing   => "ongoing",
        GameStatus::Checkmate => "checkmate",
        GameStatus::Stalemate => "stalemate",
        GameStatus::Draw      => "draw",
    }
}

/// Build the highlighted-squares array (lower-case square names, e.g. `"g1"`).
fn highlights(squares: &[Square]) -> Value {
    Value::Array(squares.iter().map(|sq| json!(sq.to_string())).collect())
}

/// Map a session to the JSON object the board widget consumes.
///
/// `orientation` follows the player's colour so their pieces sit at the bottom.
pub fn to_board_state<E: RulesEngine, R: Rng>(session: &PracticeSession<E, R>) -> Value {
    let state = session.state();
    let engine = session.engine();
    let progress = session.progress();
    let squares = session.hint().map(|h| h.from_squares.as_slice()).unwrap_or(&[]);

    json!({
        "positionId": engine.position_id(),
        "orientation": state.player_color.to_string(),
        "sideToMove": engine.side_to_move().to_string(),
        "status": status_str(session.phase(), state.last_move_correct),
        "gameStatus": game_status_str(engine.status()),
        "highlightSquares": highlights(squares),
        "family": session.book().family(),
        "variation": state.current_variation_label,
        "progress": {
            "played": progress.plies_played,
            "remaining": progress.plies_remaining
        },
        "stats": {
            "correct": state.corrects,
            "mistakes": state.mistakes,
            "hintsUsed": state.hints_used
        },
        "moves": state.moves_played
    })
}
