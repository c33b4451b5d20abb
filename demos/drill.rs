//! Walkthrough of a full practice drill.
//!
//! Run with: `cargo run --example drill -- "Sicilian Defense" black`
//!
//! 1. **Catalog**: lists the built-in families with their ECO codes.
//! 2. **Drill**: builds the book for the chosen family and plays the
//!    player's side from the book itself, slipping in one off-book move at the
//!    start to show the rollback, and asking for a hint before each move.
//! 3. **Summary**: prints the completion stats and the board payload the UI
//!    would receive.
//!
//! Arguments are optional: family name (default "Italian Game") and colour
//! (default: the family's own `defaultColor`).

use std::sync::Arc;
use std::time::Instant;

use opening_drill::{
    to_board_state, Catalog, MoveVerdict, Phase, PracticeConfig, PracticeSession, Side,
};

fn main() -> opening_drill::Result<()> {
    let mut args = std::env::args().skip(1);
    let family_name = args.next().unwrap_or_else(|| "Italian Game".to_string());
    let colour_arg = args.next();

    // ── Catalog ──────────────────────────────────────────────────────────
    let catalog = Catalog::builtin()?;
    println!();
    println!("══ Opening catalog ({} families) ══", catalog.len());
    for family in catalog.families() {
        println!(
            "  {:<4} {:<24} {} variations, plays as {}",
            family.eco_code,
            family.name,
            family.variation_count(),
            family.default_color
        );
    }

    let family = catalog
        .find(&family_name)
        .ok_or_else(|| opening_drill::Error::UnknownFamily { name: family_name.clone() })?;
    let colour = match colour_arg.as_deref() {
        Some("white") => Side::White,
        Some("black") => Side::Black,
        _ => family.default_color,
    };

    // ── Drill ────────────────────────────────────────────────────────────
    let book = Arc::new(catalog.book(&family.name, None)?);
    println!();
    println!(
        "══ Drilling {} as {} ({} lines, {} positions) ══",
        family.name,
        colour,
        book.line_count(),
        book.node_count()
    );

    let mut now = Instant::now();
    let mut session = PracticeSession::seeded(Arc::clone(&book), colour, PracticeConfig::default(), 7, now);
    let mut tried_mistake = false;

    while session.phase() != Phase::Complete {
        match session.phase() {
            Phase::AwaitingOpponentMove => {
                if let Some(ticket) = session.next_deadline() {
                    now = ticket.due;
                }
                if let Some(reply) = session.poll(now)? {
                    println!("  opponent  {}", reply.san);
                }
            }
            Phase::AwaitingPlayerMove => {
                let hint = session.request_hint()?;
                let squares: Vec<String> = hint.from_squares.iter().map(|s| s.to_string()).collect();
                println!("  hint      move from {}", squares.join(" / "));

                if !tried_mistake {
                    tried_mistake = true;
                    if let Ok(MoveVerdict::OffBook { attempted }) = session.submit_move("a3", now) {
                        println!("  you       {attempted}  ✗ not in the book, taken back");
                    }
                    if session.phase() != Phase::AwaitingPlayerMove {
                        continue;
                    }
                }

                let history = session.state().moves_played.clone();
                let choice = book
                    .valid_moves(&history)
                    .first()
                    .map(|mv| mv.to_string())
                    .unwrap_or_default();
                if let MoveVerdict::Correct { book_move } = session.submit_move(&choice, now)? {
                    println!("  you       {book_move}  ✓");
                }
            }
            Phase::Complete => {}
        }
    }

    // ── Summary ──────────────────────────────────────────────────────────
    let summary = session.summary();
    println!();
    println!("══ Complete ══");
    println!(
        "  Line: {}",
        summary.variation.as_deref().unwrap_or("(unnamed)")
    );
    println!(
        "  Correct: {}  Mistakes: {}  Hints: {}  Accuracy: {:.0}%",
        summary.corrects,
        summary.mistakes,
        summary.hints_used,
        summary.accuracy() * 100.0
    );
    println!();
    println!("══ Board payload ══");
    println!("{:#}", to_board_state(&session));
    Ok(())
}
