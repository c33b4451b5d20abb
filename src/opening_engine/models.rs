use std::fmt;
use serde::{Deserialize, Serialize};

/// A single move in standard algebraic notation, e.g. `"Nf3"`, `"O-O"`, `"Bxd3+"`.
pub type MoveToken = String;

// ---------------------------------------------------------------------------
// Sides and ply parity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Side to move after `ply` half-moves from the initial position.
    pub fn to_move_at(ply: usize) -> Side {
        if ply % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog records
// ---------------------------------------------------------------------------

/// One named line inside a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub name: String,
    #[serde(rename = "moves")]
    pub move_sequence: Vec<MoveToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Variation {
    pub fn new(name: impl Into<String>, moves: &[&str]) -> Self {
        Variation {
            name: name.into(),
            move_sequence: moves.iter().map(|m| m.to_string()).collect(),
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Number of plies in this line played by `side`.
    pub fn plies_for(&self, side: Side) -> usize {
        (0..self.move_sequence.len())
            .filter(|&ply| Side::to_move_at(ply) == side)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningFamily {
    pub name: String,
    #[serde(rename = "eco")]
    pub eco_code: String,
    #[serde(default)]
    pub description: String,
    pub default_color: Side,
    pub variations: Vec<Variation>,
}

impl OpeningFamily {
    pub fn variation_count(&self) -> usize {
        self.variations.len()
    }

    /// True if the family name, ECO code or any variation name contains `query`
    /// (case-insensitive). An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&q)
            || self.eco_code.to_lowercase().contains(&q)
            || self.variations.iter().any(|v| v.name.to_lowercase().contains(&q))
    }
}

// ---------------------------------------------------------------------------
// SAN helpers
// ---------------------------------------------------------------------------

/// Strip trailing check / mate annotations (`+`, `#`) from a SAN token.
pub fn strip_annotations(san: &str) -> &str {
    san.trim_end_matches(['+', '#'])
}

/// True if two tokens name the same move once annotations are ignored.
pub fn same_move(a: &str, b: &str) -> bool {
    strip_annotations(a) == strip_annotations(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_alternates_starting_with_white() {
        assert_eq!(Side::to_move_at(0), Side::White);
        assert_eq!(Side::to_move_at(1), Side::Black);
        assert_eq!(Side::to_move_at(6), Side::White);
        assert_eq!(Side::White.opposite(), Side::Black);
    }

    #[test]
    fn annotations_are_stripped_from_the_end_only() {
        assert_eq!(strip_annotations("Bb4+"), "Bb4");
        assert_eq!(strip_annotations("Qxf7#"), "Qxf7");
        assert_eq!(strip_annotations("Nf3"), "Nf3");
        assert!(same_move("Bxd2+", "Bxd2"));
        assert!(!same_move("Bxd2", "Bxd3"));
    }

    #[test]
    fn plies_for_counts_each_side() {
        let v = Variation::new("Italian", &["e4", "e5", "Nf3", "Nc6", "Bc4"]);
        assert_eq!(v.plies_for(Side::White), 3);
        assert_eq!(v.plies_for(Side::Black), 2);
    }

    #[test]
    fn family_deserializes_from_catalog_json() {
        let json = r#"{
            "name": "Italian Game",
            "eco": "C50",
            "description": "Bc4 against e5.",
            "defaultColor": "white",
            "variations": [
                { "name": "Giuoco Piano", "moves": ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"] }
            ]
        }"#;
        let family: OpeningFamily = serde_json::from_str(json).unwrap();
        assert_eq!(family.eco_code, "C50");
        assert_eq!(family.default_color, Side::White);
        assert_eq!(family.variations[0].move_sequence.len(), 6);
        assert!(family.variations[0].explanation.is_none());
        assert!(family.matches("piano"));
        assert!(family.matches("c50"));
        assert!(!family.matches("sicilian"));
    }
}
