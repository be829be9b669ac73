//! Starting layouts: the standard game plus small drill positions.

use crate::engine::state::{GameState, STARTING_FEN};
use crate::engine::types::ChessError;

/// Name of the standard layout.
pub const STANDARD: &str = "standard";

/// (name, FEN) for every named layout.
const LAYOUTS: &[(&str, &str)] = &[
    (STANDARD, STARTING_FEN),
    // Knight drill: route the b1 knight; kings keep the position valid.
    ("lesson_knight_1", "4k3/8/8/8/8/8/8/1N2K3 w - - 0 1"),
    ("castling_drill", "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1"),
    ("promotion_drill", "7k/4P3/8/8/8/8/8/4K3 w - - 0 1"),
    // Black to play d7-d5 next to the white pawn on e5.
    ("en_passant_drill", "4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1"),
];

/// Names of all layouts, standard first.
pub fn names() -> impl Iterator<Item = &'static str> {
    LAYOUTS.iter().map(|(name, _)| *name)
}

/// Fresh state for a named layout.
pub fn named(name: &str) -> Result<GameState, ChessError> {
    let (_, fen) = LAYOUTS
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| ChessError::UnknownLayout(name.to_string()))?;
    GameState::from_fen(fen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::Color;

    #[test]
    fn every_layout_parses() {
        for name in names() {
            assert!(named(name).is_ok(), "layout {name} failed to parse");
        }
    }

    #[test]
    fn standard_is_starting_position() {
        assert_eq!(named(STANDARD).unwrap(), GameState::starting());
    }

    #[test]
    fn drill_turn_comes_from_layout() {
        assert_eq!(named("en_passant_drill").unwrap().side_to_move, Color::Black);
    }

    #[test]
    fn unknown_layout_errors() {
        assert_eq!(
            named("lesson_queen_9"),
            Err(ChessError::UnknownLayout("lesson_queen_9".into()))
        );
    }
}
