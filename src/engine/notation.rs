//! Simplified move text and coordinate move parsing.
//!
//! Move text examples: `e2-e4`, `Ng1-f3`, `Bc4xf7`, `O-O`, `e5xd6 e.p.`,
//! `e7-e8=Q`. This is deliberately not SAN: the origin square is always
//! spelled out and no check/mate suffix is added.

use crate::engine::types::{ChessError, PieceType, Special, Square};

// =========================================================================
// Move text
// =========================================================================

/// Render one completed ply.
pub fn move_text(
    kind: PieceType,
    from: Square,
    to: Square,
    special: Special,
    capture: bool,
    promotion: Option<PieceType>,
) -> String {
    match special {
        Special::CastleKingside => return "O-O".into(),
        Special::CastleQueenside => return "O-O-O".into(),
        _ => {}
    }

    let mut text = String::with_capacity(12);
    if kind != PieceType::Pawn {
        text.push(kind.letter());
    }
    text.push_str(&from.to_algebraic());
    text.push(if capture { 'x' } else { '-' });
    text.push_str(&to.to_algebraic());

    if special == Special::EnPassant {
        text.push_str(" e.p.");
    }
    if let Some(promo) = promotion {
        text.push('=');
        text.push(promo.letter());
    }
    text
}

// =========================================================================
// Coordinate input
// =========================================================================

/// Parse coordinate input such as `e2e4` or `e7e8q` into
/// `(from, to, promotion)`.
pub fn parse_coordinate(text: &str) -> Result<(Square, Square, Option<PieceType>), ChessError> {
    let text = text.trim();
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(ChessError::InvalidMoveText(text.to_string()));
    }

    let from = parse_square(&text[0..2])?;
    let to = parse_square(&text[2..4])?;
    let promotion = match text[4..].chars().next() {
        None => None,
        Some(c) => match PieceType::from_char(c.to_ascii_lowercase()) {
            Some((_, kind)) if kind.is_promotion_choice() => Some(kind),
            _ => return Err(ChessError::InvalidPromotion(c.to_string())),
        },
    };
    Ok((from, to, promotion))
}

/// Parse a square name, mapping failure to `InvalidSquare`.
pub fn parse_square(text: &str) -> Result<Square, ChessError> {
    Square::from_algebraic(text).ok_or_else(|| ChessError::InvalidSquare(text.to_string()))
}

/// Parse a promotion choice given as a letter or a word (`q`, `Knight`).
pub fn parse_promotion(text: &str) -> Result<PieceType, ChessError> {
    let lower = text.trim().to_ascii_lowercase();
    let kind = match lower.as_str() {
        "q" | "queen" => PieceType::Queen,
        "r" | "rook" => PieceType::Rook,
        "b" | "bishop" => PieceType::Bishop,
        "n" | "knight" => PieceType::Knight,
        _ => return Err(ChessError::InvalidPromotion(text.trim().to_string())),
    };
    Ok(kind)
}
