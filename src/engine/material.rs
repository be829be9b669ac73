//! Insufficient-material detection.
//!
//! Flags: bare kings, a single minor piece, and any number of bishops that
//! all stand on one square colour. Everything else counts as sufficient,
//! including two knights against a bare king.

use crate::engine::board::Board;
use crate::engine::types::PieceType;

/// Whether neither side can possibly mate with the material on `board`.
pub fn is_insufficient(board: &Board) -> bool {
    let others: Vec<_> = board
        .pieces()
        .filter(|(_, p)| p.kind != PieceType::King)
        .collect();

    // Any pawns, rooks, or queens → sufficient.
    if others.iter().any(|(_, p)| {
        matches!(
            p.kind,
            PieceType::Pawn | PieceType::Rook | PieceType::Queen
        )
    }) {
        return false;
    }

    match others.as_slice() {
        // K vs K
        [] => true,
        // K+minor vs K
        [_] => true,
        [(first, _), ..] => others.iter().all(|(sq, p)| {
            p.kind == PieceType::Bishop && sq.is_light() == first.is_light()
        }),
    }
}
