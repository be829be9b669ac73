//! Attack detection.
//!
//! A square is attacked by a side when any of that side's pieces, run
//! through the generator in attack-only mode, lands on it. The same query
//! answers "is the king in check" and "may the king castle across here".

use crate::engine::board::Board;
use crate::engine::movegen;
use crate::engine::state::GameState;
use crate::engine::types::{Color, Square};

/// Is `sq` attacked by any piece of colour `by` on `board`?
pub fn is_square_attacked(board: &Board, sq: Square, by: Color, state: &GameState) -> bool {
    board.pieces_of(by).any(|(from, _)| {
        movegen::pseudo_moves(board, from, by, state, true)
            .iter()
            .any(|m| m.to == sq)
    })
}

/// Is the king of `side` attacked on `board`? A side without a king is never in check.
pub fn king_attacked(board: &Board, side: Color, state: &GameState) -> bool {
    board
        .king_sq(side)
        .is_some_and(|king| is_square_attacked(board, king, !side, state))
}

/// Is the side to move in check?
pub fn in_check(state: &GameState) -> bool {
    king_attacked(&state.board, state.side_to_move, state)
}

// =========================================================================
// Tests
// =========================================================================
