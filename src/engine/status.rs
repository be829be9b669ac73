//! Terminal status classification.
//!
//! Priority: no legal move decides checkmate or stalemate; otherwise the
//! draw rules are tried in order (50-move, threefold, insufficient material)
//! and the first match wins; otherwise the game is in progress, flagged as
//! check when the side to move is attacked.

use crate::engine::attacks;
use crate::engine::material;
use crate::engine::movegen;
use crate::engine::state::GameState;
use crate::engine::types::{DrawReason, GameStatus};

/// Half-moves without capture or pawn move that end the game.
pub const FIFTY_MOVE_PLIES: u16 = 100;

/// Occurrences of one position that end the game.
pub const REPETITION_LIMIT: u32 = 3;

/// Classify `state` for its side to move.
pub fn classify(state: &GameState) -> GameStatus {
    let in_check = attacks::in_check(state);

    if !movegen::has_legal_moves(state) {
        return if in_check {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        };
    }

    if state.halfmove_clock >= FIFTY_MOVE_PLIES {
        return GameStatus::Draw(DrawReason::FiftyMove);
    }

    if state.repetition_count() >= REPETITION_LIMIT {
        return GameStatus::Draw(DrawReason::Threefold);
    }

    if material::is_insufficient(&state.board) {
        return GameStatus::Draw(DrawReason::Insufficient);
    }

    if in_check {
        GameStatus::Check
    } else {
        GameStatus::InProgress
    }
}
