//! Canonical position keys and repetition counting.
//!
//! A key is the board in rank-major order (a1 first, one character per
//! square, `.` for empty), then side to move, remaining castling rights and
//! the en-passant file. Two states with equal keys are the same position for
//! the threefold rule.

use std::collections::HashMap;

use crate::engine::state::GameState;
use crate::engine::types::{Color, Square};

/// Build the canonical key for a state.
pub fn position_key(state: &GameState) -> String {
    let mut key = String::with_capacity(64 + 10);
    for rank in 0..8u8 {
        for file in 0..8u8 {
            let sq = Square::from_file_rank(file, rank);
            key.push(match state.board.piece_at(sq) {
                Some(piece) => piece.to_char(),
                None => '.',
            });
        }
    }
    key.push(' ');
    key.push(match state.side_to_move {
        Color::White => 'w',
        Color::Black => 'b',
    });
    key.push(' ');
    key.push_str(&state.castling_rights.to_fen());
    key.push(' ');
    match state.en_passant {
        Some(sq) => key.push((b'a' + sq.file()) as char),
        None => key.push('-'),
    }
    key
}

/// Bump the count for `key`, returning the new count.
pub fn record(table: &mut HashMap<String, u32>, key: String) -> u32 {
    let count = table.entry(key).or_insert(0);
    *count += 1;
    *count
}

/// Occurrences of `key` so far.
pub fn count(table: &HashMap<String, u32>, key: &str) -> u32 {
    table.get(key).copied().unwrap_or(0)
}
