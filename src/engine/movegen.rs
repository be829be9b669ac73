//! Move generation.
//!
//! Pipeline:
//!   1. Generate pseudo-legal moves for one piece (ignoring king safety).
//!   2. Filter: play the move on a scratch board, verify the mover's king
//!      is not attacked.
//!
//! The same per-piece rules run in an attack-only mode that feeds the attack
//! detector, so "where can this piece move" and "what does this piece
//! threaten" come from one rule set.

use crate::engine::attacks;
use crate::engine::board::{Board, king_home, rook_home};
use crate::engine::state::GameState;
use crate::engine::types::{Color, Move, Piece, PieceType, Special, Square};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

// =========================================================================
// Public API
// =========================================================================

/// Candidate moves for the `side` piece on `from`, ignoring king safety.
///
/// With `attack_only` set, pawns yield only their two diagonal squares and
/// kings yield no castling candidates: the result is the set of squares the
/// piece threatens. Returns nothing when `from` holds no `side` piece.
pub fn pseudo_moves(
    board: &Board,
    from: Square,
    side: Color,
    state: &GameState,
    attack_only: bool,
) -> Vec<Move> {
    let mut moves = Vec::with_capacity(28);
    let Some(piece) = board.piece_at(from) else {
        return moves;
    };
    if piece.color != side {
        return moves;
    }

    match piece.kind {
        PieceType::Pawn => generate_pawn_moves(board, from, side, state, attack_only, &mut moves),
        PieceType::Knight => generate_steps(board, from, side, &KNIGHT_OFFSETS, &mut moves),
        PieceType::King => {
            generate_steps(board, from, side, &KING_OFFSETS, &mut moves);
            if !attack_only {
                generate_castling_moves(board, from, side, state, &mut moves);
            }
        }
        PieceType::Bishop => generate_rays(board, from, side, &BISHOP_DIRECTIONS, &mut moves),
        PieceType::Rook => generate_rays(board, from, side, &ROOK_DIRECTIONS, &mut moves),
        PieceType::Queen => {
            generate_rays(board, from, side, &ROOK_DIRECTIONS, &mut moves);
            generate_rays(board, from, side, &BISHOP_DIRECTIONS, &mut moves);
        }
    }
    moves
}

/// Legal moves for the `side` piece on `from`.
///
/// Each pseudo move is played on a copy of `board` (pawns reaching the last
/// rank become queens there, which cannot change whether the own king is
/// attacked) and kept only if the mover's king is then safe.
pub fn legal_moves(board: &Board, side: Color, from: Square, state: &GameState) -> Vec<Move> {
    pseudo_moves(board, from, side, state, false)
        .into_iter()
        .filter(|mv| {
            let mut scratch = *board;
            scratch.play(mv, Some(PieceType::Queen));
            match scratch.king_sq(side) {
                Some(king) => !attacks::is_square_attacked(&scratch, king, !side, state),
                None => true,
            }
        })
        .collect()
}

/// Legal moves from `from` for the side to move in `state`.
pub fn legal_moves_from(state: &GameState, from: Square) -> Vec<Move> {
    legal_moves(&state.board, state.side_to_move, from, state)
}

/// Every legal move for the side to move.
pub fn all_legal_moves(state: &GameState) -> Vec<Move> {
    state
        .board
        .pieces_of(state.side_to_move)
        .flat_map(|(sq, _)| legal_moves_from(state, sq))
        .collect()
}

/// Whether the side to move has at least one legal move.
pub fn has_legal_moves(state: &GameState) -> bool {
    state
        .board
        .pieces_of(state.side_to_move)
        .any(|(sq, _)| !legal_moves_from(state, sq).is_empty())
}

// =========================================================================
// Pawn moves
// =========================================================================

fn generate_pawn_moves(
    board: &Board,
    from: Square,
    us: Color,
    state: &GameState,
    attack_only: bool,
    moves: &mut Vec<Move>,
) {
    let fwd = us.forward();
    let promo_rank = us.promotion_rank();
    let tag = |to: Square| {
        if to.rank() == promo_rank {
            Special::Promotion
        } else {
            Special::None
        }
    };

    // --- Diagonals: threats always, captures when occupied ---
    for df in [-1, 1] {
        let Some(to) = from.offset(fwd, df) else {
            continue;
        };
        if attack_only {
            moves.push(Move::new(from, to));
        } else if board.is_color(to, !us) {
            moves.push(Move::with_special(from, to, tag(to)));
        } else if state.en_passant == Some(to) {
            moves.push(Move::with_special(from, to, Special::EnPassant));
        }
    }
    if attack_only {
        return;
    }

    // --- Single push ---
    let Some(one) = from.offset(fwd, 0) else {
        return;
    };
    if !board.is_empty(one) {
        return;
    }
    moves.push(Move::with_special(from, one, tag(one)));

    // --- Double push ---
    if from.rank() == us.pawn_rank()
        && let Some(two) = from.offset(2 * fwd, 0)
        && board.is_empty(two)
    {
        moves.push(Move::new(from, two));
    }
}

// =========================================================================
// Knight / king steps
// =========================================================================

fn generate_steps(
    board: &Board,
    from: Square,
    us: Color,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(dr, df) in offsets {
        if let Some(to) = from.offset(dr, df)
            && !board.is_color(to, us)
        {
            moves.push(Move::new(from, to));
        }
    }
}

// =========================================================================
// Slider moves (bishop, rook, queen)
// =========================================================================

fn generate_rays(
    board: &Board,
    from: Square,
    us: Color,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(dr, df) in directions {
        let mut cursor = from;
        while let Some(to) = cursor.offset(dr, df) {
            match board.piece_at(to) {
                None => moves.push(Move::new(from, to)),
                Some(p) => {
                    if p.color != us {
                        moves.push(Move::new(from, to));
                    }
                    break;
                }
            }
            cursor = to;
        }
    }
}

// =========================================================================
// Castling
// =========================================================================

fn generate_castling_moves(
    board: &Board,
    king_sq: Square,
    us: Color,
    state: &GameState,
    moves: &mut Vec<Move>,
) {
    if king_sq != king_home(us) {
        return;
    }
    // King path: the square it stands on, the one it crosses, the one it lands on.
    try_castle(board, us, state, true, &[5, 6], [4, 5, 6], moves);
    try_castle(board, us, state, false, &[1, 2, 3], [4, 3, 2], moves);
}

fn try_castle(
    board: &Board,
    us: Color,
    state: &GameState,
    kingside: bool,
    between: &[u8],
    king_path: [u8; 3],
    moves: &mut Vec<Move>,
) {
    let rank = us.home_rank();
    let at = |file: u8| Square::from_file_rank(file, rank);

    let rights = state.castling_rights;
    let has_right = if kingside {
        rights.can_castle_kingside(us)
    } else {
        rights.can_castle_queenside(us)
    };
    if !has_right {
        return;
    }
    if board.piece_at(rook_home(us, kingside)) != Some(Piece::new(us, PieceType::Rook)) {
        return;
    }
    if !between.iter().all(|&f| board.is_empty(at(f))) {
        return;
    }
    if king_path
        .iter()
        .any(|&f| attacks::is_square_attacked(board, at(f), !us, state))
    {
        return;
    }

    let special = if kingside {
        Special::CastleKingside
    } else {
        Special::CastleQueenside
    };
    moves.push(Move::with_special(at(king_path[0]), at(king_path[2]), special));
}

// =========================================================================
// Tests
// =========================================================================
