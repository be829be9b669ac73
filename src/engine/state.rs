//! Complete game state and single-ply execution.
//!
//! `GameState` owns the board plus every ancillary field a position needs
//! (side to move, castling rights, en-passant target, clocks, repetition
//! table, cached status, pending promotion, last move text). It is a plain
//! value: history snapshots are deep copies via `Clone`.

use std::collections::HashMap;

use serde::Serialize;

use crate::engine::board::{Board, rook_home};
use crate::engine::notation;
use crate::engine::repetition;
use crate::engine::types::{
    CastlingRights, ChessError, Color, GameStatus, Move, Piece, PieceType, Special, Square,
};

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// PendingPromotion / Ply
// ---------------------------------------------------------------------------

/// A pawn has reached the last rank and waits for the host to pick a piece.
///
/// The unpromoted pawn already stands on `to`; the turn has not passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PendingPromotion {
    pub from: Square,
    pub to: Square,
    pub capture: bool,
}

/// Outcome of executing one move on a `GameState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ply {
    /// Turn passed to the opponent.
    Completed,
    /// Pawn placed on the last rank; a promotion choice is required.
    PromotionRequired,
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    /// Only valid for the ply right after the push.
    pub en_passant: Option<Square>,

    /// Half-move clock for the 50-move rule (reset on pawn move or capture).
    pub halfmove_clock: u16,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u16,

    /// Position key -> number of times reached, initial position included.
    pub repetitions: HashMap<String, u32>,

    /// Status cached by the last query; cleared by every committed ply.
    pub terminal_status: Option<GameStatus>,

    pub pending_promotion: Option<PendingPromotion>,

    /// Move text of the last completed ply.
    pub last_move_text: Option<String>,
}

impl GameState {
    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_parts(Board::starting(), Color::White, CastlingRights::ALL, None, 0, 1)
    }

    /// Build a state from its placement fields and seed the repetition table.
    pub fn from_parts(
        board: Board,
        side_to_move: Color,
        castling_rights: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u16,
        fullmove_number: u16,
    ) -> Self {
        let mut state = GameState {
            board,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
            repetitions: HashMap::new(),
            terminal_status: None,
            pending_promotion: None,
            last_move_text: None,
        };
        state.record_position();
        state
    }

    // -----------------------------------------------------------------------
    // Repetition
    // -----------------------------------------------------------------------

    /// Canonical key of the current position.
    pub fn position_key(&self) -> String {
        repetition::position_key(self)
    }

    /// How many times the current position has been reached.
    pub fn repetition_count(&self) -> u32 {
        repetition::count(&self.repetitions, &self.position_key())
    }

    fn record_position(&mut self) {
        let key = self.position_key();
        repetition::record(&mut self.repetitions, key);
    }

    // -----------------------------------------------------------------------
    // Ply execution
    // -----------------------------------------------------------------------

    /// Execute a move the caller has already checked against the legal set.
    ///
    /// A pawn reaching the last rank without `promotion` stops half way:
    /// it is placed unpromoted, `pending_promotion` is set and the turn does
    /// not pass until [`GameState::complete_promotion`] is called.
    pub fn apply(&mut self, mv: &Move, promotion: Option<PieceType>) -> Result<Ply, ChessError> {
        let mover = self.board.piece_at(mv.from).ok_or_else(|| ChessError::IllegalMove {
            from: mv.from.to_algebraic(),
            to: mv.to.to_algebraic(),
            reason: "no piece on the origin square".into(),
        })?;
        if let Some(kind) = promotion
            && !kind.is_promotion_choice()
        {
            return Err(ChessError::InvalidPromotion(kind.to_string()));
        }

        let target = self.board.piece_at(mv.to);
        let capture = target.is_some() || mv.special == Special::EnPassant;

        // ---- Halfmove clock ----
        if capture || mover.kind == PieceType::Pawn {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        // ---- En passant is only good for one ply ----
        self.en_passant = None;

        // ---- Castling rights ----
        self.update_castling_rights(mover, mv.from, target, mv.to);

        // ---- Move the pieces ----
        let needs_choice =
            mover.kind == PieceType::Pawn && mv.to.rank() == mover.color.promotion_rank();
        self.board.play(mv, promotion);

        if needs_choice && promotion.is_none() {
            self.pending_promotion = Some(PendingPromotion {
                from: mv.from,
                to: mv.to,
                capture,
            });
            self.terminal_status = None;
            return Ok(Ply::PromotionRequired);
        }

        self.finish_ply(mover, mv.from, mv.to, mv.special, capture, promotion);
        Ok(Ply::Completed)
    }

    /// Resolve a pending promotion and pass the turn.
    pub fn complete_promotion(&mut self, kind: PieceType) -> Result<(), ChessError> {
        if !kind.is_promotion_choice() {
            return Err(ChessError::InvalidPromotion(kind.to_string()));
        }
        let pending = self
            .pending_promotion
            .take()
            .ok_or(ChessError::NoPromotionPending)?;

        let color = self.side_to_move;
        self.board.put(pending.to, Piece::new(color, kind));
        self.finish_ply(
            Piece::new(color, PieceType::Pawn),
            pending.from,
            pending.to,
            Special::Promotion,
            pending.capture,
            Some(kind),
        );
        Ok(())
    }

    fn update_castling_rights(
        &mut self,
        mover: Piece,
        from: Square,
        target: Option<Piece>,
        to: Square,
    ) {
        match mover.kind {
            PieceType::King => self.castling_rights.clear_color(mover.color),
            PieceType::Rook => {
                for kingside in [true, false] {
                    if from == rook_home(mover.color, kingside) {
                        self.castling_rights
                            .remove(CastlingRights::flag(mover.color, kingside));
                    }
                }
            }
            _ => {}
        }

        if let Some(captured) = target
            && captured.kind == PieceType::Rook
        {
            for kingside in [true, false] {
                if to == rook_home(captured.color, kingside) {
                    self.castling_rights
                        .remove(CastlingRights::flag(captured.color, kingside));
                }
            }
        }
    }

    fn finish_ply(
        &mut self,
        mover: Piece,
        from: Square,
        to: Square,
        special: Special,
        capture: bool,
        promotion: Option<PieceType>,
    ) {
        // ---- Double pawn push -> set en passant ----
        if mover.kind == PieceType::Pawn && from.rank().abs_diff(to.rank()) == 2 {
            self.en_passant = from.offset(mover.color.forward(), 0);
        }

        self.last_move_text = Some(notation::move_text(
            mover.kind, from, to, special, capture, promotion,
        ));

        if self.side_to_move == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = !self.side_to_move;

        self.record_position();
        self.terminal_status = None;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::starting()
    }
}

// ---------------------------------------------------------------------------
// FEN parsing & generation
// ---------------------------------------------------------------------------

impl GameState {
    /// Parse a FEN string into a `GameState`.
    ///
    /// Validates all 6 fields and ensures exactly one king per side.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        // ----- Field 1: Piece placement -----
        let mut board = Board::empty();
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8; // FEN starts from rank 8
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(ChessError::InvalidFen(format!(
                        "too many squares in rank {}",
                        rank + 1
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid empty count '{ch}' in rank {}",
                            rank + 1
                        )));
                    }
                    file += digit as u8;
                } else if let Some((color, kind)) = PieceType::from_char(ch) {
                    board.put(Square::from_file_rank(file, rank), Piece::new(color, kind));
                    file += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces_of(color)
                .filter(|(_, p)| p.kind == PieceType::King)
                .count();
            if kings != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "{color} has {kings} kings (expected 1)"
                )));
            }
        }

        // ----- Field 2: Side to move -----
        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: Castling availability -----
        let castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::InvalidFen(format!("invalid castling string: '{}'", fields[2]))
        })?;

        // ----- Field 4: En passant target square -----
        let en_passant = if fields[3] == "-" {
            None
        } else {
            let ep_sq = Square::from_algebraic(fields[3]).ok_or_else(|| {
                ChessError::InvalidFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            // The pawn that just double-pushed belongs to the side not to move.
            let pusher = !side_to_move;
            let expected_rank = match side_to_move {
                Color::White => 5,
                Color::Black => 2,
            };
            if ep_sq.rank() != expected_rank {
                return Err(ChessError::InvalidFen(format!(
                    "en passant square {} is not on rank {} with {side_to_move} to move",
                    fields[3],
                    expected_rank + 1
                )));
            }
            let pushed = ep_sq
                .offset(pusher.forward(), 0)
                .and_then(|sq| board.piece_at(sq));
            if pushed != Some(Piece::new(pusher, PieceType::Pawn)) {
                return Err(ChessError::InvalidFen(format!(
                    "en passant square {} has no {pusher} pawn in front of it",
                    fields[3]
                )));
            }
            Some(ep_sq)
        };

        // ----- Fields 5 & 6: clocks -----
        let halfmove_clock = fields[4].parse::<u16>().map_err(|_| {
            ChessError::InvalidFen(format!("invalid halfmove clock: '{}'", fields[4]))
        })?;
        let fullmove_number = fields[5].parse::<u16>().map_err(|_| {
            ChessError::InvalidFen(format!("invalid fullmove number: '{}'", fields[5]))
        })?;
        if fullmove_number == 0 {
            return Err(ChessError::InvalidFen(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        Ok(Self::from_parts(
            board,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        ))
    }

    /// Export the position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                match self.board.piece_at(Square::from_file_rank(file, rank)) {
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });
        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());
        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }
        fen.push_str(&format!(
            " {} {}",
            self.halfmove_clock, self.fullmove_number
        ));
        fen
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn state(fen: &str) -> GameState {
        GameState::from_fen(fen).unwrap()
    }

    #[test]
    fn starting_matches_starting_fen() {
        let s = GameState::starting();
        assert_eq!(s.to_fen(), STARTING_FEN);
        assert_eq!(s, state(STARTING_FEN));
        assert_eq!(s.repetition_count(), 1);
    }

    #[test]
    fn fen_round_trip() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            assert_eq!(state(fen).to_fen(), fen);
        }
    }

    #[test]
    fn fen_rejects_bad_input() {
        assert!(GameState::from_fen("invalid").is_err());
        assert!(GameState::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - e4 0 1").is_err());
        // Target on the mover's own side of the board.
        assert!(GameState::from_fen("4k3/8/8/8/8/8/3PP3/4K3 w - e3 0 1").is_err());
        // Right rank, but no pawn that could have made the double push.
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - e6 0 1").is_err());
        assert!(GameState::from_fen("4k3/8/8/4P3/8/8/8/4K3 w - e6 0 1").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 0").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K2 w - - 0 1").is_err());
    }

    #[test]
    fn fen_accepts_en_passant_behind_pushed_pawn() {
        let s = state("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        assert_eq!(s.en_passant, Some(sq("d6")));
    }

    #[test]
    fn clocks_saturate_instead_of_overflowing() {
        let mut s = state("4k3/8/8/8/8/8/8/4K2R b - - 65535 65535");
        s.apply(&Move::new(sq("e8"), sq("d8")), None).unwrap();
        assert_eq!(s.halfmove_clock, u16::MAX);
        assert_eq!(s.fullmove_number, u16::MAX);
    }

    #[test]
    fn double_push_sets_en_passant_and_resets_clock() {
        let mut s = state("4k3/8/8/8/8/8/4P3/4K3 w - - 7 1");
        let ply = s.apply(&Move::new(sq("e2"), sq("e4")), None).unwrap();
        assert_eq!(ply, Ply::Completed);
        assert_eq!(s.en_passant, Some(sq("e3")));
        assert_eq!(s.halfmove_clock, 0);
        assert_eq!(s.side_to_move, Color::Black);
        assert_eq!(s.fullmove_number, 1);
        assert_eq!(s.last_move_text.as_deref(), Some("e2-e4"));
    }

    #[test]
    fn en_passant_cleared_after_one_ply() {
        let mut s = state("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1");
        s.apply(&Move::new(sq("e8"), sq("d8")), None).unwrap();
        assert_eq!(s.en_passant, None);
        assert_eq!(s.halfmove_clock, 1);
        assert_eq!(s.fullmove_number, 2);
    }

    #[test]
    fn king_move_drops_both_rights() {
        let mut s = state("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        s.apply(&Move::new(sq("e1"), sq("f1")), None).unwrap();
        assert_eq!(s.castling_rights.to_fen(), "kq");
    }

    #[test]
    fn rook_move_drops_its_side() {
        let mut s = state("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        s.apply(&Move::new(sq("h1"), sq("h5")), None).unwrap();
        assert_eq!(s.castling_rights.to_fen(), "Qkq");
    }

    #[test]
    fn capturing_home_rook_drops_opponent_right() {
        let mut s = state("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        s.apply(&Move::new(sq("a1"), sq("a8")), None).unwrap();
        assert_eq!(s.castling_rights.to_fen(), "Kk");
        assert_eq!(s.last_move_text.as_deref(), Some("Ra1xa8"));
    }

    #[test]
    fn castle_kingside_relocates_rook() {
        let mut s = state("4k3/8/8/8/8/8/8/4K2R w K - 0 1");
        s.apply(
            &Move::with_special(sq("e1"), sq("g1"), Special::CastleKingside),
            None,
        )
        .unwrap();
        assert_eq!(s.to_fen(), "4k3/8/8/8/8/8/8/5RK1 b - - 1 1");
        assert_eq!(s.last_move_text.as_deref(), Some("O-O"));
    }

    #[test]
    fn promotion_pauses_until_choice() {
        let mut s = state("7k/4P3/8/8/8/8/8/4K3 w - - 3 40");
        let mv = Move::with_special(sq("e7"), sq("e8"), Special::Promotion);
        assert_eq!(s.apply(&mv, None).unwrap(), Ply::PromotionRequired);
        assert_eq!(s.side_to_move, Color::White);
        assert_eq!(s.halfmove_clock, 0);
        assert_eq!(
            s.pending_promotion,
            Some(PendingPromotion {
                from: sq("e7"),
                to: sq("e8"),
                capture: false
            })
        );
        assert_eq!(
            s.board.piece_at(sq("e8")),
            Some(Piece::new(Color::White, PieceType::Pawn))
        );

        s.complete_promotion(PieceType::Rook).unwrap();
        assert_eq!(s.side_to_move, Color::Black);
        assert_eq!(s.pending_promotion, None);
        assert_eq!(
            s.board.piece_at(sq("e8")),
            Some(Piece::new(Color::White, PieceType::Rook))
        );
        assert_eq!(s.last_move_text.as_deref(), Some("e7-e8=R"));
    }

    #[test]
    fn promotion_rejects_bad_kind() {
        let mut s = state("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let mv = Move::with_special(sq("e7"), sq("e8"), Special::Promotion);
        assert_eq!(
            s.apply(&mv, Some(PieceType::King)),
            Err(ChessError::InvalidPromotion("king".into()))
        );
        s.apply(&mv, None).unwrap();
        assert!(s.complete_promotion(PieceType::Pawn).is_err());
        assert!(s.pending_promotion.is_some());
    }

    #[test]
    fn complete_promotion_without_pending_errors() {
        let mut s = GameState::starting();
        assert_eq!(
            s.complete_promotion(PieceType::Queen),
            Err(ChessError::NoPromotionPending)
        );
    }

    #[test]
    fn apply_from_empty_square_errors() {
        let mut s = GameState::starting();
        assert!(s.apply(&Move::new(sq("e4"), sq("e5")), None).is_err());
    }

    #[test]
    fn committed_ply_clears_cached_status() {
        let mut s = GameState::starting();
        s.terminal_status = Some(GameStatus::InProgress);
        s.apply(&Move::new(sq("g1"), sq("f3")), None).unwrap();
        assert_eq!(s.terminal_status, None);
    }
}
