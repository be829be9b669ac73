//! Mailbox board: 64 optional pieces in LERF order (a1 = 0, h8 = 63).
//!
//! The array is `Copy`, so the legality filter can take scratch copies
//! without ever aliasing the live board.

use crate::engine::types::{Color, Move, Piece, PieceType, Special, Square};

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [Option<Piece>; 64],
}

/// Back-rank order from the a-file to the h-file.
const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

impl Board {
    /// Create an empty board with no pieces.
    pub const fn empty() -> Self {
        Board {
            squares: [None; 64],
        }
    }

    /// Standard starting placement.
    pub fn starting() -> Self {
        let mut board = Board::empty();
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            board.put(Square::from_file_rank(file, 0), Piece::new(Color::White, kind));
            board.put(
                Square::from_file_rank(file, 1),
                Piece::new(Color::White, PieceType::Pawn),
            );
            board.put(
                Square::from_file_rank(file, 6),
                Piece::new(Color::Black, PieceType::Pawn),
            );
            board.put(Square::from_file_rank(file, 7), Piece::new(Color::Black, kind));
        }
        board
    }

    // -----------------------------------------------------------------------
    // Piece manipulation (low-level)
    // -----------------------------------------------------------------------

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.squares[sq.index()].is_none()
    }

    #[inline]
    pub fn put(&mut self, sq: Square, piece: Piece) {
        self.squares[sq.index()] = Some(piece);
    }

    #[inline]
    pub fn remove(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()].take()
    }

    /// Move whatever stands on `from` to `to`, returning the piece it replaced.
    #[inline]
    pub fn relocate(&mut self, from: Square, to: Square) -> Option<Piece> {
        let moving = self.squares[from.index()].take();
        std::mem::replace(&mut self.squares[to.index()], moving)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every occupied square with its piece, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (Square(i as u8), p)))
    }

    /// Occupied squares of one colour.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.color == color)
    }

    /// King square for the given colour, `None` on a layout without one.
    pub fn king_sq(&self, color: Color) -> Option<Square> {
        self.pieces_of(color)
            .find(|(_, p)| p.kind == PieceType::King)
            .map(|(sq, _)| sq)
    }

    /// Whether `sq` holds a piece of `color`.
    #[inline]
    pub fn is_color(&self, sq: Square, color: Color) -> bool {
        matches!(self.piece_at(sq), Some(p) if p.color == color)
    }

    // -----------------------------------------------------------------------
    // Move execution
    // -----------------------------------------------------------------------

    /// Relocate the pieces a move touches and return the captured piece.
    ///
    /// Castling also moves the rook from its corner to the square the king
    /// crossed; en passant removes the pawn one rank behind `to`. A pawn
    /// reaching the last rank becomes `promote_to` when given, otherwise it
    /// stays a pawn.
    pub fn play(&mut self, mv: &Move, promote_to: Option<PieceType>) -> Option<Piece> {
        let mover = self.piece_at(mv.from)?;
        let mut captured = self.relocate(mv.from, mv.to);

        match mv.special {
            Special::CastleKingside | Special::CastleQueenside => {
                let (rook_from, rook_to) = castling_rook_squares(mover.color, mv.special);
                self.relocate(rook_from, rook_to);
            }
            Special::EnPassant => {
                let behind = mv.to.offset(-mover.color.forward(), 0);
                captured = behind.and_then(|sq| self.remove(sq));
            }
            Special::Promotion | Special::None => {}
        }

        if mover.kind == PieceType::Pawn
            && mv.to.rank() == mover.color.promotion_rank()
            && let Some(kind) = promote_to
        {
            self.put(mv.to, Piece::new(mover.color, kind));
        }

        captured
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), useful for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                let ch = match self.piece_at(sq) {
                    Some(p) => p.to_char(),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Castling geometry
// ---------------------------------------------------------------------------

/// Home square of the rook for one colour and wing.
pub fn rook_home(color: Color, kingside: bool) -> Square {
    let file = if kingside { 7 } else { 0 };
    Square::from_file_rank(file, color.home_rank())
}

/// Home square of the king.
pub fn king_home(color: Color) -> Square {
    Square::from_file_rank(4, color.home_rank())
}

/// (rook_from, rook_to) for a castling move.
pub fn castling_rook_squares(color: Color, special: Special) -> (Square, Square) {
    let rank = color.home_rank();
    match special {
        Special::CastleKingside => (
            Square::from_file_rank(7, rank),
            Square::from_file_rank(5, rank),
        ),
        _ => (
            Square::from_file_rank(0, rank),
            Square::from_file_rank(3, rank),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
