//! Stateful game controller wrapping `GameState`.
//!
//! `Game` is the only owner of a live `GameState`. It validates requested
//! moves against the legal set, keeps a snapshot history for undo, runs the
//! two-call promotion protocol and caches the terminal status. Hosts read
//! the position through `state()` or a serializable `GameSnapshot`.
//!
//! Promotion protocol: a move that puts a pawn on the last rank without a
//! chosen piece leaves the game in `pending_promotion`. The history snapshot
//! is already pushed, the pawn already stands on the last rank, and the turn
//! has not passed. Only a promotion choice (or `undo`) leaves that state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::layouts;
use crate::engine::movegen;
use crate::engine::notation;
use crate::engine::state::{GameState, PendingPromotion, Ply};
use crate::engine::status;
use crate::engine::types::{ChessError, Color, GameStatus, Move, PieceType, Special, Square};

// =========================================================================
// MoveOutcome / GameSnapshot
// =========================================================================

/// Result of a successful `apply_move`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The ply is complete and the turn has passed.
    Committed(GameSnapshot),
    /// The pawn on `square` waits for a promotion choice.
    PromotionRequired { square: Square },
}

/// Read-only view of a game for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: String,
    /// Row-major, rank 8 first. Pieces are like "wP", "bK"; empty is "".
    pub board: [[String; 8]; 8],
    pub side_to_move: Color,
    pub last_move_text: Option<String>,
    pub status: GameStatus,
    pub pending_promotion: Option<PendingPromotion>,
    pub fen: String,
    pub can_undo: bool,
}

// =========================================================================
// Game
// =========================================================================

#[derive(Clone, Debug)]
pub struct Game {
    state: GameState,
    history: Vec<GameState>,
    /// Drill restriction: when set, only these from/to pairs are accepted.
    allowed: Option<Vec<(Square, Square)>>,
    layout: String,

    // Metadata
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        Self::from_state(GameState::starting(), layouts::STANDARD)
    }

    /// Create a game from a named layout.
    pub fn with_layout(name: &str) -> Result<Self, ChessError> {
        Ok(Self::from_state(layouts::named(name)?, name))
    }

    /// Create a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Ok(Self::from_state(GameState::from_fen(fen)?, "fen"))
    }

    fn from_state(state: GameState, layout: &str) -> Self {
        let game = Self {
            state,
            history: Vec::new(),
            allowed: None,
            layout: layout.to_string(),
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };
        info!(game_id = %game.id, layout, "game created");
        game
    }

    // -----------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------

    /// Replace the live state with a fresh layout (standard when `None`).
    ///
    /// History and any drill restriction are discarded.
    pub fn reset_game(&mut self, layout: Option<&str>) -> Result<&GameState, ChessError> {
        let name = layout.unwrap_or(layouts::STANDARD);
        let state = layouts::named(name)?;
        self.replace(state, name);
        Ok(&self.state)
    }

    /// Replace the live state with a position given as FEN.
    pub fn reset_game_fen(&mut self, fen: &str) -> Result<&GameState, ChessError> {
        let state = GameState::from_fen(fen)?;
        self.replace(state, "fen");
        Ok(&self.state)
    }

    fn replace(&mut self, state: GameState, layout: &str) {
        self.state = state;
        self.history.clear();
        self.allowed = None;
        self.layout = layout.to_string();
        info!(game_id = %self.id, layout, "game reset");
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Current state. Hosts read it; only the controller mutates it.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Side to move.
    pub fn side_to_move(&self) -> Color {
        self.state.side_to_move
    }

    /// Name of the layout the game started from.
    pub fn layout(&self) -> &str {
        &self.layout
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.state.pending_promotion
    }

    /// Number of snapshots available to `undo`.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Current position as FEN.
    pub fn to_fen(&self) -> String {
        self.state.to_fen()
    }

    // -----------------------------------------------------------------
    // Legal moves
    // -----------------------------------------------------------------

    /// Legal moves from a square. Empty when the square holds no piece of
    /// the side to move, or while a promotion is pending.
    pub fn legal_moves_from(&self, sq: Square) -> Vec<Move> {
        if self.state.pending_promotion.is_some() {
            return Vec::new();
        }
        movegen::legal_moves_from(&self.state, sq)
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.state.pending_promotion.is_some() {
            return Vec::new();
        }
        movegen::all_legal_moves(&self.state)
    }

    // -----------------------------------------------------------------
    // Drill restriction
    // -----------------------------------------------------------------

    /// Accept only the given coordinate moves (e.g. `["b1a3"]`) until reset.
    pub fn restrict_moves(&mut self, moves: &[&str]) -> Result<(), ChessError> {
        let pairs = moves
            .iter()
            .map(|text| notation::parse_coordinate(text).map(|(from, to, _)| (from, to)))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(game_id = %self.id, allowed = pairs.len(), "drill restriction set");
        self.allowed = Some(pairs);
        Ok(())
    }

    pub fn clear_restriction(&mut self) {
        self.allowed = None;
    }

    fn is_allowed(&self, from: Square, to: Square) -> bool {
        self.allowed
            .as_ref()
            .is_none_or(|pairs| pairs.contains(&(from, to)))
    }

    /// Whether `apply_move(from, to, ..)` would be accepted right now.
    pub fn accepts(&self, from: Square, to: Square) -> bool {
        self.is_allowed(from, to) && self.legal_moves_from(from).iter().any(|m| m.to == to)
    }

    // -----------------------------------------------------------------
    // Make move
    // -----------------------------------------------------------------

    /// Play a move from the legal set.
    ///
    /// `special` may be left out; the tag is taken from the matching legal
    /// move. A promotion without `promotion` returns
    /// `MoveOutcome::PromotionRequired`; call again with the same squares
    /// and a piece, or use [`Game::complete_promotion`].
    pub fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        special: Option<Special>,
        promotion: Option<PieceType>,
    ) -> Result<MoveOutcome, ChessError> {
        if let Some(pending) = self.state.pending_promotion {
            return match promotion {
                Some(kind) if pending.from == from && pending.to == to => {
                    self.complete_promotion(kind)
                }
                _ => Err(ChessError::PromotionPending {
                    square: pending.to.to_algebraic(),
                }),
            };
        }

        let before = self.state.clone();

        let status = self.status();
        if status.is_decisive() {
            return Err(ChessError::GameOver(status.to_string()));
        }

        let Some(mv) = self
            .legal_moves_from(from)
            .into_iter()
            .find(|m| m.to == to && special.is_none_or(|s| s == m.special))
        else {
            warn!(game_id = %self.id, %from, %to, "rejected illegal move");
            return Err(ChessError::IllegalMove {
                from: from.to_algebraic(),
                to: to.to_algebraic(),
                reason: "not a legal move".into(),
            });
        };

        if !self.is_allowed(from, to) {
            debug!(game_id = %self.id, %mv, "move outside drill restriction");
            return Err(ChessError::NotAllowed { mv: mv.to_string() });
        }

        if let Some(kind) = promotion
            && (mv.special != Special::Promotion || !kind.is_promotion_choice())
        {
            return Err(ChessError::InvalidPromotion(kind.to_string()));
        }

        self.history.push(before);
        match self.state.apply(&mv, promotion) {
            Ok(Ply::PromotionRequired) => {
                debug!(game_id = %self.id, square = %to, "promotion pending");
                Ok(MoveOutcome::PromotionRequired { square: to })
            }
            Ok(Ply::Completed) => {
                let snapshot = self.snapshot();
                debug!(
                    game_id = %self.id,
                    text = snapshot.last_move_text.as_deref().unwrap_or(""),
                    status = %snapshot.status,
                    "move committed"
                );
                Ok(MoveOutcome::Committed(snapshot))
            }
            Err(err) => {
                if let Some(prev) = self.history.pop() {
                    self.state = prev;
                }
                Err(err)
            }
        }
    }

    /// Resolve a pending promotion with `kind` and pass the turn.
    pub fn complete_promotion(&mut self, kind: PieceType) -> Result<MoveOutcome, ChessError> {
        self.state.complete_promotion(kind)?;
        let snapshot = self.snapshot();
        debug!(
            game_id = %self.id,
            text = snapshot.last_move_text.as_deref().unwrap_or(""),
            "promotion committed"
        );
        Ok(MoveOutcome::Committed(snapshot))
    }

    /// Play a move given as coordinates, e.g. `g1f3` or `e7e8q`.
    pub fn apply_coordinate(&mut self, text: &str) -> Result<MoveOutcome, ChessError> {
        let (from, to, promotion) = notation::parse_coordinate(text)?;
        self.apply_move(from, to, None, promotion)
    }

    // -----------------------------------------------------------------
    // Undo move
    // -----------------------------------------------------------------

    /// Restore the state before the latest move, discarding any pending
    /// promotion. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<&GameState> {
        let prev = self.history.pop()?;
        self.state = prev;
        debug!(game_id = %self.id, remaining = self.history.len(), "move undone");
        Some(&self.state)
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    /// Status for the side to move, computed once per committed ply.
    pub fn status(&mut self) -> GameStatus {
        if self.state.pending_promotion.is_some() {
            return GameStatus::InProgress;
        }
        if let Some(cached) = self.state.terminal_status {
            return cached;
        }
        let computed = status::classify(&self.state);
        self.state.terminal_status = Some(computed);
        computed
    }

    // -----------------------------------------------------------------
    // Render snapshot
    // -----------------------------------------------------------------

    /// Everything a host needs to draw the game.
    pub fn snapshot(&mut self) -> GameSnapshot {
        let status = self.status();
        GameSnapshot {
            id: self.id.clone(),
            board: self.board_array(),
            side_to_move: self.state.side_to_move,
            last_move_text: self.state.last_move_text.clone(),
            status,
            pending_promotion: self.state.pending_promotion,
            fen: self.state.to_fen(),
            can_undo: self.can_undo(),
        }
    }

    /// Generate an 8×8 board array (row-major, rank 8 first → rank 1 last).
    /// Empty squares are empty strings. Pieces are like "wP", "bK", etc.
    pub fn board_array(&self) -> [[String; 8]; 8] {
        let mut board = std::array::from_fn(|_| std::array::from_fn(|_| String::new()));
        for (sq, piece) in self.state.board.pieces() {
            let c = match piece.color {
                Color::White => 'w',
                Color::Black => 'b',
            };
            let row = 7 - sq.rank() as usize;
            board[row][sq.file() as usize] = format!("{c}{}", piece.kind.letter());
        }
        board
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::DrawReason;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn play(g: &mut Game, from: &str, to: &str) {
        g.apply_move(sq(from), sq(to), None, None).unwrap();
    }

    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    #[test]
    fn new_game_is_in_progress() {
        let mut g = Game::new();
        assert_eq!(g.status(), GameStatus::InProgress);
        assert_eq!(g.side_to_move(), Color::White);
        assert_eq!(g.state().fullmove_number, 1);
        assert!(!g.can_undo());
        assert_eq!(g.layout(), "standard");
    }

    #[test]
    fn games_have_distinct_ids() {
        assert_ne!(Game::new().id, Game::new().id);
    }

    #[test]
    fn game_from_invalid_fen() {
        assert!(Game::from_fen("invalid").is_err());
    }

    // -----------------------------------------------------------------
    // Making moves
    // -----------------------------------------------------------------

    #[test]
    fn make_move_e2e4() {
        let mut g = Game::new();
        let outcome = g.apply_move(sq("e2"), sq("e4"), None, None).unwrap();
        let MoveOutcome::Committed(snap) = outcome else {
            panic!("expected a committed move");
        };
        assert_eq!(snap.last_move_text.as_deref(), Some("e2-e4"));
        assert_eq!(snap.side_to_move, Color::Black);
        assert_eq!(g.state().en_passant, Some(sq("e3")));
        assert_eq!(g.history_len(), 1);
    }

    #[test]
    fn make_illegal_move_errors_and_leaves_state() {
        let mut g = Game::new();
        let before = g.state().clone();
        let err = g.apply_move(sq("e2"), sq("e5"), None, None).unwrap_err();
        assert!(matches!(err, ChessError::IllegalMove { .. }));
        assert_eq!(g.history_len(), 0);
        assert_eq!(g.state().board, before.board);
    }

    #[test]
    fn wrong_special_tag_is_illegal() {
        let mut g = Game::new();
        let err = g
            .apply_move(sq("e2"), sq("e4"), Some(Special::EnPassant), None)
            .unwrap_err();
        assert!(matches!(err, ChessError::IllegalMove { .. }));
    }

    #[test]
    fn moving_out_of_turn_is_illegal() {
        let mut g = Game::new();
        assert!(g.apply_move(sq("e7"), sq("e5"), None, None).is_err());
    }

    #[test]
    fn make_move_on_mated_game_errors() {
        let mut g = Game::new();
        play(&mut g, "f2", "f3");
        play(&mut g, "e7", "e5");
        play(&mut g, "g2", "g4");
        play(&mut g, "d8", "h4");
        assert_eq!(g.status(), GameStatus::Checkmate);
        let err = g.apply_move(sq("e2"), sq("e4"), None, None).unwrap_err();
        assert!(matches!(err, ChessError::GameOver(_)));
    }

    #[test]
    fn coordinate_input() {
        let mut g = Game::new();
        g.apply_coordinate("g1f3").unwrap();
        assert_eq!(g.state().last_move_text.as_deref(), Some("Ng1-f3"));
        assert!(g.apply_coordinate("zz").is_err());
    }

    // -----------------------------------------------------------------
    // Promotion protocol
    // -----------------------------------------------------------------

    #[test]
    fn promotion_two_call_protocol() {
        let mut g = Game::with_layout("promotion_drill").unwrap();
        let outcome = g.apply_move(sq("e7"), sq("e8"), None, None).unwrap();
        assert_eq!(outcome, MoveOutcome::PromotionRequired { square: sq("e8") });
        assert_eq!(g.side_to_move(), Color::White);
        assert!(g.legal_moves().is_empty());

        // Other moves are refused while pending.
        let err = g.apply_move(sq("e1"), sq("d1"), None, None).unwrap_err();
        assert_eq!(
            err,
            ChessError::PromotionPending {
                square: "e8".into()
            }
        );

        let outcome = g
            .apply_move(sq("e7"), sq("e8"), None, Some(PieceType::Knight))
            .unwrap();
        let MoveOutcome::Committed(snap) = outcome else {
            panic!("expected a committed move");
        };
        assert_eq!(snap.side_to_move, Color::Black);
        assert_eq!(snap.last_move_text.as_deref(), Some("e7-e8=N"));
        assert_eq!(snap.board[0][4], "wN");
        assert_eq!(g.history_len(), 1);
    }

    #[test]
    fn promotion_pause_drops_cached_status() {
        let mut g = Game::with_layout("promotion_drill").unwrap();
        g.status();
        assert_eq!(g.state().terminal_status, Some(GameStatus::InProgress));
        g.apply_move(sq("e7"), sq("e8"), None, None).unwrap();
        assert_eq!(g.state().terminal_status, None);
        assert_eq!(g.status(), GameStatus::InProgress);
        assert_eq!(g.state().terminal_status, None);
    }

    #[test]
    fn quiet_move_at_clock_limit_does_not_overflow() {
        let mut g = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 65535 1").unwrap();
        g.apply_coordinate("e1f1").unwrap();
        assert_eq!(g.state().halfmove_clock, u16::MAX);
        assert_eq!(g.status(), GameStatus::Draw(DrawReason::FiftyMove));
    }

    #[test]
    fn promotion_in_one_call() {
        let mut g = Game::with_layout("promotion_drill").unwrap();
        g.apply_coordinate("e7e8q").unwrap();
        assert_eq!(g.side_to_move(), Color::Black);
        assert_eq!(g.status(), GameStatus::Check);
    }

    #[test]
    fn promotion_choice_on_plain_move_rejected() {
        let mut g = Game::new();
        let err = g
            .apply_move(sq("e2"), sq("e4"), None, Some(PieceType::Queen))
            .unwrap_err();
        assert!(matches!(err, ChessError::InvalidPromotion(_)));
        assert!(!g.can_undo());
    }

    #[test]
    fn undo_discards_pending_promotion() {
        let mut g = Game::with_layout("promotion_drill").unwrap();
        let before = g.state().clone();
        g.apply_move(sq("e7"), sq("e8"), None, None).unwrap();
        assert!(g.pending_promotion().is_some());
        g.undo().unwrap();
        assert_eq!(g.state(), &before);
        assert!(g.pending_promotion().is_none());
    }

    // -----------------------------------------------------------------
    // Undo
    // -----------------------------------------------------------------

    #[test]
    fn undo_single_move() {
        let mut g = Game::new();
        let before = g.state().clone();
        play(&mut g, "e2", "e4");
        let restored = g.undo().unwrap().clone();
        assert_eq!(restored, before);
        assert_eq!(g.history_len(), 0);
    }

    #[test]
    fn undo_nothing_is_noop() {
        let mut g = Game::new();
        let before = g.state().clone();
        assert!(g.undo().is_none());
        assert_eq!(g.state(), &before);
    }

    // -----------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------

    #[test]
    fn status_cached_until_next_move() {
        let mut g = Game::new();
        assert_eq!(g.state().terminal_status, None);
        g.status();
        assert_eq!(g.state().terminal_status, Some(GameStatus::InProgress));
        play(&mut g, "g1", "f3");
        // Snapshot in apply_move filled the cache for the new position.
        assert_eq!(g.state().terminal_status, Some(GameStatus::InProgress));
    }

    #[test]
    fn threefold_via_controller() {
        let mut g = Game::new();
        for _ in 0..2 {
            play(&mut g, "g1", "f3");
            play(&mut g, "g8", "f6");
            play(&mut g, "f3", "g1");
            play(&mut g, "f6", "g8");
        }
        assert_eq!(g.status(), GameStatus::Draw(DrawReason::Threefold));
    }

    // -----------------------------------------------------------------
    // Reset and drills
    // -----------------------------------------------------------------

    #[test]
    fn reset_replaces_state_and_history() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        g.reset_game(Some("lesson_knight_1")).unwrap();
        assert!(!g.can_undo());
        assert_eq!(g.layout(), "lesson_knight_1");
        assert_eq!(g.legal_moves_from(sq("b1")).len(), 3);

        g.reset_game(None).unwrap();
        assert_eq!(g.state(), &GameState::starting());
        assert!(g.reset_game(Some("nope")).is_err());
    }

    #[test]
    fn drill_restriction() {
        let mut g = Game::with_layout("lesson_knight_1").unwrap();
        g.restrict_moves(&["b1a3"]).unwrap();
        assert!(g.accepts(sq("b1"), sq("a3")));
        assert!(!g.accepts(sq("b1"), sq("c3")));

        let err = g.apply_move(sq("b1"), sq("c3"), None, None).unwrap_err();
        assert_eq!(err, ChessError::NotAllowed { mv: "b1c3".into() });
        assert!(!g.can_undo());

        g.apply_move(sq("b1"), sq("a3"), None, None).unwrap();
        assert_eq!(g.state().last_move_text.as_deref(), Some("Nb1-a3"));

        g.clear_restriction();
        assert!(g.accepts(sq("e8"), sq("d8")));
    }

    #[test]
    fn reset_fen_clears_restriction() {
        let mut g = Game::with_layout("lesson_knight_1").unwrap();
        g.restrict_moves(&["b1a3"]).unwrap();
        g.reset_game_fen("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1").unwrap();
        assert!(g.accepts(sq("b1"), sq("c3")));
        assert_eq!(g.layout(), "fen");
    }

    #[test]
    fn snapshot_board_array() {
        let mut g = Game::new();
        let snap = g.snapshot();
        assert_eq!(snap.board[0][0], "bR");
        assert_eq!(snap.board[7][4], "wK");
        assert_eq!(snap.board[3][0], "");
        assert_eq!(snap.status, GameStatus::InProgress);
        assert_eq!(snap.pending_promotion, None);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let mut g = Game::new();
        let json = serde_json::to_value(g.snapshot()).unwrap();
        assert_eq!(json["sideToMove"], "white");
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["canUndo"], false);
    }
}
