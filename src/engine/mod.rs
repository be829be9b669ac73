pub mod attacks;
pub mod board;
pub mod game;
pub mod layouts;
pub mod material;
pub mod movegen;
pub mod notation;
pub mod repetition;
pub mod state;
pub mod status;
pub mod types;

pub use board::Board;
pub use game::{Game, GameSnapshot, MoveOutcome};
pub use movegen::{all_legal_moves, legal_moves, legal_moves_from};
pub use state::{GameState, PendingPromotion};
pub use types::*;
