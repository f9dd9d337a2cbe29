pub mod analyzer;
pub mod attacks;
pub mod board;
pub mod game;
pub mod movegen;
pub mod rules;
pub mod status;
pub mod types;

pub use analyzer::{BoardAnalyzer, PlacedPiece};
pub use board::{Position, STARTING_FEN};
pub use game::{Game, MoveRecord};
pub use movegen::{MoveCache, legal_moves, legal_moves_from, perft, resolve_move};
pub use types::*;
