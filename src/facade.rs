//! String-level entry point for callers that store positions as FEN.
//!
//! Every operation takes the position as a FEN string and moves in
//! coordinate notation, parses them, and delegates to the engine modules.
//! Boolean queries never fail: malformed input answers `false`.

use tracing::debug;

use crate::ai::{BoundedSearch, evaluate};
use crate::config::EngineConfig;
use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::status;
use crate::engine::types::{ChessError, GameStatus, Move, Piece, Square};

/// Stateless rules engine. The only state is the search configuration.
#[derive(Clone, Debug, Default)]
pub struct ChessEngine {
    config: EngineConfig,
}

impl ChessEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine configured from `CHESS_AI_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------

    /// Is `mv` a legal move for the side to move?
    pub fn is_valid_move(&self, fen: &str, mv: &str) -> bool {
        self.resolve(fen, mv).is_ok()
    }

    /// Is this exact move record among the legal moves of the side to move?
    pub fn is_legal_move(&self, fen: &str, mv: &Move) -> bool {
        Position::from_fen(fen)
            .map(|pos| movegen::legal_moves(&pos, pos.side_to_move).contains(mv))
            .unwrap_or(false)
    }

    /// Play `mv` and return the resulting FEN.
    pub fn apply_move(&self, fen: &str, mv: &str) -> Result<String, ChessError> {
        let (pos, resolved) = self.resolve(fen, mv)?;
        Ok(pos.apply_move(&resolved).to_fen())
    }

    /// Legal moves for the side to move, in coordinate notation.
    pub fn legal_moves(&self, fen: &str) -> Result<Vec<String>, ChessError> {
        let pos = Position::from_fen(fen)?;
        Ok(movegen::legal_moves(&pos, pos.side_to_move)
            .iter()
            .map(Move::coordinate)
            .collect())
    }

    /// Legal moves of the piece on `square`. Empty for an empty square.
    pub fn legal_moves_from(&self, fen: &str, square: &str) -> Result<Vec<String>, ChessError> {
        let pos = Position::from_fen(fen)?;
        let square: Square = square.parse()?;
        Ok(movegen::legal_moves_from(&pos, square)
            .iter()
            .map(Move::coordinate)
            .collect())
    }

    pub fn piece_at(&self, fen: &str, square: &str) -> Result<Option<Piece>, ChessError> {
        let pos = Position::from_fen(fen)?;
        let square: Square = square.parse()?;
        Ok(pos.piece_at(square))
    }

    pub fn is_castling_move(&self, fen: &str, mv: &str) -> bool {
        self.resolve(fen, mv).is_ok_and(|(_, m)| m.is_castling())
    }

    pub fn is_en_passant_move(&self, fen: &str, mv: &str) -> bool {
        self.resolve(fen, mv).is_ok_and(|(_, m)| m.is_en_passant())
    }

    pub fn is_pawn_promotion_move(&self, fen: &str, mv: &str) -> bool {
        self.resolve(fen, mv).is_ok_and(|(_, m)| m.is_promotion())
    }

    fn resolve(&self, fen: &str, mv: &str) -> Result<(Position, Move), ChessError> {
        let pos = Position::from_fen(fen)?;
        let resolved = movegen::resolve_move(&pos, mv).inspect_err(|err| {
            debug!(fen, mv, error = %err, "move rejected");
        })?;
        Ok((pos, resolved))
    }

    // -----------------------------------------------------------------
    // Terminal state
    // -----------------------------------------------------------------

    pub fn is_check(&self, fen: &str) -> bool {
        self.query(fen, status::is_check)
    }

    pub fn is_checkmate(&self, fen: &str) -> bool {
        self.query(fen, status::is_checkmate)
    }

    pub fn is_stalemate(&self, fen: &str) -> bool {
        self.query(fen, status::is_stalemate)
    }

    /// Stalemate, insufficient material or the fifty-move rule.
    pub fn is_draw(&self, fen: &str) -> bool {
        self.query(fen, status::is_draw)
    }

    pub fn is_insufficient_material(&self, fen: &str) -> bool {
        self.query(fen, status::is_insufficient_material)
    }

    pub fn status(&self, fen: &str) -> Result<GameStatus, ChessError> {
        Ok(status::status(&Position::from_fen(fen)?))
    }

    fn query(&self, fen: &str, check: fn(&Position) -> bool) -> bool {
        match Position::from_fen(fen) {
            Ok(pos) => check(&pos),
            Err(err) => {
                debug!(fen, error = %err, "query on malformed position");
                false
            }
        }
    }

    // -----------------------------------------------------------------
    // Evaluation and search
    // -----------------------------------------------------------------

    /// Static evaluation in centipawns, White's perspective.
    pub fn evaluate(&self, fen: &str) -> Result<i32, ChessError> {
        Ok(evaluate(&Position::from_fen(fen)?))
    }

    /// The move the configured picker chooses within the configured
    /// timeout. `None` when the side to move has no legal move.
    pub async fn best_move(&self, fen: &str) -> Result<Option<String>, ChessError> {
        let pos = Position::from_fen(fen)?;
        let outcome = BoundedSearch::from_config(&self.config).run(&pos).await;
        if !outcome.is_completed() {
            debug!(fen, outcome = ?outcome, "best move degraded to fallback");
        }
        Ok(outcome.best_move().map(|m| m.coordinate()))
    }
}

// =========================================================================
// Tests
// =========================================================================
