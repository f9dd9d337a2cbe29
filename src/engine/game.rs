//! Stateful game controller wrapping Position.
//!
//! `Game` keeps every earlier position as history (positions are values, so
//! undo is just going back to the previous one), the moves played, the
//! current status, and a move cache that is invalidated on every transition.

use tracing::{debug, info};

use crate::engine::board::Position;
use crate::engine::movegen::{self, MoveCache};
use crate::engine::status;
use crate::engine::types::{ChessError, Color, GameStatus, Move, MoveRequest, Square};

// =========================================================================
// MoveRecord
// =========================================================================

/// A recorded move in the game history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    /// The move that was played.
    pub mv: Move,
    /// What game status resulted from this move.
    pub status_after: GameStatus,
}

// =========================================================================
// Game
// =========================================================================

/// A chess game with history, undo and status tracking.
#[derive(Debug)]
pub struct Game {
    position: Position,
    /// Positions before each played move, oldest first.
    history: Vec<Position>,
    moves: Vec<MoveRecord>,
    status: GameStatus,
    starting_fen: String,
    cache: MoveCache,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Position::starting())
    }

    /// Create a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Ok(Self::from_position(Position::from_fen(fen)?))
    }

    fn from_position(position: Position) -> Self {
        let mut game = Game {
            starting_fen: position.to_fen(),
            position,
            history: Vec::new(),
            moves: Vec::new(),
            status: GameStatus::InProgress,
            cache: MoveCache::new(),
        };
        game.status = game.compute_status();
        game
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Current board position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Current game status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    /// Completed move history.
    pub fn move_history(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// Positions reached before the current one, oldest first.
    pub fn position_history(&self) -> &[Position] {
        &self.history
    }

    /// All legal moves in the current position.
    pub fn legal_moves(&mut self) -> &[Move] {
        self.cache
            .legal_moves(&self.position, self.position.side_to_move)
    }

    /// Legal moves from a specific square.
    pub fn legal_moves_from(&mut self, sq: Square) -> Vec<Move> {
        self.legal_moves()
            .iter()
            .filter(|m| m.from == sq)
            .copied()
            .collect()
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_game_over()
    }

    /// Current position as FEN.
    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    /// The FEN the game started from.
    pub fn starting_fen(&self) -> &str {
        &self.starting_fen
    }

    // -----------------------------------------------------------------
    // Playing moves
    // -----------------------------------------------------------------

    /// Play a move given in coordinate notation (`e2e4`, `e7e8q`).
    pub fn play(&mut self, text: &str) -> Result<Move, ChessError> {
        self.ensure_not_over()?;
        let request = MoveRequest::parse(text)?;
        let found = self.legal_moves().iter().find(|m| request.matches(m)).copied();
        match found {
            Some(mv) => {
                self.commit(mv);
                Ok(mv)
            }
            None => Err(movegen::illegal_move(&self.position, text, &request)),
        }
    }

    /// Play a move record. It must be one of the current legal moves.
    pub fn play_move(&mut self, mv: Move) -> Result<(), ChessError> {
        self.ensure_not_over()?;
        if !self.legal_moves().contains(&mv) {
            return Err(ChessError::IllegalMove {
                mv: mv.to_string(),
                reason: "not a legal move in this position".into(),
            });
        }
        self.commit(mv);
        Ok(())
    }

    /// Undo the last move. Returns the move that was undone.
    pub fn undo(&mut self) -> Result<Move, ChessError> {
        let previous = self.history.pop().ok_or(ChessError::NothingToUndo)?;
        let record = self.moves.pop().ok_or(ChessError::NothingToUndo)?;
        self.cache.invalidate(&self.position);
        self.position = previous;
        self.status = self.compute_status();
        debug!(mv = %record.mv, fen = %self.position.to_fen(), "move undone");
        Ok(record.mv)
    }

    /// Load a FEN position, resetting all history.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), ChessError> {
        *self = Self::from_position(Position::from_fen(fen)?);
        Ok(())
    }

    fn ensure_not_over(&self) -> Result<(), ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status.to_string()));
        }
        Ok(())
    }

    fn commit(&mut self, mv: Move) {
        let next = self.position.apply_move(&mv);
        self.cache.invalidate(&self.position);
        self.history
            .push(std::mem::replace(&mut self.position, next));
        self.status = self.compute_status();
        self.moves.push(MoveRecord {
            mv,
            status_after: self.status,
        });

        debug!(mv = %mv, status = %self.status, "move played");
        if self.status.is_game_over() {
            info!(
                status = %self.status,
                plies = self.moves.len(),
                fen = %self.position.to_fen(),
                "game finished"
            );
        }
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    fn compute_status(&mut self) -> GameStatus {
        let has_moves = !self.legal_moves().is_empty();
        status::classify(&self.position, has_moves)
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
