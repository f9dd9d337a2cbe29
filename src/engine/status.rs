//! Terminal-state detection: check, checkmate, stalemate and draws.
//!
//! Every query is a plain function of a `Position` and always answers with a
//! definite value, including for positions that are already finished.

use crate::engine::analyzer::BoardAnalyzer;
use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::types::{Color, DrawReason, GameStatus, PieceType};

/// Half-moves without a capture or pawn move that end the game.
pub const FIFTY_MOVE_LIMIT: u16 = 100;

/// Is the side to move in check?
pub fn is_check(pos: &Position) -> bool {
    BoardAnalyzer::new(pos).is_in_check(pos.side_to_move)
}

/// Does the side to move have any legal move?
pub fn has_legal_moves(pos: &Position) -> bool {
    !movegen::legal_moves(pos, pos.side_to_move).is_empty()
}

pub fn is_checkmate(pos: &Position) -> bool {
    is_check(pos) && !has_legal_moves(pos)
}

pub fn is_stalemate(pos: &Position) -> bool {
    !is_check(pos) && !has_legal_moves(pos)
}

pub fn is_fifty_move_draw(pos: &Position) -> bool {
    pos.halfmove_clock >= FIFTY_MOVE_LIMIT
}

/// Stalemate, insufficient material, or the fifty-move rule.
pub fn is_draw(pos: &Position) -> bool {
    is_fifty_move_draw(pos) || is_insufficient_material(pos) || is_stalemate(pos)
}

/// Insufficient material detection.
///
/// Draws: K vs K, K+B vs K, K+N vs K, K+B vs K+B (same colour bishops).
pub fn is_insufficient_material(pos: &Position) -> bool {
    // Any pawns, rooks, or queens → sufficient.
    for color in Color::BOTH {
        for kind in [PieceType::Pawn, PieceType::Rook, PieceType::Queen] {
            if pos.count(color, kind) > 0 {
                return false;
            }
        }
    }

    let w_bishops = pos.squares_of(Color::White, PieceType::Bishop);
    let b_bishops = pos.squares_of(Color::Black, PieceType::Bishop);
    let w_minor = pos.count(Color::White, PieceType::Knight) + w_bishops.pop_count();
    let b_minor = pos.count(Color::Black, PieceType::Knight) + b_bishops.pop_count();

    match (w_minor, b_minor) {
        // K vs K, K+minor vs K
        (0, 0) | (1, 0) | (0, 1) => true,
        // K+B vs K+B with bishops on same colour squares
        (1, 1) => match (w_bishops.iter().next(), b_bishops.iter().next()) {
            (Some(w), Some(b)) => w.is_light() == b.is_light(),
            _ => false,
        },
        _ => false,
    }
}

/// Full status of a position for the side to move.
pub fn status(pos: &Position) -> GameStatus {
    classify(pos, has_legal_moves(pos))
}

/// Status when the caller already knows whether legal moves exist.
pub fn classify(pos: &Position, has_legal_moves: bool) -> GameStatus {
    let in_check = is_check(pos);

    if !has_legal_moves {
        return if in_check {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        };
    }

    if is_fifty_move_draw(pos) {
        return GameStatus::Draw(DrawReason::FiftyMoveRule);
    }

    if is_insufficient_material(pos) {
        return GameStatus::Draw(DrawReason::InsufficientMaterial);
    }

    if in_check {
        GameStatus::Check
    } else {
        GameStatus::InProgress
    }
}

// =========================================================================
// Tests
// =========================================================================
