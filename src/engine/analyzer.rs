//! Attack, defence, mobility and pin analysis for one position.
//!
//! A [`BoardAnalyzer`] borrows the `Position` it was built from, so it cannot
//! outlive it or observe a later one. After a move, build a new analyzer on
//! the resulting position.

use crate::engine::attacks;
use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::rules;
use crate::engine::types::{Bitboard, Color, Piece, PieceType, Square};

/// A piece together with the square it stands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlacedPiece {
    pub square: Square,
    pub piece: Piece,
}

/// Attack maps for a single position.
pub struct BoardAnalyzer<'a> {
    position: &'a Position,
    /// Squares attacked by the piece on each square (empty for empty squares).
    attacks_from: [Bitboard; 64],
    /// For each square, origins of pieces attacking it while it is empty or
    /// holds an opponent of the attacker.
    attackers: [Bitboard; 64],
    /// For each square, origins of pieces covering a friendly occupant.
    defenders: [Bitboard; 64],
}

impl<'a> BoardAnalyzer<'a> {
    pub fn new(position: &'a Position) -> Self {
        let mut attacks_from = [Bitboard::EMPTY; 64];
        let mut attackers = [Bitboard::EMPTY; 64];
        let mut defenders = [Bitboard::EMPTY; 64];

        for color in Color::BOTH {
            for (from, piece) in position.pieces(color) {
                let targets = rules::attacked_squares(piece, from, position);
                attacks_from[from.index()] = targets;
                for target in targets.iter() {
                    match position.piece_at(target) {
                        Some(occupant) if occupant.color == piece.color => {
                            defenders[target.index()].set(from)
                        }
                        _ => attackers[target.index()].set(from),
                    }
                }
            }
        }

        BoardAnalyzer {
            position,
            attacks_from,
            attackers,
            defenders,
        }
    }

    pub fn position(&self) -> &'a Position {
        self.position
    }

    // -----------------------------------------------------------------------
    // Attack / defence queries
    // -----------------------------------------------------------------------

    /// Squares attacked by the piece on `square`.
    pub fn attacked_squares_of(&self, square: Square) -> Bitboard {
        self.attacks_from[square.index()]
    }

    /// Origins of `color`'s pieces attacking `square`.
    pub fn attacker_squares(&self, square: Square, color: Color) -> Bitboard {
        self.attackers[square.index()] & self.position.occupied_by(color)
    }

    /// Pieces of `color` attacking `square`.
    pub fn attackers_of(&self, square: Square, color: Color) -> Vec<PlacedPiece> {
        self.placed(self.attacker_squares(square, color))
    }

    /// Pieces of `color` defending a friendly piece on `square`.
    pub fn defenders_of(&self, square: Square, color: Color) -> Vec<PlacedPiece> {
        self.placed(self.defenders[square.index()] & self.position.occupied_by(color))
    }

    /// Is `color`'s king attacked? False when that king is missing.
    pub fn is_in_check(&self, color: Color) -> bool {
        self.position
            .king_square(color)
            .is_some_and(|king| self.attacker_squares(king, !color).is_not_empty())
    }

    fn placed(&self, squares: Bitboard) -> Vec<PlacedPiece> {
        squares
            .iter()
            .filter_map(|square| {
                self.position
                    .piece_at(square)
                    .map(|piece| PlacedPiece { square, piece })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mobility
    // -----------------------------------------------------------------------

    /// Number of legal moves `color` has, whether or not it is their turn.
    pub fn total_mobility(&self, color: Color) -> usize {
        movegen::legal_moves(self.position, color).len()
    }

    // -----------------------------------------------------------------------
    // Pins
    // -----------------------------------------------------------------------

    /// Is the piece on `square` pinned to its own king?
    ///
    /// Walks from the king through the piece: the line to the piece must be
    /// clear, and the first piece beyond it must be an enemy slider that
    /// moves along that line.
    pub fn is_pinned(&self, square: Square) -> bool {
        let pos = self.position;
        let Some(piece) = pos.piece_at(square) else {
            return false;
        };
        if piece.kind == PieceType::King {
            return false;
        }
        let Some(king) = pos.king_square(piece.color) else {
            return false;
        };
        let Some((df, dr)) = attacks::direction_between(king, square) else {
            return false;
        };

        let mut cursor = king.offset(df, dr);
        while let Some(step) = cursor {
            if step == square {
                break;
            }
            if pos.piece_at(step).is_some() {
                return false;
            }
            cursor = step.offset(df, dr);
        }

        let diagonal = df != 0 && dr != 0;
        let mut cursor = square.offset(df, dr);
        while let Some(step) = cursor {
            if let Some(other) = pos.piece_at(step) {
                return other.color != piece.color
                    && match other.kind {
                        PieceType::Queen => true,
                        PieceType::Bishop => diagonal,
                        PieceType::Rook => !diagonal,
                        _ => false,
                    };
            }
            cursor = step.offset(df, dr);
        }
        false
    }

    // -----------------------------------------------------------------------
    // Pawn structure
    // -----------------------------------------------------------------------

    /// Pawn structure score for `color`, higher is better.
    ///
    /// Per file holding pawns: -2 for each pawn beyond the first, then -1 if
    /// neither neighbouring file has a friendly pawn, +1 otherwise.
    pub fn pawn_structure(&self, color: Color) -> i32 {
        let mut per_file = [0i32; 8];
        for square in self.position.squares_of(color, PieceType::Pawn).iter() {
            per_file[square.file() as usize] += 1;
        }

        let mut score = 0;
        for file in 0..8 {
            let count = per_file[file];
            if count == 0 {
                continue;
            }
            score -= (count - 1) * 2;
            let left = file > 0 && per_file[file - 1] > 0;
            let right = file < 7 && per_file[file + 1] > 0;
            score += if left || right { 1 } else { -1 };
        }
        score
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
