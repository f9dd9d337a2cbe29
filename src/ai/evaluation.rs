//! Static position evaluation.
//!
//! Returns a score in centipawns from White's perspective.
//! Positive = White advantage, negative = Black advantage.
//!
//! Components:
//!   1. Material balance (plus bishop pair)
//!   2. Mobility (legal-move count difference)
//!   3. Pawn structure
//!   4. King safety
//!   5. Centre control
//!   6. Development of minor pieces

use crate::engine::analyzer::BoardAnalyzer;
use crate::engine::board::Position;
use crate::engine::types::{Color, Piece, PieceType, Square};

/// Infinity sentinel. Larger than any realistic eval.
pub const INF: i32 = 100_000;

/// Checkmate score base. Actual mate scores are `MATE - ply` so closer mates
/// score higher.
pub const MATE: i32 = 90_000;

/// Is this score a forced-mate score?
#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE - 500
}

// =========================================================================
// Weights (centipawns)
// =========================================================================

const BISHOP_PAIR_BONUS: i32 = 30;
const MOBILITY_WEIGHT: i32 = 2;
const PAWN_STRUCTURE_WEIGHT: i32 = 10;

const CASTLED_KING_BONUS: i32 = 50;
const PAWN_SHIELD_BONUS: i32 = 10;
const KING_ATTACKER_PENALTY: i32 = 20;

const CENTER_CONTROL_BONUS: i32 = 10;
const EXTENDED_CENTER_BONUS: i32 = CENTER_CONTROL_BONUS / 2;
const CENTER_PAWN_BONUS: i32 = CENTER_CONTROL_BONUS * 2;

const DEVELOPMENT_BONUS: i32 = 10;

/// d4, e4, d5, e5.
const CENTER: [Square; 4] = [Square(27), Square(28), Square(35), Square(36)];

/// Home squares of the minor pieces, indexed by file on the back rank.
const MINOR_HOMES: [(u8, PieceType); 4] = [
    (1, PieceType::Knight),
    (2, PieceType::Bishop),
    (5, PieceType::Bishop),
    (6, PieceType::Knight),
];

// =========================================================================
// Evaluation
// =========================================================================

/// Evaluate a position. Returns centipawn score from White's perspective.
pub fn evaluate(pos: &Position) -> i32 {
    let analyzer = BoardAnalyzer::new(pos);

    material(pos)
        + mobility(&analyzer)
        + pawn_structure(&analyzer)
        + king_safety(pos, &analyzer)
        + center_control(pos, &analyzer)
        + development(pos)
}

/// Material balance with the bishop pair bonus.
pub fn material(pos: &Position) -> i32 {
    let mut score = 0;
    for color in Color::BOTH {
        let mut side = 0;
        for (_, piece) in pos.pieces(color) {
            side += piece.kind.value();
        }
        if pos.count(color, PieceType::Bishop) >= 2 {
            side += BISHOP_PAIR_BONUS;
        }
        score += sign(color) * side;
    }
    score
}

pub fn mobility(analyzer: &BoardAnalyzer<'_>) -> i32 {
    let white = analyzer.total_mobility(Color::White) as i32;
    let black = analyzer.total_mobility(Color::Black) as i32;
    MOBILITY_WEIGHT * (white - black)
}

pub fn pawn_structure(analyzer: &BoardAnalyzer<'_>) -> i32 {
    PAWN_STRUCTURE_WEIGHT
        * (analyzer.pawn_structure(Color::White) - analyzer.pawn_structure(Color::Black))
}

/// Castled king, pawn shield and attackers of the king square.
pub fn king_safety(pos: &Position, analyzer: &BoardAnalyzer<'_>) -> i32 {
    let mut score = 0;
    for color in Color::BOTH {
        let Some(king) = pos.king_square(color) else {
            continue;
        };
        let mut side = 0;

        if king.rank() == color.back_rank() && (king.file() == 2 || king.file() == 6) {
            side += CASTLED_KING_BONUS;
        }

        let own_pawn = Piece::new(PieceType::Pawn, color);
        for df in -1..=1 {
            if let Some(shield) = king.offset(df, color.forward())
                && pos.piece_at(shield) == Some(own_pawn)
            {
                side += PAWN_SHIELD_BONUS;
            }
        }

        let attackers = analyzer.attacker_squares(king, !color).pop_count() as i32;
        side -= KING_ATTACKER_PENALTY * attackers;

        score += sign(color) * side;
    }
    score
}

/// Attacks on the centre and extended centre, and pawns standing in the
/// centre.
pub fn center_control(pos: &Position, analyzer: &BoardAnalyzer<'_>) -> i32 {
    let mut score = 0;
    for color in Color::BOTH {
        let mut side = 0;

        for square in CENTER {
            side += CENTER_CONTROL_BONUS * analyzer.attacker_squares(square, color).pop_count() as i32;
            if pos.piece_at(square) == Some(Piece::new(PieceType::Pawn, color)) {
                side += CENTER_PAWN_BONUS;
            }
        }

        // c3..f6, centre included.
        for rank in 2..6 {
            for file in 2..6 {
                let square = Square::from_file_rank(file, rank);
                side += EXTENDED_CENTER_BONUS
                    * analyzer.attacker_squares(square, color).pop_count() as i32;
            }
        }

        score += sign(color) * side;
    }
    score
}

/// Bonus for each minor piece home square no longer holding its piece.
pub fn development(pos: &Position) -> i32 {
    let mut score = 0;
    for color in Color::BOTH {
        let developed = MINOR_HOMES
            .iter()
            .filter(|&&(file, kind)| {
                let home = Square::from_file_rank(file, color.back_rank());
                pos.piece_at(home) != Some(Piece::new(kind, color))
            })
            .count() as i32;
        score += sign(color) * DEVELOPMENT_BONUS * developed;
    }
    score
}

#[inline]
fn sign(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

// =========================================================================
// Tests
// =========================================================================
