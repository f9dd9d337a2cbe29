//! Attack geometry for every piece kind.
//!
//! Leaper patterns (knight, king, pawn captures) are pre-computed once per
//! process via `OnceLock`. Sliders walk their rays square by square over an
//! occupancy set, stopping at (and including) the first occupied square.

use crate::engine::types::{Bitboard, Color, Square};
use std::sync::OnceLock;

/// Orthogonal ray directions as (file delta, rank delta).
pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Diagonal ray directions as (file delta, rank delta).
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

// =========================================================================
// Public API
// =========================================================================

/// Get a reference to the global leaper tables.
pub fn tables() -> &'static AttackTables {
    static TABLES: OnceLock<AttackTables> = OnceLock::new();
    TABLES.get_or_init(AttackTables::init)
}

/// Pre-computed attack tables for the non-sliding pieces.
pub struct AttackTables {
    pub knight: [Bitboard; 64],
    pub king: [Bitboard; 64],
    /// `pawn_attacks[color][square]`: the two diagonal squares ahead.
    pub pawn_attacks: [[Bitboard; 64]; 2],
}

impl AttackTables {
    #[inline]
    pub fn knight_attacks(&self, sq: Square) -> Bitboard {
        self.knight[sq.index()]
    }

    #[inline]
    pub fn king_attacks(&self, sq: Square) -> Bitboard {
        self.king[sq.index()]
    }

    #[inline]
    pub fn pawn_attacks(&self, color: Color, sq: Square) -> Bitboard {
        self.pawn_attacks[color.index()][sq.index()]
    }

    fn init() -> Self {
        let mut knight = [Bitboard::EMPTY; 64];
        let mut king = [Bitboard::EMPTY; 64];
        let mut pawn_attacks = [[Bitboard::EMPTY; 64]; 2];

        for sq in Square::all() {
            knight[sq.index()] = leaper_attacks(sq, &KNIGHT_OFFSETS);
            king[sq.index()] = leaper_attacks(sq, &KING_OFFSETS);
            for color in Color::BOTH {
                let dr = color.forward();
                pawn_attacks[color.index()][sq.index()] = leaper_attacks(sq, &[(-1, dr), (1, dr)]);
            }
        }

        AttackTables {
            knight,
            king,
            pawn_attacks,
        }
    }
}

// =========================================================================
// Slider rays
// =========================================================================

/// Squares reached from `sq` along `directions`, each ray stopping at and
/// including the first square set in `occupied`.
pub fn sliding_attacks(sq: Square, occupied: Bitboard, directions: &[(i8, i8)]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &(df, dr) in directions {
        let mut cursor = sq.offset(df, dr);
        while let Some(target) = cursor {
            attacks.set(target);
            if occupied.is_set(target) {
                break;
            }
            cursor = target.offset(df, dr);
        }
    }
    attacks
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    sliding_attacks(sq, occupied, &ROOK_DIRECTIONS)
}

#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    sliding_attacks(sq, occupied, &BISHOP_DIRECTIONS)
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

/// Unit step from `from` toward `to` if the two squares share a rank, file
/// or diagonal.
pub fn direction_between(from: Square, to: Square) -> Option<(i8, i8)> {
    if from == to {
        return None;
    }
    let df = to.file() as i8 - from.file() as i8;
    let dr = to.rank() as i8 - from.rank() as i8;
    if df == 0 || dr == 0 || df.abs() == dr.abs() {
        Some((df.signum(), dr.signum()))
    } else {
        None
    }
}

fn leaper_attacks(sq: Square, offsets: &[(i8, i8)]) -> Bitboard {
    offsets
        .iter()
        .filter_map(|&(df, dr)| sq.offset(df, dr))
        .collect()
}

// =========================================================================
// Tests
// =========================================================================
