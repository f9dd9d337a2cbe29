//! Per-piece movement rules.
//!
//! Two questions are answered for every piece kind:
//!
//! - [`attacked_squares`]: squares the piece would capture on, ignoring
//!   whether doing so would expose its own king. Slider rays include the
//!   first occupied square, whoever owns it.
//! - [`is_geometrically_valid`]: whether a move has the right shape for the
//!   piece, its path is clear, and its destination is empty or hostile.
//!
//! The king's rule also covers castling ([`can_castle`]).

use crate::engine::attacks;
use crate::engine::board::Position;
use crate::engine::types::{Bitboard, CastleSide, CastlingRights, Color, Move, Piece, PieceType, Square};

// ---------------------------------------------------------------------------
// Attacked squares
// ---------------------------------------------------------------------------

/// Squares a piece standing on `from` attacks in `pos`.
pub fn attacked_squares(piece: Piece, from: Square, pos: &Position) -> Bitboard {
    let t = attacks::tables();
    let occ = pos.occupied();
    match piece.kind {
        PieceType::Pawn => t.pawn_attacks(piece.color, from),
        PieceType::Knight => t.knight_attacks(from),
        PieceType::Bishop => attacks::bishop_attacks(from, occ),
        PieceType::Rook => attacks::rook_attacks(from, occ),
        PieceType::Queen => attacks::queen_attacks(from, occ),
        PieceType::King => t.king_attacks(from),
    }
}

// ---------------------------------------------------------------------------
// Geometric validity
// ---------------------------------------------------------------------------

/// Is `mv` a well-shaped move for the piece on `mv.from`?
///
/// Does not consider whether the mover's king ends up attacked; that is the
/// move generator's legality filter.
pub fn is_geometrically_valid(mv: &Move, pos: &Position) -> bool {
    let Some(piece) = pos.piece_at(mv.from) else {
        return false;
    };
    if piece.kind != mv.piece || mv.from == mv.to {
        return false;
    }
    if pos.piece_at(mv.to).is_some_and(|target| target.color == piece.color) {
        return false;
    }
    match piece.kind {
        PieceType::Pawn => pawn_targets(piece.color, mv.from, pos).is_set(mv.to),
        PieceType::King => {
            if mv.from.file().abs_diff(mv.to.file()) == 2 && mv.from.rank() == mv.to.rank() {
                castle_side_for(piece.color, mv.from, mv.to)
                    .is_some_and(|side| can_castle(pos, piece.color, side))
            } else {
                attacked_squares(piece, mv.from, pos).is_set(mv.to)
            }
        }
        _ => attacked_squares(piece, mv.from, pos).is_set(mv.to),
    }
}

/// Destination squares a piece may move to (castling excluded): empty or
/// enemy-occupied squares it reaches by its own movement pattern.
pub fn move_targets(piece: Piece, from: Square, pos: &Position) -> Bitboard {
    match piece.kind {
        PieceType::Pawn => pawn_targets(piece.color, from, pos),
        _ => attacked_squares(piece, from, pos) & !pos.occupied_by(piece.color),
    }
}

/// Pawn destinations: single push, double push from the start rank, and
/// diagonal captures onto enemy pieces or the en passant target.
fn pawn_targets(color: Color, from: Square, pos: &Position) -> Bitboard {
    let mut targets = Bitboard::EMPTY;
    let dr = color.forward();

    if let Some(one) = from.offset(0, dr)
        && pos.piece_at(one).is_none()
    {
        targets.set(one);
        if from.rank() == color.pawn_rank()
            && let Some(two) = one.offset(0, dr)
            && pos.piece_at(two).is_none()
        {
            targets.set(two);
        }
    }

    let enemies = pos.occupied_by(!color);
    for target in attacks::tables().pawn_attacks(color, from).iter() {
        if enemies.is_set(target) || is_en_passant_target(color, target, pos) {
            targets.set(target);
        }
    }
    targets
}

/// The en passant square is only capturable by the side to move, and only
/// from the rank the passed pawn landed beside.
pub fn is_en_passant_target(color: Color, target: Square, pos: &Position) -> bool {
    pos.side_to_move == color
        && pos.en_passant == Some(target)
        && target.rank() == color.promotion_rank().abs_diff(2)
}

// ---------------------------------------------------------------------------
// Castling
// ---------------------------------------------------------------------------

/// King destination for castling to one side.
pub fn castle_target(color: Color, side: CastleSide) -> Square {
    let file = match side {
        CastleSide::Kingside => 6,
        CastleSide::Queenside => 2,
    };
    Square::from_file_rank(file, color.back_rank())
}

fn castle_side_for(color: Color, from: Square, to: Square) -> Option<CastleSide> {
    if from != Square::from_file_rank(4, color.back_rank()) {
        return None;
    }
    CastleSide::BOTH
        .into_iter()
        .find(|&side| castle_target(color, side) == to)
}

/// Can `color` castle to `side` right now?
///
/// Needs the right to be held, king and rook on their home squares, every
/// square between them empty, the king not in check, and no square the king
/// stands on or crosses attacked by the opponent.
pub fn can_castle(pos: &Position, color: Color, side: CastleSide) -> bool {
    if !pos
        .castling_rights
        .has(CastlingRights::flag(color, side))
    {
        return false;
    }

    let rank = color.back_rank();
    let king_from = Square::from_file_rank(4, rank);
    let rook_file = match side {
        CastleSide::Kingside => 7,
        CastleSide::Queenside => 0,
    };
    if pos.piece_at(king_from) != Some(Piece::new(PieceType::King, color))
        || pos.piece_at(Square::from_file_rank(rook_file, rank))
            != Some(Piece::new(PieceType::Rook, color))
    {
        return false;
    }

    let between: &[u8] = match side {
        CastleSide::Kingside => &[5, 6],
        CastleSide::Queenside => &[1, 2, 3],
    };
    if between
        .iter()
        .any(|&file| pos.piece_at(Square::from_file_rank(file, rank)).is_some())
    {
        return false;
    }

    let transit: &[u8] = match side {
        CastleSide::Kingside => &[4, 5, 6],
        CastleSide::Queenside => &[4, 3, 2],
    };
    !transit
        .iter()
        .any(|&file| pos.is_square_attacked(Square::from_file_rank(file, rank), !color))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn mv(p: &Position, from: &str, to: &str) -> Move {
        let kind = p.piece_at(sq(from)).map_or(PieceType::Pawn, |pc| pc.kind);
        Move::new(sq(from), sq(to), kind)
    }

    fn valid(p: &Position, from: &str, to: &str) -> bool {
        is_geometrically_valid(&mv(p, from, to), p)
    }

    // ===================================================================
    // attacked_squares
    // ===================================================================

    #[test]
    fn slider_rays_stop_at_first_piece_inclusive() {
        let p = pos("4k3/8/8/8/1p1R2P1/8/8/4K3 w - - 0 1");
        let rook = p.piece_at(sq("d4")).unwrap();
        let atk = attacked_squares(rook, sq("d4"), &p);
        assert!(atk.is_set(sq("b4")), "enemy blocker is attacked");
        assert!(!atk.is_set(sq("a4")));
        assert!(atk.is_set(sq("g4")), "friendly blocker is covered");
        assert!(!atk.is_set(sq("h4")));
        assert!(atk.is_set(sq("d8")));
        assert!(atk.is_set(sq("d1")));
    }

    #[test]
    fn pawn_attacks_diagonals_only() {
        let p = Position::starting();
        let pawn = p.piece_at(sq("e2")).unwrap();
        let atk = attacked_squares(pawn, sq("e2"), &p);
        assert_eq!(atk.pop_count(), 2);
        assert!(atk.is_set(sq("d3")) && atk.is_set(sq("f3")));
        assert!(!atk.is_set(sq("e3")));
    }

    // ===================================================================
    // Geometric validity
    // ===================================================================

    #[test]
    fn pawn_pushes() {
        let p = Position::starting();
        assert!(valid(&p, "e2", "e3"));
        assert!(valid(&p, "e2", "e4"));
        assert!(!valid(&p, "e2", "e5"));
        assert!(!valid(&p, "e2", "d3"), "diagonal needs a capture");
        assert!(!valid(&p, "e2", "e1"), "pawns never move backwards");
    }

    #[test]
    fn pawn_double_push_needs_both_squares_empty() {
        let p = pos("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1");
        assert!(!valid(&p, "e2", "e3"));
        assert!(!valid(&p, "e2", "e4"));
        let p = pos("4k3/8/8/8/4n3/8/4P3/4K3 w - - 0 1");
        assert!(valid(&p, "e2", "e3"));
        assert!(!valid(&p, "e2", "e4"));
    }

    #[test]
    fn pawn_double_push_only_from_start_rank() {
        let p = pos("4k3/8/8/8/8/4P3/8/4K3 w - - 0 1");
        assert!(!valid(&p, "e3", "e5"));
    }

    #[test]
    fn black_pawn_direction() {
        let p = pos("4k3/3p4/8/8/8/8/8/4K3 b - - 0 1");
        assert!(valid(&p, "d7", "d6"));
        assert!(valid(&p, "d7", "d5"));
        assert!(!valid(&p, "d7", "d8"));
    }

    #[test]
    fn en_passant_target_counts_as_capture() {
        let p = pos("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        assert!(valid(&p, "e5", "f6"));
        assert!(!valid(&p, "e5", "d6"), "d6 is not the en passant square");
    }

    #[test]
    fn en_passant_only_for_side_to_move() {
        // White just played e2e4; a white pawn on d2 cannot use e3.
        let p = pos("4k3/8/8/8/4P3/8/3P4/4K3 b - e3 0 1");
        assert!(!is_en_passant_target(Color::White, sq("e3"), &p));
    }

    #[test]
    fn knight_jumps_over_pieces() {
        let p = Position::starting();
        assert!(valid(&p, "g1", "f3"));
        assert!(!valid(&p, "g1", "e2"), "own pawn on e2");
        assert!(!valid(&p, "g1", "g3"));
    }

    #[test]
    fn sliders_need_clear_path() {
        let p = Position::starting();
        assert!(!valid(&p, "f1", "c4"));
        assert!(!valid(&p, "a1", "a3"));
        assert!(!valid(&p, "d1", "h5"));
        let p = pos("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        assert!(valid(&p, "f1", "c4"));
        assert!(valid(&p, "d1", "h5"));
        assert!(!valid(&p, "f1", "f3"), "bishop cannot move straight");
    }

    #[test]
    fn cannot_capture_own_piece_or_stay_put() {
        let p = Position::starting();
        assert!(!valid(&p, "a1", "a2"));
        assert!(!valid(&p, "d1", "d1"));
    }

    #[test]
    fn empty_origin_is_invalid() {
        let p = Position::starting();
        assert!(!is_geometrically_valid(&Move::new(sq("e4"), sq("e5"), PieceType::Pawn), &p));
    }

    #[test]
    fn king_steps() {
        let p = pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert!(valid(&p, "e1", "d2"));
        assert!(!valid(&p, "e1", "e3"));
    }

    // ===================================================================
    // Castling
    // ===================================================================

    #[test]
    fn castling_both_sides_available() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        assert!(can_castle(&p, Color::White, CastleSide::Kingside));
        assert!(can_castle(&p, Color::White, CastleSide::Queenside));
        assert!(can_castle(&p, Color::Black, CastleSide::Kingside));
        assert!(valid(&p, "e1", "g1"));
        assert!(valid(&p, "e1", "c1"));
    }

    #[test]
    fn castling_blocked_by_pieces() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/RN2K1NR w KQkq - 0 1");
        assert!(!can_castle(&p, Color::White, CastleSide::Kingside));
        assert!(!can_castle(&p, Color::White, CastleSide::Queenside));
    }

    #[test]
    fn castling_queenside_b_file_must_be_empty() {
        let p = pos("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1");
        assert!(!can_castle(&p, Color::White, CastleSide::Queenside));
    }

    #[test]
    fn castling_without_right() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w Qkq - 0 1");
        assert!(!can_castle(&p, Color::White, CastleSide::Kingside));
        assert!(can_castle(&p, Color::White, CastleSide::Queenside));
    }

    #[test]
    fn castling_through_attacked_square() {
        // Black rook on f8 covers f1.
        let p = pos("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!can_castle(&p, Color::White, CastleSide::Kingside));
        assert!(can_castle(&p, Color::White, CastleSide::Queenside));
    }

    #[test]
    fn castling_out_of_check() {
        let p = pos("4k3/8/8/8/8/8/8/R3K2r w Q - 0 1");
        assert!(!can_castle(&p, Color::White, CastleSide::Queenside));
    }

    #[test]
    fn castling_queenside_b_file_attack_is_allowed() {
        // Only the king's path matters; b1 may be attacked.
        let p = pos("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert!(can_castle(&p, Color::White, CastleSide::Queenside));
    }

    #[test]
    fn castle_targets() {
        assert_eq!(castle_target(Color::White, CastleSide::Kingside), sq("g1"));
        assert_eq!(castle_target(Color::Black, CastleSide::Queenside), sq("c8"));
    }
}
