//! Legal move generation.
//!
//! Pipeline:
//!   1. For every piece of the requested colour, take its destination
//!      squares from the rule set and wrap each one as a candidate `Move`.
//!   2. Filter: apply the candidate to a copy and build a fresh
//!      `BoardAnalyzer` on the result; reject it if the mover's king is
//!      attacked. This is the only legality check.
//!   3. Expand promotions into one move per promotion piece and append
//!      castling moves the king's rule accepts.
//!
//! Validating a move typed by a caller is a lookup in this list
//! ([`resolve_move`]), so validation and application can never disagree.

use std::collections::HashMap;

use crate::engine::analyzer::BoardAnalyzer;
use crate::engine::board::Position;
use crate::engine::rules;
use crate::engine::types::{
    CastleSide, ChessError, Color, Move, MoveFlags, MoveRequest, Piece, PieceType, Square,
};

// =========================================================================
// Public API
// =========================================================================

/// Generate all legal moves for `color` in `pos`.
///
/// `color` need not be the side to move (mobility counts both sides); en
/// passant captures are only ever available to the side to move.
pub fn legal_moves(pos: &Position, color: Color) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    for (from, piece) in pos.pieces(color) {
        push_piece_moves(pos, from, piece, &mut moves);
    }
    push_castling_moves(pos, color, &mut moves);
    moves
}

/// Generate all legal moves of the piece standing on `from`.
pub fn legal_moves_from(pos: &Position, from: Square) -> Vec<Move> {
    match pos.piece_at(from) {
        Some(piece) => legal_moves(pos, piece.color)
            .into_iter()
            .filter(|m| m.from == from)
            .collect(),
        None => Vec::new(),
    }
}

/// Parse coordinate text and return the matching legal move for the side
/// to move.
///
/// Fails with a format error when the text is malformed and with
/// `IllegalMove` when it is well formed but not playable. A promoting move
/// given without a letter resolves to the queen promotion.
pub fn resolve_move(pos: &Position, text: &str) -> Result<Move, ChessError> {
    let request = MoveRequest::parse(text)?;
    legal_moves(pos, pos.side_to_move)
        .into_iter()
        .find(|mv| request.matches(mv))
        .ok_or_else(|| illegal_move(pos, text, &request))
}

/// The error for a well-formed request that matched no legal move.
pub(crate) fn illegal_move(pos: &Position, text: &str, request: &MoveRequest) -> ChessError {
    ChessError::IllegalMove {
        mv: text.trim().to_string(),
        reason: rejection_reason(pos, request),
    }
}

/// Does applying `mv` leave `color`'s king attacked?
pub fn leaves_king_attacked(pos: &Position, mv: &Move, color: Color) -> bool {
    let next = pos.apply_move(mv);
    BoardAnalyzer::new(&next).is_in_check(color)
}

/// Count leaf nodes of the legal move tree to `depth` plies.
pub fn perft(pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(pos, pos.side_to_move);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| perft(&pos.apply_move(mv), depth - 1))
        .sum()
}

// =========================================================================
// Candidate construction (internal)
// =========================================================================

fn push_piece_moves(pos: &Position, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    for to in rules::move_targets(piece, from, pos).iter() {
        let candidate = candidate_move(pos, from, to, piece);
        if leaves_king_attacked(pos, &candidate, piece.color) {
            continue;
        }
        if piece.kind == PieceType::Pawn && to.rank() == piece.color.promotion_rank() {
            moves.extend(
                PieceType::PROMOTIONS
                    .into_iter()
                    .map(|kind| candidate.with_promotion(kind)),
            );
        } else {
            moves.push(candidate);
        }
    }
}

fn candidate_move(pos: &Position, from: Square, to: Square, piece: Piece) -> Move {
    if let Some(victim) = pos.piece_at(to) {
        return Move::capture(from, to, piece.kind, victim.kind);
    }
    if piece.kind == PieceType::Pawn {
        if from.file() != to.file() {
            // A diagonal step onto an empty square is only offered for the
            // en passant target.
            return Move::capture(from, to, PieceType::Pawn, PieceType::Pawn)
                .with_flags(MoveFlags::EN_PASSANT);
        }
        if from.rank().abs_diff(to.rank()) == 2 {
            return Move::new(from, to, PieceType::Pawn).with_flags(MoveFlags::DOUBLE_PUSH);
        }
    }
    Move::new(from, to, piece.kind)
}

fn push_castling_moves(pos: &Position, color: Color, moves: &mut Vec<Move>) {
    let king_from = Square::from_file_rank(4, color.back_rank());
    for side in CastleSide::BOTH {
        if !rules::can_castle(pos, color, side) {
            continue;
        }
        let candidate = Move::new(king_from, rules::castle_target(color, side), PieceType::King)
            .with_flags(MoveFlags::CASTLING);
        if !leaves_king_attacked(pos, &candidate, color) {
            moves.push(candidate);
        }
    }
}

fn rejection_reason(pos: &Position, request: &MoveRequest) -> String {
    match pos.piece_at(request.from) {
        None => format!("no piece on {}", request.from),
        Some(piece) if piece.color != pos.side_to_move => {
            format!("it is {}'s turn", pos.side_to_move)
        }
        Some(piece) => {
            let shaped = Move::new(request.from, request.to, piece.kind);
            if request.promotion.is_some()
                && !(piece.kind == PieceType::Pawn
                    && request.to.rank() == piece.color.promotion_rank())
            {
                "promotion letter on a move that does not promote".to_string()
            } else if rules::is_geometrically_valid(&shaped, pos) {
                "move would leave the king in check".to_string()
            } else {
                format!("{} cannot move from {} to {}", piece.kind, request.from, request.to)
            }
        }
    }
}

// =========================================================================
// Move cache
// =========================================================================

/// Legal-move lists keyed by the full FEN of a position and the colour.
///
/// Owned by one game; never share a cache between games. Call
/// [`MoveCache::invalidate`] with the old position whenever the owner moves
/// on from it.
#[derive(Debug, Default)]
pub struct MoveCache {
    entries: HashMap<(String, Color), Vec<Move>>,
}

impl MoveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Legal moves for `color`, generated on first request.
    pub fn legal_moves(&mut self, pos: &Position, color: Color) -> &[Move] {
        self.entries
            .entry((pos.to_fen(), color))
            .or_insert_with(|| legal_moves(pos, color))
    }

    /// Drop every entry for `pos`.
    pub fn invalidate(&mut self, pos: &Position) {
        let fen = pos.to_fen();
        for color in Color::BOTH {
            self.entries.remove(&(fen.clone(), color));
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn count_legal(fen: &str) -> usize {
        let p = pos(fen);
        legal_moves(&p, p.side_to_move).len()
    }

    fn moves_from(p: &Position, from: &str) -> Vec<Move> {
        legal_moves_from(p, sq(from))
    }

    // -------------------------------------------------------------------
    // Starting position
    // -------------------------------------------------------------------

    #[test]
    fn starting_position_has_20_moves() {
        assert_eq!(
            count_legal("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            20
        );
    }

    #[test]
    fn starting_position_after_e4() {
        assert_eq!(
            count_legal("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"),
            20
        );
    }

    #[test]
    fn moves_for_side_not_to_move() {
        let p = pos("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        // White's options after 1.e4, counted while Black is to move.
        assert_eq!(legal_moves(&p, Color::White).len(), 30);
    }

    // -------------------------------------------------------------------
    // Pawn moves
    // -------------------------------------------------------------------

    #[test]
    fn pawn_single_and_double_push() {
        let p = pos("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        let pawn_moves = moves_from(&p, "e2");
        assert_eq!(pawn_moves.len(), 2);
        let double = pawn_moves.iter().find(|m| m.to == sq("e4")).unwrap();
        assert!(double.flags.is_double_push());
    }

    #[test]
    fn pawn_blocked() {
        let p = pos("4k3/8/8/8/8/4p3/4P3/4K3 w - - 0 1");
        assert!(moves_from(&p, "e2").is_empty());
    }

    #[test]
    fn pawn_capture_records_victim() {
        let p = pos("4k3/8/8/8/8/3r4/4P3/4K3 w - - 0 1");
        let capture = moves_from(&p, "e2")
            .into_iter()
            .find(|m| m.to == sq("d3"))
            .unwrap();
        assert_eq!(capture.captured, Some(PieceType::Rook));
        assert!(capture.flags.is_capture());
    }

    #[test]
    fn pawn_promotion_expands_to_four() {
        let p = pos("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let promo_moves = moves_from(&p, "e7");
        assert_eq!(promo_moves.len(), 4);
        let kinds: Vec<_> = promo_moves.iter().filter_map(|m| m.promotion).collect();
        assert_eq!(kinds, PieceType::PROMOTIONS.to_vec());
    }

    #[test]
    fn promotion_capture_expands_too() {
        let p = pos("3r3k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let promo = moves_from(&p, "e7");
        assert_eq!(promo.len(), 8, "push and capture, four pieces each");
        assert_eq!(promo.iter().filter(|m| m.captured == Some(PieceType::Rook)).count(), 4);
    }

    #[test]
    fn en_passant_move_generated() {
        // After 1. e4 d5 2. e5 f5, White can play exf6 e.p.
        let p = pos("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        let moves = legal_moves(&p, Color::White);
        let ep_moves: Vec<_> = moves.iter().filter(|m| m.is_en_passant()).collect();
        assert_eq!(ep_moves.len(), 1);
        assert_eq!(ep_moves[0].to, sq("f6"));
        assert_eq!(ep_moves[0].captured, Some(PieceType::Pawn));
    }

    #[test]
    fn en_passant_exposing_king_is_illegal() {
        // Both pawns leave the fifth rank, opening the rook onto the king.
        let p = pos("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2");
        let moves = legal_moves(&p, Color::White);
        assert!(!moves.iter().any(|m| m.is_en_passant()));
    }

    // -------------------------------------------------------------------
    // Castling
    // -------------------------------------------------------------------

    fn castles(fen: &str) -> Vec<Move> {
        let p = pos(fen);
        legal_moves(&p, p.side_to_move)
            .into_iter()
            .filter(|m| m.is_castling())
            .collect()
    }

    #[test]
    fn castling_both_sides() {
        let moves = castles("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        assert_eq!(moves.len(), 2);
    }

    #[test]
    fn castling_blocked() {
        assert!(castles("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/RN2K1NR w KQkq - 0 1").is_empty());
    }

    #[test]
    fn castling_through_check_forbidden() {
        let moves = castles("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].to, sq("c1"));
    }

    #[test]
    fn no_castling_while_in_check() {
        assert!(castles("4k3/8/8/8/8/8/8/R3K2r w Q - 0 1").is_empty());
    }

    #[test]
    fn no_castling_after_right_lost() {
        assert!(castles("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w kq - 0 1").is_empty());
    }

    // -------------------------------------------------------------------
    // Check evasion
    // -------------------------------------------------------------------

    #[test]
    fn must_escape_check() {
        let p = pos("4k3/8/8/8/8/8/8/R3K2q w Q - 0 1");
        let moves = legal_moves(&p, Color::White);
        assert!(!moves.is_empty());
        for mv in &moves {
            let next = p.apply_move(mv);
            assert!(
                !next.is_square_attacked(next.king_square(Color::White).unwrap(), Color::Black),
                "move {mv} leaves king in check"
            );
        }
    }

    #[test]
    fn pinned_piece_moves_along_pin_only() {
        let p = pos("4k3/4r3/8/8/8/8/4R3/4K3 w - - 0 1");
        let rook_moves = moves_from(&p, "e2");
        assert!(!rook_moves.is_empty());
        assert!(rook_moves.iter().all(|m| m.to.file() == 4));
    }

    // -------------------------------------------------------------------
    // Known positions
    // -------------------------------------------------------------------

    #[test]
    fn kiwipete_48_moves() {
        assert_eq!(
            count_legal("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"),
            48
        );
    }

    #[test]
    fn position_3_14_moves() {
        assert_eq!(count_legal("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"), 14);
    }

    #[test]
    fn position_4_6_moves() {
        assert_eq!(
            count_legal("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1"),
            6
        );
    }

    #[test]
    fn position_5_44_moves() {
        assert_eq!(
            count_legal("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8"),
            44
        );
    }

    #[test]
    fn perft_small_depths() {
        let p = Position::starting();
        assert_eq!(perft(&p, 0), 1);
        assert_eq!(perft(&p, 1), 20);
        assert_eq!(perft(&p, 2), 400);
    }

    // -------------------------------------------------------------------
    // legal_moves_from / resolve_move
    // -------------------------------------------------------------------

    #[test]
    fn legal_moves_from_empty_square() {
        assert!(moves_from(&Position::starting(), "e4").is_empty());
    }

    #[test]
    fn legal_moves_from_knight() {
        let targets: Vec<Square> = moves_from(&Position::starting(), "g1")
            .iter()
            .map(|m| m.to)
            .collect();
        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&sq("f3")) && targets.contains(&sq("h3")));
    }

    #[test]
    fn resolve_legal_move() {
        let mv = resolve_move(&Position::starting(), "e2e4").unwrap();
        assert_eq!(mv.from, sq("e2"));
        assert!(mv.flags.is_double_push());
    }

    #[test]
    fn resolve_defaults_promotion_to_queen() {
        let p = pos("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(resolve_move(&p, "e7e8").unwrap().promotion, Some(PieceType::Queen));
        assert_eq!(resolve_move(&p, "E7E8N").unwrap().promotion, Some(PieceType::Knight));
    }

    #[test]
    fn resolve_rejects_with_distinct_errors() {
        let p = Position::starting();
        assert!(resolve_move(&p, "e2e9").unwrap_err().is_format_error());
        assert!(resolve_move(&p, "e2").unwrap_err().is_format_error());

        for (text, reason) in [
            ("e2e5", "cannot move"),
            ("e3e4", "no piece"),
            ("e7e5", "turn"),
            ("e2e4q", "promotion letter"),
        ] {
            match resolve_move(&p, text) {
                Err(ChessError::IllegalMove { mv, reason: got }) => {
                    assert_eq!(mv, text);
                    assert!(got.contains(reason), "{text}: unexpected reason {got:?}");
                }
                other => panic!("{text}: expected IllegalMove, got {other:?}"),
            }
        }
    }

    #[test]
    fn resolve_rejects_self_check() {
        let p = pos("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1");
        match resolve_move(&p, "e2d3") {
            Err(ChessError::IllegalMove { reason, .. }) => assert!(reason.contains("check")),
            other => panic!("expected IllegalMove, got {other:?}"),
        }
    }

    // -------------------------------------------------------------------
    // Idempotence and cache
    // -------------------------------------------------------------------

    #[test]
    fn legal_moves_idempotent() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(legal_moves(&p, Color::White), legal_moves(&p, Color::White));
    }

    #[test]
    fn move_cache_keys_by_position_and_colour() {
        let mut cache = MoveCache::new();
        let start = Position::starting();
        assert_eq!(cache.legal_moves(&start, Color::White).len(), 20);
        assert_eq!(cache.legal_moves(&start, Color::Black).len(), 20);
        assert_eq!(cache.len(), 2);

        let after = start.apply_move(&resolve_move(&start, "e2e4").unwrap());
        assert_eq!(cache.legal_moves(&after, Color::Black).len(), 20);
        assert_eq!(cache.len(), 3);

        cache.invalidate(&start);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
