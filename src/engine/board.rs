//! Chess position representation.
//!
//! `Position` stores piece placement as an 8×8 mailbox (64 optional pieces in
//! LERF order), per-colour occupancy bitboards kept in step with it, side to
//! move, castling rights, en-passant square and move counters.
//!
//! Positions are values: [`Position::apply_move`] returns a new position and
//! never touches the one it was called on, so callers keep history by simply
//! holding on to the old value.

use crate::engine::attacks;
use crate::engine::types::{Bitboard, CastlingRights, ChessError, Color, Move, Piece, PieceType, Square};

/// FEN of the standard starting array.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position.
///
/// Board layout follows LERF (Little-Endian Rank-File) mapping:
/// a1 = 0, b1 = 1, … h1 = 7, a2 = 8, … h8 = 63.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    /// Piece on each square.
    board: [Option<Piece>; 64],

    /// Per-colour occupancy, derived from `board`.
    occupied: [Bitboard; 2],

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub en_passant: Option<Square>,

    /// Half-move clock for the 50-move rule (reset on pawn move or capture).
    pub halfmove_clock: u16,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u16,
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

impl Position {
    /// Create an empty board with no pieces.
    pub fn empty() -> Self {
        Position {
            board: [None; 64],
            occupied: [Bitboard::EMPTY; 2],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting FEN is always valid")
    }

    // -----------------------------------------------------------------------
    // Piece manipulation (low-level)
    // -----------------------------------------------------------------------

    /// Place a piece on a square, replacing whatever stood there.
    #[inline]
    pub fn put_piece(&mut self, sq: Square, piece: Piece) {
        self.remove_piece(sq);
        self.board[sq.index()] = Some(piece);
        self.occupied[piece.color.index()].set(sq);
    }

    /// Remove and return the piece on a square.
    #[inline]
    pub fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.board[sq.index()].take()?;
        self.occupied[piece.color.index()].clear(sq);
        Some(piece)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    /// All occupied squares.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.occupied[0] | self.occupied[1]
    }

    /// Squares occupied by one colour.
    #[inline]
    pub fn occupied_by(&self, color: Color) -> Bitboard {
        self.occupied[color.index()]
    }

    /// Every piece of `color` with its square, a1 first.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied[color.index()]
            .iter()
            .filter_map(move |sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }

    /// Squares holding a given piece.
    pub fn squares_of(&self, color: Color, kind: PieceType) -> Bitboard {
        self.pieces(color)
            .filter(|(_, piece)| piece.kind == kind)
            .map(|(sq, _)| sq)
            .collect()
    }

    /// Number of pieces of a kind held by `color`.
    pub fn count(&self, color: Color, kind: PieceType) -> u32 {
        self.squares_of(color, kind).pop_count()
    }

    /// Find the king square for the given colour.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, piece)| piece.kind == PieceType::King)
            .map(|(sq, _)| sq)
    }

    // -----------------------------------------------------------------------
    // Attack detection
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of colour `by`?
    ///
    /// Looks outward from `sq` using each piece's pattern in reverse, which
    /// avoids building a full attack map for one-off questions.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        let t = attacks::tables();
        let occ = self.occupied();
        let holds = |from: Square, kinds: &[PieceType]| {
            self.piece_at(from)
                .is_some_and(|p| p.color == by && kinds.contains(&p.kind))
        };

        // A pawn of `by` attacks `sq` from where a pawn of the other colour
        // on `sq` would attack.
        if t.pawn_attacks(!by, sq).iter().any(|from| holds(from, &[PieceType::Pawn])) {
            return true;
        }
        if t.knight_attacks(sq).iter().any(|from| holds(from, &[PieceType::Knight])) {
            return true;
        }
        if t.king_attacks(sq).iter().any(|from| holds(from, &[PieceType::King])) {
            return true;
        }
        if attacks::rook_attacks(sq, occ)
            .iter()
            .any(|from| holds(from, &[PieceType::Rook, PieceType::Queen]))
        {
            return true;
        }
        attacks::bishop_attacks(sq, occ)
            .iter()
            .any(|from| holds(from, &[PieceType::Bishop, PieceType::Queen]))
    }

    // -----------------------------------------------------------------------
    // Move application
    // -----------------------------------------------------------------------

    /// Return the position after `mv`, leaving `self` untouched.
    ///
    /// This is the only move-application routine in the crate. It does not
    /// check legality: pass moves taken from the move generator.
    pub fn apply_move(&self, mv: &Move) -> Position {
        let mut next = self.clone();
        let Some(moving) = next.remove_piece(mv.from) else {
            debug_assert!(false, "no piece on {} for move {mv}", mv.from);
            return next;
        };
        let us = moving.color;
        let is_pawn = moving.kind == PieceType::Pawn;

        // ---- Captures, including the pawn taken en passant ----
        let mut captured = next.remove_piece(mv.to);
        if is_pawn
            && captured.is_none()
            && self.en_passant == Some(mv.to)
            && mv.from.file() != mv.to.file()
        {
            let victim = Square::from_file_rank(mv.to.file(), mv.from.rank());
            captured = next.remove_piece(victim);
        }

        // ---- Land the piece, promoting on the last rank ----
        let landing = if is_pawn && mv.to.rank() == us.promotion_rank() {
            Piece::new(mv.promotion.unwrap_or(PieceType::Queen), us)
        } else {
            moving
        };
        next.put_piece(mv.to, landing);

        // ---- Castling: move the rook ----
        if moving.kind == PieceType::King && mv.from.file().abs_diff(mv.to.file()) == 2 {
            let (rook_from, rook_to) = castling_rook_squares(mv.from, mv.to);
            if let Some(rook) = next.remove_piece(rook_from) {
                next.put_piece(rook_to, rook);
            }
        }

        // ---- Castling rights ----
        // Moving king or rook, or capturing on a rook's home square.
        next.castling_rights.0 &= CASTLING_MASK[mv.from.index()];
        next.castling_rights.0 &= CASTLING_MASK[mv.to.index()];

        // ---- En passant target lives for exactly one ply ----
        next.en_passant = if is_pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2 {
            mv.from.offset(0, us.forward())
        } else {
            None
        };

        // ---- Clocks ----
        if is_pawn || captured.is_some() {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock = next.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            next.fullmove_number = next.fullmove_number.saturating_add(1);
        }

        next.side_to_move = !us;
        next
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), useful for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                s.push(self.piece_at(sq).map_or('.', Piece::to_char));
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

// ---------------------------------------------------------------------------
// Castling helpers (free functions)
// ---------------------------------------------------------------------------

/// For a castling king move, return (rook_from, rook_to).
/// A FEN counter field: ASCII digits only, no sign.
fn parse_counter(field: &str, name: &str) -> Result<u16, ChessError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ChessError::InvalidFen(format!("invalid {name}: '{field}'")));
    }
    field
        .parse::<u16>()
        .map_err(|_| ChessError::InvalidFen(format!("invalid {name}: '{field}'")))
}

fn castling_rook_squares(king_from: Square, king_to: Square) -> (Square, Square) {
    let rank = king_from.rank();
    if king_to.file() > king_from.file() {
        (Square::from_file_rank(7, rank), Square::from_file_rank(5, rank))
    } else {
        (Square::from_file_rank(0, rank), Square::from_file_rank(3, rank))
    }
}

/// Mask table indexed by square index. When a move touches a square, AND the
/// castling rights with this mask. The king's home square removes both of
/// that side's rights; a rook's home square removes one.
#[rustfmt::skip]
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    mask[0]  = 0b1111 & !CastlingRights::WHITE_QUEENSIDE;
    mask[4]  = 0b1111 & !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
    mask[7]  = 0b1111 & !CastlingRights::WHITE_KINGSIDE;
    mask[56] = 0b1111 & !CastlingRights::BLACK_QUEENSIDE;
    mask[60] = 0b1111 & !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
    mask[63] = 0b1111 & !CastlingRights::BLACK_KINGSIDE;
    mask
};

// ---------------------------------------------------------------------------
// FEN parsing & generation
// ---------------------------------------------------------------------------

impl Position {
    /// Parse a FEN string into a `Position`.
    ///
    /// Validates all 6 fields (piece placement, side to move, castling,
    /// en passant, halfmove clock, fullmove number) and ensures exactly one
    /// king per side.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut pos = Position::empty();

        // ----- Field 1: Piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8; // FEN starts from rank 8
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(ChessError::InvalidFen(format!(
                        "too many squares in rank {}",
                        rank + 1
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid empty count '{ch}' in rank {}",
                            rank + 1
                        )));
                    }
                    file += digit as u8;
                } else if let Some(piece) = Piece::from_char(ch) {
                    pos.put_piece(Square::from_file_rank(file, rank), piece);
                    file += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        for color in Color::BOTH {
            let king_count = pos.count(color, PieceType::King);
            if king_count != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "{color} has {king_count} kings (expected 1)"
                )));
            }
        }

        // ----- Field 2: Side to move -----
        pos.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: Castling availability -----
        pos.castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::InvalidFen(format!("invalid castling string: '{}'", fields[2]))
        })?;

        // ----- Field 4: En passant target square -----
        if fields[3] != "-" {
            let ep_sq = Square::from_algebraic(fields[3]).ok_or_else(|| {
                ChessError::InvalidFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            let rank = ep_sq.rank();
            if rank != 2 && rank != 5 {
                return Err(ChessError::InvalidFen(format!(
                    "en passant square {} is not on rank 3 or 6",
                    fields[3]
                )));
            }
            pos.en_passant = Some(ep_sq);
        }

        // ----- Field 5: Halfmove clock -----
        pos.halfmove_clock = parse_counter(fields[4], "halfmove clock")?;

        // ----- Field 6: Fullmove number -----
        pos.fullmove_number = parse_counter(fields[5], "fullmove number")?;
        if pos.fullmove_number == 0 {
            return Err(ChessError::InvalidFen(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        Ok(pos)
    }

    /// Export the position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        // ----- Field 1: Piece placement -----
        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                match self.piece_at(Square::from_file_rank(file, rank)) {
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        // ----- Fields 2-6 -----
        let ep = self
            .en_passant
            .map_or_else(|| "-".to_string(), Square::to_algebraic);
        fen.push_str(&format!(
            " {} {} {} {} {}",
            self.side_to_move.fen_char(),
            self.castling_rights.to_fen(),
            ep,
            self.halfmove_clock,
            self.fullmove_number
        ));

        fen
    }
}

impl std::str::FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::starting()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
