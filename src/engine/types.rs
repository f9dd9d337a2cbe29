use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const BOTH: [Color; 2] = [Color::White, Color::Black];

    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rank (0-based) the side's pieces start on.
    #[inline]
    pub const fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank (0-based) the side's pawns start on.
    #[inline]
    pub const fn pawn_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Rank (0-based) on which the side's pawns promote.
    #[inline]
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Forward rank step for the side's pawns.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// FEN side-to-move letter.
    pub fn fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// All piece types in order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Promotion choices, strongest first.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Index for array lookups: Pawn=0 .. King=5.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Material value in centipawns.
    pub fn value(self) -> i32 {
        match self {
            PieceType::Pawn => 100,
            PieceType::Knight => 320,
            PieceType::Bishop => 330,
            PieceType::Rook => 500,
            PieceType::Queen => 900,
            PieceType::King => 0, // not used numerically
        }
    }

    /// Lowercase letter for the piece kind.
    pub fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    /// Parse a promotion letter (`Q`, `R`, `B`, `N`, any case).
    pub fn from_promotion_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(PieceType::Queen),
            'r' => Some(PieceType::Rook),
            'b' => Some(PieceType::Bishop),
            'n' => Some(PieceType::Knight),
            _ => None,
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "pawn"),
            PieceType::Knight => write!(f, "knight"),
            PieceType::Bishop => write!(f, "bishop"),
            PieceType::Rook => write!(f, "rook"),
            PieceType::Queen => write!(f, "queen"),
            PieceType::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A coloured piece as it sits on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceType,
    pub color: Color,
}

impl Piece {
    #[inline]
    pub const fn new(kind: PieceType, color: Color) -> Self {
        Piece { kind, color }
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub fn to_char(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parse a FEN piece letter; the case selects the colour.
    pub fn from_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some(Piece { kind, color })
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on the chess board (0..63, LERF: a1=0, h8=63).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(pub u8);

impl Square {
    #[inline]
    pub fn new(index: u8) -> Self {
        debug_assert!(index < 64, "Square index out of range: {index}");
        Square(index)
    }

    #[inline]
    pub fn file(self) -> u8 {
        self.0 & 7
    }

    #[inline]
    pub fn rank(self) -> u8 {
        self.0 >> 3
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn from_file_rank(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + file)
    }

    /// The square `df` files and `dr` ranks away, if it is on the board.
    #[inline]
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::from_file_rank(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// Light squares have an odd file + rank sum (h1 is light).
    #[inline]
    pub fn is_light(self) -> bool {
        (self.file() + self.rank()) & 1 == 1
    }

    /// All 64 squares, a1 first.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(Square)
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square::from_file_rank(file, rank))
        } else {
            None
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        format!("{file}{rank}")
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl std::str::FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s).ok_or_else(|| ChessError::InvalidSquare(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Bitboard
// ---------------------------------------------------------------------------

/// A set of squares, one bit per square.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bitboard(pub u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);

    #[inline]
    pub fn from_square(sq: Square) -> Self {
        Bitboard(1u64 << sq.0)
    }

    #[inline]
    pub fn is_set(self, sq: Square) -> bool {
        self.0 & (1u64 << sq.0) != 0
    }

    #[inline]
    pub fn set(&mut self, sq: Square) {
        self.0 |= 1u64 << sq.0;
    }

    #[inline]
    pub fn clear(&mut self, sq: Square) {
        self.0 &= !(1u64 << sq.0);
    }

    #[inline]
    pub fn pop_count(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_not_empty(self) -> bool {
        self.0 != 0
    }

    /// Pop the least significant bit, returning the square.
    #[inline]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            let sq = Square(self.0.trailing_zeros() as u8);
            self.0 &= self.0 - 1;
            Some(sq)
        }
    }

    /// Iterate over all set bit positions as `Square`s.
    #[inline]
    pub fn iter(self) -> BitboardIter {
        BitboardIter(self)
    }
}

/// Iterator over set bits in a `Bitboard`.
pub struct BitboardIter(Bitboard);

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Square> {
        self.0.pop_lsb()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.0.pop_count() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl FromIterator<Square> for Bitboard {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        let mut bb = Bitboard::EMPTY;
        for sq in iter {
            bb.set(sq);
        }
        bb
    }
}

impl std::ops::BitAnd for Bitboard {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Bitboard(self.0 & rhs.0)
    }
}

impl std::ops::BitOr for Bitboard {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Bitboard(self.0 | rhs.0)
    }
}

impl std::ops::Not for Bitboard {
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        Bitboard(!self.0)
    }
}

impl std::ops::BitOrAssign for Bitboard {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bitboard(0x{:016x})", self.0)?;
        for rank in (0..8).rev() {
            write!(f, "  {} ", rank + 1)?;
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                write!(f, "{}", if self.is_set(sq) { '1' } else { '.' })?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "    a b c d e f g h")
    }
}

// ---------------------------------------------------------------------------
// MoveFlags
// ---------------------------------------------------------------------------

/// Flags for special move types packed in a single byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MoveFlags(pub u8);

impl MoveFlags {
    pub const NONE: MoveFlags = MoveFlags(0);
    pub const CAPTURE: MoveFlags = MoveFlags(1);
    pub const EN_PASSANT: MoveFlags = MoveFlags(2);
    pub const CASTLING: MoveFlags = MoveFlags(4);
    pub const DOUBLE_PUSH: MoveFlags = MoveFlags(8);

    #[inline]
    pub fn is_capture(self) -> bool {
        self.0 & Self::CAPTURE.0 != 0
    }

    #[inline]
    pub fn is_en_passant(self) -> bool {
        self.0 & Self::EN_PASSANT.0 != 0
    }

    #[inline]
    pub fn is_castling(self) -> bool {
        self.0 & Self::CASTLING.0 != 0
    }

    #[inline]
    pub fn is_double_push(self) -> bool {
        self.0 & Self::DOUBLE_PUSH.0 != 0
    }
}

impl std::ops::BitOr for MoveFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        MoveFlags(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A move record: what moved where, what it took, and how.
///
/// A `Move` never refers back into the `Position` it was generated from, so
/// it can be applied to (or compared against) any copy of that position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    /// Kind of the moving piece (a pawn for promotions).
    pub piece: PieceType,
    /// Kind of the piece removed, including the pawn taken en passant.
    pub captured: Option<PieceType>,
    pub promotion: Option<PieceType>,
    pub flags: MoveFlags,
}

impl Move {
    pub fn new(from: Square, to: Square, piece: PieceType) -> Self {
        Move {
            from,
            to,
            piece,
            captured: None,
            promotion: None,
            flags: MoveFlags::NONE,
        }
    }

    pub fn capture(from: Square, to: Square, piece: PieceType, captured: PieceType) -> Self {
        Move {
            from,
            to,
            piece,
            captured: Some(captured),
            promotion: None,
            flags: MoveFlags::CAPTURE,
        }
    }

    /// Same move, promoting to `kind`.
    pub fn with_promotion(self, kind: PieceType) -> Self {
        Move {
            promotion: Some(kind),
            ..self
        }
    }

    /// Same move with extra flags set.
    pub fn with_flags(self, flags: MoveFlags) -> Self {
        Move {
            flags: self.flags | flags,
            ..self
        }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    #[inline]
    pub fn is_castling(&self) -> bool {
        self.flags.is_castling()
    }

    #[inline]
    pub fn is_en_passant(&self) -> bool {
        self.flags.is_en_passant()
    }

    #[inline]
    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// Coordinate notation, e.g. `e2e4` or `e7e8q`.
    pub fn coordinate(&self) -> String {
        self.to_string()
    }

    /// Parse coordinate text into a request; see [`MoveRequest::parse`].
    pub fn parse_coordinate(text: &str) -> Result<MoveRequest, ChessError> {
        MoveRequest::parse(text)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.letter())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MoveRequest
// ---------------------------------------------------------------------------

/// A move as typed by a caller: two squares and an optional promotion letter.
///
/// Only the format is checked here; whether the move is legal is decided by
/// matching it against a position's generated moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
}

impl MoveRequest {
    /// Parse coordinate notation (`e2e4`, `e7e8Q`, case-insensitive).
    pub fn parse(text: &str) -> Result<Self, ChessError> {
        let text = text.trim();
        if !text.is_ascii() || (text.len() != 4 && text.len() != 5) {
            return Err(ChessError::InvalidMoveFormat(format!(
                "'{text}' must be 4 or 5 characters"
            )));
        }
        let lower = text.to_ascii_lowercase();
        let from = Square::from_algebraic(&lower[0..2]).ok_or_else(|| {
            ChessError::InvalidMoveFormat(format!("'{text}': bad origin square"))
        })?;
        let to = Square::from_algebraic(&lower[2..4]).ok_or_else(|| {
            ChessError::InvalidMoveFormat(format!("'{text}': bad destination square"))
        })?;
        let promotion = match lower[4..].chars().next() {
            None => None,
            Some(c) => Some(PieceType::from_promotion_char(c).ok_or_else(|| {
                ChessError::InvalidMoveFormat(format!("'{text}': bad promotion letter '{c}'"))
            })?),
        };
        Ok(MoveRequest {
            from,
            to,
            promotion,
        })
    }

    /// Whether a generated move is the one requested. A promoting move
    /// requested without a letter matches the queen promotion.
    pub fn matches(&self, mv: &Move) -> bool {
        mv.from == self.from
            && mv.to == self.to
            && match (self.promotion, mv.promotion) {
                (None, None) => true,
                (None, Some(kind)) => kind == PieceType::Queen,
                (Some(want), Some(kind)) => want == kind,
                (Some(_), None) => false,
            }
    }
}

impl std::str::FromStr for MoveRequest {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoveRequest::parse(s)
    }
}

// ---------------------------------------------------------------------------
// CastlingRights
// ---------------------------------------------------------------------------

/// Which wing a castling move goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::Kingside, CastleSide::Queenside];
}

/// Castling availability bitfield: bits 0-3 = WK, WQ, BK, BQ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights(pub u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 2;
    pub const BLACK_KINGSIDE: u8 = 4;
    pub const BLACK_QUEENSIDE: u8 = 8;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// The flag bit for one colour and wing.
    #[inline]
    pub const fn flag(color: Color, side: CastleSide) -> u8 {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => Self::WHITE_KINGSIDE,
            (Color::White, CastleSide::Queenside) => Self::WHITE_QUEENSIDE,
            (Color::Black, CastleSide::Kingside) => Self::BLACK_KINGSIDE,
            (Color::Black, CastleSide::Queenside) => Self::BLACK_QUEENSIDE,
        }
    }

    #[inline]
    pub fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn remove(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    #[inline]
    pub fn can_castle(self, color: Color, side: CastleSide) -> bool {
        self.has(Self::flag(color, side))
    }

    /// Parse FEN castling string (e.g. "KQkq", "-", "Kq").
    pub fn from_fen(s: &str) -> Option<Self> {
        if s == "-" {
            return Some(CastlingRights::NONE);
        }
        if s.is_empty() {
            return None;
        }
        let mut rights = 0u8;
        for c in s.chars() {
            let flag = match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => return None,
            };
            if rights & flag != 0 {
                return None;
            }
            rights |= flag;
        }
        Some(CastlingRights(rights))
    }

    /// Convert to FEN castling string.
    pub fn to_fen(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        let mut s = String::with_capacity(4);
        if self.has(Self::WHITE_KINGSIDE) {
            s.push('K');
        }
        if self.has(Self::WHITE_QUEENSIDE) {
            s.push('Q');
        }
        if self.has(Self::BLACK_KINGSIDE) {
            s.push('k');
        }
        if self.has(Self::BLACK_QUEENSIDE) {
            s.push('q');
        }
        s
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Status of a position for the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Draw(reason) => reason.as_str(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Draw(_)
        )
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reason for a draw other than stalemate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    FiftyMoveRule,
    InsufficientMaterial,
}

impl DrawReason {
    pub fn as_str(&self) -> &str {
        match self {
            DrawReason::FiftyMoveRule => "fifty_move_rule",
            DrawReason::InsufficientMaterial => "insufficient_material",
        }
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors for the chess engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("invalid move format: {0}")]
    InvalidMoveFormat(String),

    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: String, reason: String },

    #[error("game is already over: {0}")]
    GameOver(String),

    #[error("no moves to undo")]
    NothingToUndo,
}

impl ChessError {
    /// Malformed input, as opposed to a well-formed request that the rules
    /// reject.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ChessError::InvalidFen(_)
                | ChessError::InvalidSquare(_)
                | ChessError::InvalidMoveFormat(_)
        )
    }
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

    #[test]
    fn color_toggle() {
        assert_eq!(!Color::White, Color::Black);
        assert_eq!(!Color::Black, Color::White);
    }

    #[test]
    fn color_ranks() {
        assert_eq!(Color::White.pawn_rank(), 1);
        assert_eq!(Color::Black.pawn_rank(), 6);
        assert_eq!(Color::White.promotion_rank(), 7);
        assert_eq!(Color::Black.promotion_rank(), 0);
        assert_eq!(Color::Black.back_rank(), 7);
    }

    #[test]
    fn piece_type_values() {
        assert_eq!(PieceType::Pawn.value(), 100);
        assert_eq!(PieceType::Knight.value(), 320);
        assert_eq!(PieceType::Bishop.value(), 330);
        assert_eq!(PieceType::Rook.value(), 500);
        assert_eq!(PieceType::Queen.value(), 900);
        assert_eq!(PieceType::King.value(), 0);
    }

    #[test]
    fn piece_char_round_trip() {
        for kind in PieceType::ALL {
            for color in Color::BOTH {
                let piece = Piece::new(kind, color);
                let c = piece.to_char();
                assert_eq!(c.is_ascii_uppercase(), color == Color::White);
                assert_eq!(Piece::from_char(c), Some(piece));
            }
        }
        assert_eq!(Piece::from_char('x'), None);
        assert_eq!(Piece::from_char('1'), None);
    }

    #[test]
    fn promotion_letters_any_case() {
        assert_eq!(PieceType::from_promotion_char('Q'), Some(PieceType::Queen));
        assert_eq!(PieceType::from_promotion_char('n'), Some(PieceType::Knight));
        assert_eq!(PieceType::from_promotion_char('K'), None);
        assert_eq!(PieceType::from_promotion_char('p'), None);
    }

    #[test]
    fn square_algebraic() {
        assert_eq!(sq("a1"), Square(0));
        assert_eq!(sq("h8"), Square(63));
        assert_eq!(sq("e4").file(), 4);
        assert_eq!(sq("e4").rank(), 3);
        for i in 0..64 {
            assert_eq!(Square::from_algebraic(&Square(i).to_algebraic()), Some(Square(i)));
        }
        assert_eq!(Square::from_algebraic("a9"), None);
        assert_eq!(Square::from_algebraic("i1"), None);
        assert_eq!(Square::from_algebraic("abc"), None);
        assert!("z0".parse::<Square>().is_err());
    }

    #[test]
    fn square_offset_stays_on_board() {
        assert_eq!(sq("e4").offset(1, 1), Some(sq("f5")));
        assert_eq!(sq("a1").offset(-1, 0), None);
        assert_eq!(sq("h8").offset(0, 1), None);
    }

    #[test]
    fn square_colors() {
        assert!(!sq("a1").is_light());
        assert!(sq("h1").is_light());
        assert!(sq("d1").is_light());
        assert!(!sq("c1").is_light());
    }

    #[test]
    fn bitboard_collect_and_iter() {
        let bb: Bitboard = [sq("a1"), sq("c3"), sq("h8")].into_iter().collect();
        assert_eq!(bb.pop_count(), 3);
        assert!(bb.is_set(sq("c3")));
        let squares: Vec<Square> = bb.iter().collect();
        assert_eq!(squares, vec![sq("a1"), sq("c3"), sq("h8")]);
        assert_eq!(Bitboard::EMPTY.iter().count(), 0);
    }

    #[test]
    fn move_display_uses_coordinate_notation() {
        let m = Move::new(sq("e2"), sq("e4"), PieceType::Pawn);
        assert_eq!(m.to_string(), "e2e4");
        let promo = Move::new(sq("e7"), sq("e8"), PieceType::Pawn).with_promotion(PieceType::Queen);
        assert_eq!(promo.coordinate(), "e7e8q");
        assert!(promo.is_promotion());
    }

    #[test]
    fn parse_coordinate_reads_long_algebraic() {
        let req = Move::parse_coordinate("e7e8q").unwrap();
        assert_eq!((req.from, req.to), (sq("e7"), sq("e8")));
        assert_eq!(req.promotion, Some(PieceType::Queen));
        assert_eq!(Move::parse_coordinate("g1f3").unwrap().promotion, None);
        assert!(Move::parse_coordinate("e7e8k").is_err());
        assert!(Move::parse_coordinate("e2").is_err());
    }

    #[test]
    fn move_request_parse() {
        let req = MoveRequest::parse("e7e8Q").unwrap();
        assert_eq!(req.from, sq("e7"));
        assert_eq!(req.to, sq("e8"));
        assert_eq!(req.promotion, Some(PieceType::Queen));
        assert_eq!(MoveRequest::parse("G1F3").unwrap().to, sq("f3"));
    }

    #[test]
    fn move_request_rejects_bad_format() {
        for bad in ["", "e2", "e2e", "e2e4e5", "i2e4", "e9e4", "e7e8k", "e7e8x"] {
            let err = MoveRequest::parse(bad).unwrap_err();
            assert!(err.is_format_error(), "{bad} should be a format error");
        }
    }

    #[test]
    fn move_request_matches_default_queen() {
        let mv = Move::new(sq("a7"), sq("a8"), PieceType::Pawn);
        let req = MoveRequest::parse("a7a8").unwrap();
        assert!(req.matches(&mv.with_promotion(PieceType::Queen)));
        assert!(!req.matches(&mv.with_promotion(PieceType::Knight)));
        assert!(MoveRequest::parse("a7a8n").unwrap().matches(&mv.with_promotion(PieceType::Knight)));
        assert!(!MoveRequest::parse("a7a8n").unwrap().matches(&mv));
    }

    #[test]
    fn castling_rights_fen_round_trip() {
        for s in ["-", "K", "Kq", "KQkq", "kq", "Q"] {
            assert_eq!(CastlingRights::from_fen(s).unwrap().to_fen(), s);
        }
        assert_eq!(CastlingRights::from_fen("X"), None);
        assert_eq!(CastlingRights::from_fen("KK"), None);
        assert_eq!(CastlingRights::from_fen(""), None);
    }

    #[test]
    fn castling_rights_flags() {
        let mut cr = CastlingRights::ALL;
        assert!(cr.can_castle(Color::Black, CastleSide::Queenside));
        cr.remove(CastlingRights::flag(Color::White, CastleSide::Kingside));
        assert!(!cr.can_castle(Color::White, CastleSide::Kingside));
        assert!(cr.can_castle(Color::White, CastleSide::Queenside));
    }

    #[test]
    fn game_status_strings() {
        assert_eq!(GameStatus::InProgress.as_str(), "in_progress");
        assert_eq!(GameStatus::Checkmate.as_str(), "checkmate");
        assert_eq!(
            GameStatus::Draw(DrawReason::FiftyMoveRule).as_str(),
            "fifty_move_rule"
        );
        assert!(GameStatus::Stalemate.is_game_over());
        assert!(!GameStatus::Check.is_game_over());
    }

    #[test]
    fn error_classification() {
        assert!(ChessError::InvalidFen("x".into()).is_format_error());
        assert!(
            !ChessError::IllegalMove {
                mv: "e2e5".into(),
                reason: "no".into()
            }
            .is_format_error()
        );
    }
}
