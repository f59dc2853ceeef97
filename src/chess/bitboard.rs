//! [`Bitboard`]-based representation for [`crate::chess::position::Position`].
//! Bitboard utilizes the fact that modern processors operate on 64 bit
//! integers, and the bit operations can be performed simultaneously. This
//! results in very efficient calculation of possible attack vectors and other
//! meaningful features that are calculated to evaluate a position on the board.
//! The disadvantage is inefficiency of some operations like "get piece type on
//! given square" (efficiently handled by Square-centric board
//! implementations). Here it is a scan over twelve words, which is cheap enough.
//!
//! [Bitboard]: https://www.chessprogramming.org/Bitboards

use std::fmt::Write;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub};
use std::{fmt, mem};

use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::chess::core::{
    File,
    Piece,
    PieceKind,
    Player,
    Rank,
    Square,
    BOARD_WIDTH,
};

/// Represents a set of squares and provides common operations (e.g. AND, OR,
/// complement) over these sets. Each bit corresponds to one of 64 squares of
/// the chess board.
///
/// Mirroring [`Square`] semantics, the least significant
/// bit corresponds to A1, and the most significant bit - to H8.
///
/// Bitboard is a thin wrapper around [u64].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Bitboard {
    bits: u64,
}

impl Bitboard {
    /// Constructs Bitboard from pre-calculated bits.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// Constructs a bitboard representing empty set of squares.
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_bits(0)
    }

    /// Constructs a bitboard representing the universal set, it contains all
    /// squares by setting all bits to binary one.
    #[must_use]
    pub const fn full() -> Self {
        Self::from_bits(u64::MAX)
    }

    /// Returns raw bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    #[must_use]
    #[allow(missing_docs)]
    pub fn from_squares(squares: &[Square]) -> Self {
        let mut result = Self::empty();
        for square in squares {
            result.set(*square);
        }
        result
    }

    /// Adds given square to the set.
    pub fn set(&mut self, square: Square) {
        self.bits |= 1u64 << square as u8;
    }

    /// Removes given square from the set.
    pub fn clear(&mut self, square: Square) {
        self.bits &= !(1u64 << square as u8);
    }

    /// Returns true if this bitboard contains given square.
    #[must_use]
    pub const fn contains(self, square: Square) -> bool {
        (self.bits & (1u64 << square as u8)) != 0
    }

    /// Population count: the number of squares in the set.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.bits.count_ones()
    }

    #[must_use]
    #[allow(missing_docs)]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Adds all squares of `other` to this set.
    pub fn union_with(&mut self, other: Self) {
        self.bits |= other.bits;
    }

    /// Returns true if the two sets have at least one square in common.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    /// Mirrors the set across the horizontal axis: rank 1 is swapped with
    /// rank 8, rank 2 with rank 7 and so on. Each rank is one byte, so this is
    /// a byte swap.
    #[must_use]
    pub const fn flip_vertical(self) -> Self {
        Self::from_bits(self.bits.swap_bytes())
    }

    /// An efficient way to iterate over the set squares.
    #[must_use]
    pub const fn iter(self) -> BitboardIterator {
        BitboardIterator { bits: self.bits }
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranks = Rank::iter().rev().map(|rank| {
            File::iter()
                .map(|file| {
                    if self.contains(Square::new(file, rank)) {
                        '1'
                    } else {
                        '.'
                    }
                })
                .join(SQUARE_SEPARATOR)
        });
        write!(f, "{}", ranks.format(LINE_SEPARATOR))
    }
}

impl BitOr for Bitboard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitor(rhs.bits))
    }
}

impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.union_with(rhs);
    }
}

impl BitAnd for Bitboard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitand(rhs.bits))
    }
}

impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.bits.bitand_assign(rhs.bits);
    }
}

impl Sub for Bitboard {
    type Output = Self;

    /// [Relative component], i.e. Result = LHS \ RHS.
    ///
    /// [Relative component]: https://en.wikipedia.org/wiki/Complement_%28set_theory%29#Relative_complement
    fn sub(self, rhs: Self) -> Self::Output {
        self & !rhs
    }
}

impl Not for Bitboard {
    type Output = Self;

    /// Returns [complement
    /// set](https://en.wikipedia.org/wiki/Complement_%28set_theory%29) of Self,
    /// i.e. flipping the set squares to unset and vice versa.
    fn not(self) -> Self::Output {
        Self::from_bits(!self.bits)
    }
}

impl From<Square> for Bitboard {
    fn from(square: Square) -> Self {
        Self::from_bits(1u64 << square as u8)
    }
}

impl IntoIterator for Bitboard {
    type IntoIter = BitboardIterator;
    type Item = Square;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterates over set squares in a given [Bitboard] from least significant 1
/// bits (LS1B) to most significant 1 bits (MS1B) through implementing
/// [`BitScan`] forward operation. Iterating from the back
/// ([`DoubleEndedIterator`]) scans in reverse.
///
/// [BitScan]: https://www.chessprogramming.org/BitScan
pub struct BitboardIterator {
    bits: u64,
}

impl Iterator for BitboardIterator {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        // Get the LS1B and consume it from the iterator.
        let next_index = self.bits.trailing_zeros();
        self.bits &= self.bits - 1;
        // For performance reasons, it's better to convert directly: the
        // conversion is safe because trailing_zeros() will return a number in
        // 0..64 range.
        Some(unsafe { mem::transmute(next_index as u8) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.bits.count_ones() as usize;
        (count, Some(count))
    }
}

impl DoubleEndedIterator for BitboardIterator {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        let next_index = 63 - self.bits.leading_zeros();
        self.bits ^= 1u64 << next_index;
        Some(unsafe { mem::transmute(next_index as u8) })
    }
}

impl ExactSizeIterator for BitboardIterator {}

/// Piece-centric implementation of the chess board: one [Bitboard] per
/// [Piece], indexed by [`Piece::index`]. The board is a plain value and is
/// copied for every trial move.
///
/// At most one of the twelve bitboards has any given square set. All mutating
/// operations except [`Board::set_on_empty`] and [`Board::move_to_empty`]
/// maintain this by clearing the destination on every bitboard first; the two
/// fast paths require the caller to know the destination is empty.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    pieces: [Bitboard; Piece::COUNT],
}

impl Board {
    /// Constructs an empty Board to be filled by the board and position
    /// builder.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            pieces: [Bitboard::empty(); Piece::COUNT],
        }
    }

    /// The standard initial piece placement.
    #[must_use]
    pub fn starting() -> Self {
        const ARRANGEMENT: [PieceKind; BOARD_WIDTH as usize] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut board = Self::empty();
        for player in [Player::White, Player::Black] {
            for (file, kind) in File::iter().zip(ARRANGEMENT) {
                board.set_on_empty(
                    Piece::new(player, kind),
                    Square::new(file, Rank::backrank(player)),
                );
                board.set_on_empty(
                    Piece::new(player, PieceKind::Pawn),
                    Square::new(file, Rank::pawns_starting(player)),
                );
            }
        }
        board
    }

    /// Squares occupied by the given piece.
    #[must_use]
    pub const fn bitboard(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.index()]
    }

    /// Returns the piece standing on the square, if any.
    #[must_use]
    pub fn get(&self, square: Square) -> Option<Piece> {
        self.pieces
            .iter()
            .position(|bitboard| bitboard.contains(square))
            .map(Piece::from_index)
    }

    /// Places the piece on the square, removing whatever stood there.
    pub fn set(&mut self, piece: Piece, square: Square) {
        self.clear(square);
        self.pieces[piece.index()].set(square);
    }

    /// Places the piece on a square the caller knows to be empty.
    pub fn set_on_empty(&mut self, piece: Piece, square: Square) {
        debug_assert!(self.is_empty(square), "{square} is occupied");
        self.pieces[piece.index()].set(square);
    }

    /// Removes any piece from the square.
    pub fn clear(&mut self, square: Square) {
        for bitboard in &mut self.pieces {
            bitboard.clear(square);
        }
    }

    #[must_use]
    #[allow(missing_docs)]
    pub fn is_empty(&self, square: Square) -> bool {
        !self.occupied().contains(square)
    }

    /// Moves the piece from `from` to `to`, capturing whatever stood on `to`.
    pub fn move_piece(&mut self, piece: Piece, from: Square, to: Square) {
        self.pieces[piece.index()].clear(from);
        self.set(piece, to);
    }

    /// Moves whatever stands on `from` to `to`, which the caller knows to be
    /// empty. Does nothing if `from` is empty.
    pub fn move_to_empty(&mut self, from: Square, to: Square) {
        debug_assert!(self.is_empty(to), "{to} is occupied");
        for bitboard in &mut self.pieces {
            if bitboard.contains(from) {
                bitboard.clear(from);
                bitboard.set(to);
                return;
            }
        }
    }

    /// All squares occupied by the player's pieces.
    #[must_use]
    pub fn occupancy(&self, player: Player) -> Bitboard {
        let start = player as usize * PieceKind::COUNT;
        self.pieces[start..start + PieceKind::COUNT]
            .iter()
            .fold(Bitboard::empty(), |all, bitboard| all | *bitboard)
    }

    /// All occupied squares.
    #[must_use]
    pub fn occupied(&self) -> Bitboard {
        self.pieces
            .iter()
            .fold(Bitboard::empty(), |all, bitboard| all | *bitboard)
    }

    /// Square of the player's king. Positions without a king (only reachable
    /// through hand-crafted boards) return [`None`].
    #[must_use]
    pub fn king(&self, player: Player) -> Option<Square> {
        self.bitboard(Piece::new(player, PieceKind::King))
            .iter()
            .next()
    }

    /// Iterates over the player's pieces and the squares they occupy.
    pub fn pieces_of(&self, player: Player) -> impl Iterator<Item = (Piece, Square)> + '_ {
        PieceKind::iter().flat_map(move |kind| {
            let piece = Piece::new(player, kind);
            self.bitboard(piece).iter().map(move |square| (piece, square))
        })
    }
}

impl fmt::Display for Board {
    /// Prints board representation in FEN format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            let mut empty_squares = 0i32;
            for file in File::iter() {
                let square = Square::new(file, rank);
                if let Some(piece) = self.get(square) {
                    if empty_squares != 0 {
                        write!(f, "{empty_squares}")?;
                        empty_squares = 0;
                    }
                    write!(f, "{piece}")?;
                } else {
                    empty_squares += 1;
                }
            }
            if empty_squares != 0 {
                write!(f, "{empty_squares}")?;
            }
            if rank != Rank::One {
                const RANK_SEPARATOR: char = '/';
                f.write_char(RANK_SEPARATOR)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    /// Dumps the board in a simple format ('.' for empty square, FEN algebraic
    /// symbol for piece) a-la Stockfish "debug" command in UCI mode.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                match self.get(Square::new(file, rank)) {
                    Some(piece) => write!(f, "{piece}"),
                    None => f.write_char('.'),
                }?;
                if file != File::H {
                    f.write_str(SQUARE_SEPARATOR)?;
                }
            }
            if rank != Rank::One {
                f.write_str(LINE_SEPARATOR)?;
            }
        }
        Ok(())
    }
}

const LINE_SEPARATOR: &str = "\n";
const SQUARE_SEPARATOR: &str = " ";
