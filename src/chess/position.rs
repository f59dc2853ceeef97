//! Provides fully-specified [Chess Position] implementation: stores information
//! about the board and tracks the state of castling, 75-move rule draw, etc.
//!
//! [`Position::make`] is the only way to mutate a position. It does not
//! validate the move: legality is the responsibility of
//! [`crate::chess::movegen::legal_moves`].
//!
//! [Chess Position]: https://www.chessprogramming.org/Chess_Position

use std::fmt;
use std::num::NonZeroU16;
use std::str::FromStr;

use anyhow::{bail, Context};

use crate::chess::bitboard::Board;
use crate::chess::core::{
    CastleRights,
    Move,
    Piece,
    PieceKind,
    Player,
    Rank,
    Square,
    BOARD_WIDTH,
};
use crate::chess::movegen;

/// The position every standard game starts from.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A single EPD [operation][Operations], e.g. `bm Nf3` or `id "BK.01"`.
/// Operands are kept exactly as written, including the quotes.
///
/// [Operations]: https://www.chessprogramming.org/Extended_Position_Description#Operations
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    #[allow(missing_docs)]
    pub opcode: String,
    #[allow(missing_docs)]
    pub operands: String,
}

impl Operation {
    fn parse(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        let (opcode, operands) = input.split_once(' ').unwrap_or((input, ""));
        if opcode.is_empty() {
            bail!("incorrect EPD: empty operation");
        }
        Ok(Self {
            opcode: opcode.to_string(),
            operands: operands.trim().to_string(),
        })
    }
}

/// Splits `;`-terminated operations. Semicolons within quoted operands do not
/// end the operation.
fn parse_operations(input: &str) -> anyhow::Result<Vec<Operation>> {
    let mut operations = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (index, symbol) in input.char_indices() {
        match symbol {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                operations.push(Operation::parse(&input[start..index])?);
                start = index + 1;
            },
            _ => {},
        }
    }
    let trailing = input[start..].trim();
    if !trailing.is_empty() {
        bail!("incorrect EPD: operation {trailing:?} is not terminated by ';'");
    }
    Ok(operations)
}

fn parse_counter<T>(value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if value.is_empty() || !value.bytes().all(|c| c.is_ascii_digit()) {
        bail!("counter can not contain anything other than digits: {value:?}");
    }
    Ok(value.parse::<T>()?)
}

/// State of the chess game: board, half-move counters and castling rights,
/// etc. It has 1:1 relationship with [Forsyth-Edwards Notation] (FEN).
///
/// Position is a plain value: search and move generation copy it for every
/// trial move instead of undoing moves.
///
/// [`Position::try_from()`] provides a convenient interface for creating a
/// [`Position`]. It will clean up the input (trim newlines and whitespace) and
/// attempt to parse in either FEN or [Extended Position Description] (EPD).
/// [`Position::from_epd`] also returns the EPD [Operations].
///
/// [Forsyth-Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
/// [Extended Position Description]: https://www.chessprogramming.org/Extended_Position_Description
/// [Operations]: https://www.chessprogramming.org/Extended_Position_Description#Operations
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
    castling: CastleRights,
    side_to_move: Player,
    /// [Halfmove Clock][^ply] keeps track of the number of (half-)moves
    /// since the last capture or pawn move and is used to enforce
    /// seventy-five[^seventy-five]-move draw rule.
    ///
    /// [Halfmove Clock]: https://www.chessprogramming.org/Halfmove_Clock
    /// [^ply]: "Half-move" or ["ply"](https://www.chessprogramming.org/Ply) means a move of only
    ///     one side.
    /// [^seventy-five]: 75 __half__ moves
    halfmove_clock: u16,
    fullmove_counter: NonZeroU16,
    en_passant_square: Option<Square>,
}

impl Position {
    /// Creates the starting position of the standard chess variant.
    ///
    /// ```
    /// use kestrel::chess::position::Position;
    ///
    /// let starting_position = Position::starting();
    /// assert_eq!(
    ///     &starting_position.to_string(),
    ///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    /// );
    /// ```
    #[must_use]
    pub fn starting() -> Self {
        Self {
            board: Board::starting(),
            castling: CastleRights::ALL,
            ..Self::empty()
        }
    }

    /// Creates an empty board to be filled by parser.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            board: Board::empty(),
            castling: CastleRights::empty(),
            side_to_move: Player::White,
            halfmove_clock: 0,
            fullmove_counter: NonZeroU16::MIN,
            en_passant_square: None,
        }
    }

    #[must_use]
    #[allow(missing_docs)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    #[allow(missing_docs)]
    pub const fn side_to_move(&self) -> Player {
        self.side_to_move
    }

    #[must_use]
    #[allow(missing_docs)]
    pub const fn castling(&self) -> CastleRights {
        self.castling
    }

    /// The square a pawn skipped over with a double push on the previous ply.
    #[must_use]
    pub const fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    #[must_use]
    #[allow(missing_docs)]
    pub const fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[must_use]
    #[allow(missing_docs)]
    pub const fn fullmove_counter(&self) -> NonZeroU16 {
        self.fullmove_counter
    }

    /// Returns true if the king of the side to move is attacked.
    #[must_use]
    pub fn is_check(&self) -> bool {
        self.board.king(self.side_to_move).is_some_and(|king| {
            movegen::attacked_squares(self, self.side_to_move.opponent()).contains(king)
        })
    }

    /// Applies the move to the position. The move is not validated: it must
    /// come from [`movegen::legal_moves`] (or be checked against it), otherwise
    /// the resulting position is unspecified.
    ///
    /// Castling is recognized as the king moving two files from its original
    /// square and relocates the corresponding rook.
    pub fn make(&mut self, next_move: Move) {
        let (from, to) = (next_move.from(), next_move.to());
        debug_assert!(
            self.board.get(from).is_some(),
            "no piece to move in {next_move} for {self}"
        );
        let Some(piece) = self.board.get(from) else {
            return;
        };
        let us = self.side_to_move;
        let is_pawn = piece.kind == PieceKind::Pawn;
        let previous_en_passant = self.en_passant_square;
        let is_en_passant = is_pawn && previous_en_passant == Some(to);
        let is_capture = !self.board.is_empty(to) || is_en_passant;

        if piece.kind == PieceKind::King {
            self.castling.remove(CastleRights::both(us));
        }
        self.castling
            .remove(CastleRights::for_corner(from) | CastleRights::for_corner(to));

        self.en_passant_square = None;
        if is_pawn && (from as u8).abs_diff(to as u8) == 2 * BOARD_WIDTH {
            let forward = if us == Player::White { 1 } else { -1 };
            self.en_passant_square = from.offset(0, forward);
        }

        if piece.kind == PieceKind::King {
            let rook_walk = match (from, to) {
                (Square::E1, Square::G1) => Some((Square::H1, Square::F1)),
                (Square::E1, Square::C1) => Some((Square::A1, Square::D1)),
                (Square::E8, Square::G8) => Some((Square::H8, Square::F8)),
                (Square::E8, Square::C8) => Some((Square::A8, Square::D8)),
                _ => None,
            };
            if let Some((rook_from, rook_to)) = rook_walk {
                self.board.move_to_empty(rook_from, rook_to);
            }
        }

        match next_move.promotion() {
            Some(promotion) => {
                self.board.clear(from);
                self.board.set(Piece::new(us, promotion.into()), to);
            },
            None => self.board.move_piece(piece, from, to),
        }

        if is_en_passant {
            self.board.clear(Square::new(to.file(), from.rank()));
        }

        if is_pawn || is_capture {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        if us == Player::Black {
            self.fullmove_counter = self.fullmove_counter.saturating_add(1);
        }

        self.side_to_move = us.opponent();
    }

    /// Parses board from Forsyth-Edwards Notation. It will also accept trimmed
    /// FEN (EPD with 4 parts).
    ///
    /// FEN ::=
    ///       Piece Placement
    ///   ' ' Side to move
    ///   ' ' Castling ability
    ///   ' ' En passant target square
    ///   ' ' Halfmove clock
    ///   ' ' Fullmove counter
    ///
    /// The last two parts (together) are optional and will default to "0 1".
    ///
    /// NOTE: This expects properly-formatted inputs: no extra symbols or
    /// additional whitespace. Use [`Position::try_from`] for cleaning up the
    /// input if it is coming from untrusted source and is likely to contain
    /// extra symbols.
    ///
    /// # Errors
    ///
    /// If any of the fields is malformed, missing or if there are trailing
    /// fields.
    pub fn from_fen(input: &str) -> anyhow::Result<Self> {
        let mut parts = input.split(' ');
        let mut result = Self::empty();
        let Some(pieces_placement) = parts.next() else {
            bail!("incorrect FEN: missing pieces placement");
        };
        let mut rank_id = BOARD_WIDTH;
        for rank_fen in pieces_placement.split('/') {
            if rank_id == 0 {
                bail!("incorrect FEN: expected 8 ranks, got {pieces_placement}");
            }
            rank_id -= 1;
            let rank = Rank::try_from(rank_id)?;
            let mut file: u8 = 0;
            for symbol in rank_fen.chars() {
                match symbol {
                    '0' => bail!("increment can not be 0"),
                    '1'..='8' => file += symbol as u8 - b'0',
                    _ => {
                        let piece = Piece::try_from(symbol)?;
                        let square = Square::new(
                            file.try_into().with_context(|| {
                                format!("incorrect FEN: rank {rank_fen} is too wide")
                            })?,
                            rank,
                        );
                        result.board.set_on_empty(piece, square);
                        file += 1;
                    },
                }
                if file > BOARD_WIDTH {
                    bail!("incorrect FEN: rank {rank_fen} exceeds {BOARD_WIDTH} files");
                }
            }
            if file != BOARD_WIDTH {
                bail!("incorrect FEN: rank size should be exactly {BOARD_WIDTH}, got {rank_fen} of length {file}");
            }
        }
        if rank_id != 0 {
            bail!("incorrect FEN: there should be 8 ranks, got {pieces_placement}");
        }
        result.side_to_move = match parts.next() {
            Some(value) => value.try_into()?,
            None => bail!("incorrect FEN: missing side to move"),
        };
        result.castling = match parts.next() {
            Some(value) => value.try_into()?,
            None => bail!("incorrect FEN: missing castling rights"),
        };
        result.en_passant_square = match parts.next() {
            Some("-") => None,
            Some(value) => Some(value.try_into()?),
            None => bail!("incorrect FEN: missing en passant square"),
        };
        result.halfmove_clock = match parts.next() {
            Some(value) => {
                if !value.bytes().all(|c| c.is_ascii_digit()) {
                    bail!("halfmove clock can not contain anything other than digits");
                }
                value.parse::<u16>().with_context(|| {
                    format!("incorrect FEN: halfmove clock can not be parsed {value}")
                })?
            },
            // This is a correct EPD: exit early.
            None => return Ok(result),
        };
        result.fullmove_counter = match parts.next() {
            Some(value) => {
                if !value.bytes().all(|c| c.is_ascii_digit()) {
                    bail!("fullmove counter can not contain anything other than digits");
                }
                value.parse::<NonZeroU16>().with_context(|| {
                    format!("incorrect FEN: fullmove counter can not be parsed {value}")
                })?
            },
            None => bail!("incorrect FEN: missing fullmove counter"),
        };
        match parts.next() {
            None => Ok(result),
            Some(_) => bail!("trailing symbols are not allowed in FEN"),
        }
    }
}

impl Position {
    /// Parses [Extended Position Description]: the first four FEN fields
    /// optionally followed by `;`-terminated operations. `hmvc` and `fmvn`
    /// operations set the halfmove clock and the fullmove counter, which
    /// otherwise default to "0 1". All operations are returned in the order
    /// they were written.
    ///
    /// [Extended Position Description]: https://www.chessprogramming.org/Extended_Position_Description
    ///
    /// # Errors
    ///
    /// If the position fields are malformed, an operation is not terminated
    /// or the `hmvc`/`fmvn` operands are not valid counters.
    pub fn from_epd(input: &str) -> anyhow::Result<(Self, Vec<Operation>)> {
        let mut fields = input.splitn(5, ' ');
        let position_fields: Vec<&str> = fields.by_ref().take(4).collect();
        if position_fields.len() != 4 {
            bail!("incorrect EPD: expected 4 position fields in {input:?}");
        }
        let mut position = Self::from_fen(&position_fields.join(" "))?;
        let operations = match fields.next() {
            Some(operations) => parse_operations(operations)?,
            None => Vec::new(),
        };
        for operation in &operations {
            match operation.opcode.as_str() {
                "hmvc" => {
                    position.halfmove_clock = parse_counter(&operation.operands)
                        .context("incorrect EPD: invalid halfmove clock")?;
                },
                "fmvn" => {
                    position.fullmove_counter = parse_counter(&operation.operands)
                        .context("incorrect EPD: invalid fullmove number")?;
                },
                _ => {},
            }
        }
        Ok((position, operations))
    }
}

impl TryFrom<&str> for Position {
    type Error = anyhow::Error;

    /// Trims the input and strips an optional `fen ` or `epd ` prefix. Input
    /// without a prefix is parsed as FEN unless the field after the en passant
    /// square is not a number, in which case it is parsed as EPD with
    /// operations.
    fn try_from(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        if let Some(fen) = input.strip_prefix("fen ") {
            return Self::from_fen(fen);
        }
        if let Some(epd) = input.strip_prefix("epd ") {
            return Ok(Self::from_epd(epd)?.0);
        }
        match input.split(' ').nth(4) {
            Some(field) if !field.bytes().all(|c| c.is_ascii_digit()) => {
                Ok(Self::from_epd(input)?.0)
            },
            _ => Self::from_fen(input),
        }
    }
}

impl fmt::Display for Position {
    /// Prints board in Forsyth-Edwards Notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", &self.board)?;
        write!(f, "{} ", &self.side_to_move)?;
        write!(f, "{} ", &self.castling)?;
        match self.en_passant_square {
            Some(square) => write!(f, "{square} "),
            None => write!(f, "- "),
        }?;
        write!(f, "{} ", &self.halfmove_clock)?;
        write!(f, "{}", &self.fullmove_counter)?;
        Ok(())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?}", &self.board)?;
        writeln!(f, "Player to move: {:?}", &self.side_to_move)?;
        writeln!(f, "Fullmove counter: {:?}", &self.fullmove_counter)?;
        writeln!(f, "En Passant: {:?}", &self.en_passant_square)?;
        // bitflags' default fmt::Debug implementation is not very convenient:
        // dump FEN instead.
        writeln!(f, "Castling rights: {}", &self.castling)?;
        writeln!(f, "FEN: {self}")?;
        Ok(())
    }
}
