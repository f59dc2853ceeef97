//! Mappings of occupied squares to the attacked squares for each piece. The
//! tables are computed once, on first use, and are read-only afterwards.
//!
//! Sliding pieces (bishops, rooks and queens) only get the *unblocked* rays:
//! occupancy is taken into account at generation time by walking a ray one
//! square at a time ([`walk`]) and stopping at the first occupied square.

use std::sync::OnceLock;

use itertools::Either;
use strum::IntoEnumIterator;

use crate::chess::bitboard::Bitboard;
use crate::chess::core::{Direction, PieceKind, Player, Rank, Square, BOARD_SIZE};

type Table = [Bitboard; BOARD_SIZE as usize];

const KNIGHT_LEAPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

struct AttackTables {
    pawn_pushes: [Table; 2],
    pawn_attacks: [Table; 2],
    knight: Table,
    king: Table,
    rays: [Table; Direction::COUNT],
    bishop: Table,
    rook: Table,
    queen: Table,
}

static TABLES: OnceLock<AttackTables> = OnceLock::new();

fn tables() -> &'static AttackTables {
    TABLES.get_or_init(AttackTables::new)
}

impl AttackTables {
    fn new() -> Self {
        let mut tables = Self {
            pawn_pushes: [[Bitboard::empty(); BOARD_SIZE as usize]; 2],
            pawn_attacks: [[Bitboard::empty(); BOARD_SIZE as usize]; 2],
            knight: [Bitboard::empty(); BOARD_SIZE as usize],
            king: [Bitboard::empty(); BOARD_SIZE as usize],
            rays: [[Bitboard::empty(); BOARD_SIZE as usize]; Direction::COUNT],
            bishop: [Bitboard::empty(); BOARD_SIZE as usize],
            rook: [Bitboard::empty(); BOARD_SIZE as usize],
            queen: [Bitboard::empty(); BOARD_SIZE as usize],
        };
        for square in Square::iter() {
            let index = square as usize;
            let leaps = |offsets: &mut dyn Iterator<Item = (i8, i8)>| {
                offsets.fold(Bitboard::empty(), |mut targets, (files, ranks)| {
                    if let Some(target) = square.offset(files, ranks) {
                        targets.set(target);
                    }
                    targets
                })
            };

            tables.knight[index] = leaps(&mut KNIGHT_LEAPS.into_iter());
            tables.king[index] = leaps(&mut Direction::iter().map(Direction::delta));

            for direction in Direction::iter() {
                let (files, ranks) = direction.delta();
                let mut ray = Bitboard::empty();
                let mut current = square;
                while let Some(next) = current.offset(files, ranks) {
                    ray.set(next);
                    current = next;
                }
                tables.rays[direction as usize][index] = ray;
            }
            tables.bishop[index] = Direction::DIAGONAL
                .into_iter()
                .fold(Bitboard::empty(), |all, d| all | tables.rays[d as usize][index]);
            tables.rook[index] = Direction::ORTHOGONAL
                .into_iter()
                .fold(Bitboard::empty(), |all, d| all | tables.rays[d as usize][index]);
            tables.queen[index] = tables.bishop[index] | tables.rook[index];

            let white = Player::White as usize;
            let mut pushes = Bitboard::empty();
            if let Some(single) = square.offset(0, 1) {
                pushes.set(single);
                if square.rank() == Rank::pawns_starting(Player::White) {
                    if let Some(double) = square.offset(0, 2) {
                        pushes.set(double);
                    }
                }
            }
            tables.pawn_pushes[white][index] = pushes;
            tables.pawn_attacks[white][index] = leaps(&mut [(-1, 1), (1, 1)].into_iter());
        }

        // Black's tables are White's mirrored across the horizontal axis: the
        // square is flipped on the way in and the targets on the way out.
        let (white, black) = (Player::White as usize, Player::Black as usize);
        for square in Square::iter() {
            let mirrored = square.flip_vertical() as usize;
            tables.pawn_pushes[black][square as usize] =
                tables.pawn_pushes[white][mirrored].flip_vertical();
            tables.pawn_attacks[black][square as usize] =
                tables.pawn_attacks[white][mirrored].flip_vertical();
        }
        tables
    }
}

/// Squares a pawn of the given player may be pushed to from `square` on an
/// empty board: one square forward, two from the starting rank.
#[must_use]
pub fn pawn_pushes(player: Player, square: Square) -> Bitboard {
    tables().pawn_pushes[player as usize][square as usize]
}

/// Squares a pawn of the given player attacks (diagonally forward).
#[must_use]
pub fn pawn_attacks(player: Player, square: Square) -> Bitboard {
    tables().pawn_attacks[player as usize][square as usize]
}

#[must_use]
#[allow(missing_docs)]
pub fn knight_attacks(square: Square) -> Bitboard {
    tables().knight[square as usize]
}

#[must_use]
#[allow(missing_docs)]
pub fn king_attacks(square: Square) -> Bitboard {
    tables().king[square as usize]
}

/// All squares from `square` (exclusive) to the edge of the board in the given
/// direction.
#[must_use]
pub fn ray(direction: Direction, square: Square) -> Bitboard {
    tables().rays[direction as usize][square as usize]
}

/// Union of the unblocked rays of a sliding piece. Returns an empty set for
/// pieces that do not slide.
#[must_use]
pub fn sliding_rays(kind: PieceKind, square: Square) -> Bitboard {
    let tables = tables();
    match kind {
        PieceKind::Bishop => tables.bishop[square as usize],
        PieceKind::Rook => tables.rook[square as usize],
        PieceKind::Queen => tables.queen[square as usize],
        _ => Bitboard::empty(),
    }
}

/// Squares of the ray ordered from the one adjacent to `square` to the edge of
/// the board.
pub fn walk(direction: Direction, square: Square) -> impl Iterator<Item = Square> {
    let squares = ray(direction, square).iter();
    if direction.is_ascending() {
        Either::Left(squares)
    } else {
        Either::Right(squares.rev())
    }
}
