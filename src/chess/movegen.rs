//! [Move generation]: pseudo-legal moves per piece kind, castling, attacked
//! squares and the legality filter.
//!
//! Legality is checked by making each pseudo-legal move on a copy of the
//! position and rejecting it if the mover's king ends up attacked. This covers
//! pins, discovered checks and king moves into check without dedicated
//! detection logic.
//!
//! [Move generation]: https://www.chessprogramming.org/Move_Generation

use itertools::Either;
use strum::IntoEnumIterator;

use crate::chess::attacks;
use crate::chess::bitboard::{Bitboard, Board};
use crate::chess::core::{
    CastleRights,
    Direction,
    Move,
    Piece,
    PieceKind,
    Player,
    Promotion,
    Rank,
    Square,
};
use crate::chess::position::Position;

/// Once the halfmove clock reaches this value the game is over (seventy-five
/// move rule) and no moves are generated.
pub const HALFMOVE_CUTOFF: u16 = 75;

/// Calculates a list of legal moves (i.e. the moves that do not leave our
/// king in check). The list is unordered and recomputed on every call.
///
/// Returns no moves when [`Position::halfmove_clock`] reaches
/// [`HALFMOVE_CUTOFF`].
///
/// ```
/// use kestrel::chess::movegen::legal_moves;
/// use kestrel::chess::position::Position;
///
/// assert_eq!(legal_moves(&Position::starting()).len(), 20);
/// ```
#[must_use]
pub fn legal_moves(position: &Position) -> Vec<Move> {
    if position.halfmove_clock() >= HALFMOVE_CUTOFF {
        return vec![];
    }
    let us = position.side_to_move();
    let mut moves = pseudo_legal_moves(position);
    generate_castles(position, &mut moves);
    moves.retain(|next_move| {
        let mut next_position = *position;
        next_position.make(*next_move);
        next_position.board().king(us).map_or(true, |king| {
            !attacked_squares(&next_position, us.opponent()).contains(king)
        })
    });
    moves
}

/// Squares attacked by the player's pieces, regardless of what stands on them
/// and of whether the player's own king is safe. Pawn attacks are the
/// diagonals; sliding pieces attack up to and including the first occupied
/// square in each direction.
#[must_use]
pub fn attacked_squares(position: &Position, player: Player) -> Bitboard {
    let board = position.board();
    let occupied = board.occupied();
    board
        .pieces_of(player)
        .fold(Bitboard::empty(), |mut attacked, (piece, square)| {
            attacked.union_with(attacks_from(piece, square, occupied));
            attacked
        })
}

fn attacks_from(piece: Piece, square: Square, occupied: Bitboard) -> Bitboard {
    match piece.kind {
        PieceKind::Pawn => attacks::pawn_attacks(piece.owner, square),
        PieceKind::Knight => attacks::knight_attacks(square),
        PieceKind::King => attacks::king_attacks(square),
        PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
            sliding_attacks(piece.kind, square, occupied)
        },
    }
}

fn sliding_attacks(kind: PieceKind, from: Square, occupied: Bitboard) -> Bitboard {
    let rays = attacks::sliding_rays(kind, from);
    if !rays.intersects(occupied) {
        return rays;
    }
    let directions: &[Direction] = match kind {
        PieceKind::Bishop => &Direction::DIAGONAL,
        PieceKind::Rook => &Direction::ORTHOGONAL,
        _ => &Direction::ALL,
    };
    let mut targets = Bitboard::empty();
    for direction in directions {
        for square in attacks::walk(*direction, from) {
            targets.set(square);
            if occupied.contains(square) {
                break;
            }
        }
    }
    targets
}

/// Moves that obey the movement rules of each piece but may leave the king in
/// check. Castling is generated separately.
fn pseudo_legal_moves(position: &Position) -> Vec<Move> {
    // Most positions have fewer than 64 pseudo-legal moves.
    let mut moves = Vec::with_capacity(64);
    let board = position.board();
    let us = position.side_to_move();
    let ours = board.occupancy(us);
    let theirs = board.occupancy(us.opponent());
    let occupied = ours | theirs;
    for (piece, from) in board.pieces_of(us) {
        if piece.kind == PieceKind::Pawn {
            generate_pawn_moves(position, from, theirs, &mut moves);
            continue;
        }
        for to in attacks_from(piece, from, occupied) - ours {
            moves.push(Move::new(from, to, None));
        }
    }
    moves
}

fn generate_pawn_moves(position: &Position, from: Square, theirs: Bitboard, moves: &mut Vec<Move>) {
    let us = position.side_to_move();
    let board = position.board();
    let pushes = attacks::pawn_pushes(us, from);
    // Closest square first: the double push is only possible if the single
    // push square is empty.
    let pushes = match us {
        Player::White => Either::Left(pushes.iter()),
        Player::Black => Either::Right(pushes.iter().rev()),
    };
    for to in pushes.take_while(|to| board.is_empty(*to)) {
        add_pawn_move(us, from, to, moves);
    }
    let en_passant = position
        .en_passant_square()
        .map_or(Bitboard::empty(), Bitboard::from);
    for to in attacks::pawn_attacks(us, from) & (theirs | en_passant) {
        add_pawn_move(us, from, to, moves);
    }
}

fn add_pawn_move(us: Player, from: Square, to: Square, moves: &mut Vec<Move>) {
    if to.rank() == Rank::backrank(us.opponent()) {
        moves.extend(Promotion::iter().map(|promotion| Move::new(from, to, Some(promotion))));
    } else {
        moves.push(Move::new(from, to, None));
    }
}

struct Castle {
    player: Player,
    right: CastleRights,
    king: (Square, Square),
    rook: Square,
    /// Squares between the king and the rook.
    empty: &'static [Square],
    /// Squares the king stands on, passes through and lands on.
    safe: [Square; 3],
}

const CASTLES: [Castle; 4] = [
    Castle {
        player: Player::White,
        right: CastleRights::WHITE_SHORT,
        king: (Square::E1, Square::G1),
        rook: Square::H1,
        empty: &[Square::F1, Square::G1],
        safe: [Square::E1, Square::F1, Square::G1],
    },
    Castle {
        player: Player::White,
        right: CastleRights::WHITE_LONG,
        king: (Square::E1, Square::C1),
        rook: Square::A1,
        empty: &[Square::B1, Square::C1, Square::D1],
        safe: [Square::E1, Square::D1, Square::C1],
    },
    Castle {
        player: Player::Black,
        right: CastleRights::BLACK_SHORT,
        king: (Square::E8, Square::G8),
        rook: Square::H8,
        empty: &[Square::F8, Square::G8],
        safe: [Square::E8, Square::F8, Square::G8],
    },
    Castle {
        player: Player::Black,
        right: CastleRights::BLACK_LONG,
        king: (Square::E8, Square::C8),
        rook: Square::A8,
        empty: &[Square::B8, Square::C8, Square::D8],
        safe: [Square::E8, Square::D8, Square::C8],
    },
];

fn generate_castles(position: &Position, moves: &mut Vec<Move>) {
    let us = position.side_to_move();
    let board: &Board = position.board();
    let mut attacked = None;
    for castle in CASTLES
        .iter()
        .filter(|castle| castle.player == us && position.castling().contains(castle.right))
    {
        let (king_from, king_to) = castle.king;
        if board.get(king_from) != Some(Piece::new(us, PieceKind::King))
            || board.get(castle.rook) != Some(Piece::new(us, PieceKind::Rook))
        {
            continue;
        }
        if castle.empty.iter().any(|square| !board.is_empty(*square)) {
            continue;
        }
        let attacked =
            *attacked.get_or_insert_with(|| attacked_squares(position, us.opponent()));
        if castle.safe.iter().any(|square| attacked.contains(*square)) {
            continue;
        }
        moves.push(Move::new(king_from, king_to, None));
    }
}
