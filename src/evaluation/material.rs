//! Provides a very basic implementation of evaluation based on material
//! advantage using "[standard piece valuations]".
//!
//! While not very useful in practice, this evaluation function is great for
//! testing search and other infrastructure, because it is stable (will not
//! change because of the fixed piece "values"), easy to understand and
//! deterministic.
//!
//! [standard piece valuations]: https://en.wikipedia.org/wiki/Chess_piece_relative_value

use crate::chess::bitboard::Board;
use crate::chess::core::{PieceKind, Player};
use crate::chess::position::Position;
use crate::evaluation::Score;

const fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight | PieceKind::Bishop => 300,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 0,
    }
}

fn material(board: &Board, player: Player) -> i32 {
    board
        .pieces_of(player)
        .map(|(piece, _)| piece_value(piece.kind))
        .sum()
}

/// Material of the side to move minus the material of its opponent.
#[must_use]
pub fn material_advantage(position: &Position) -> Score {
    let us = position.side_to_move();
    let board = position.board();
    Score::from(material(board, us) - material(board, us.opponent()))
}
