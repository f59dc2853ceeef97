//! [Perft] (performance test) walks the tree of legal moves and counts the
//! leaves at a fixed depth. The counts for well-known positions are published,
//! which makes perft the main correctness check for move generation.
//! [`divide`] splits the count by root move to localize a mismatch.
//!
//! [Perft]: https://www.chessprogramming.org/Perft

use std::collections::HashMap;

use crate::chess::core::Move;
use crate::chess::movegen::legal_moves;
use crate::chess::position::Position;

/// Returns the number of leaf nodes `depth` plies below the position.
///
/// ```
/// use kestrel::chess::perft::perft;
/// use kestrel::chess::position::Position;
///
/// assert_eq!(perft(&Position::starting(), 3), 8902);
/// ```
#[must_use]
pub fn perft(position: &Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(position);
    // Bulk counting: the leaves are exactly the legal moves.
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .into_iter()
        .map(|next_move| {
            let mut next_position = *position;
            next_position.make(next_move);
            perft(&next_position, depth - 1)
        })
        .sum()
}

/// Maps each legal move of the position to the perft count of the position it
/// leads to at `depth - 1`. The values sum up to `perft(position, depth)` for
/// any `depth` > 0. At depth 0 there are no moves to split by and the result is
/// empty.
#[must_use]
pub fn divide(position: &Position, depth: u8) -> HashMap<Move, u64> {
    if depth == 0 {
        return HashMap::new();
    }
    legal_moves(position)
        .into_iter()
        .map(|next_move| {
            let mut next_position = *position;
            next_position.make(next_move);
            (next_move, perft(&next_position, depth - 1))
        })
        .collect()
}
