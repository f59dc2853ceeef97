//! Implementation of [Minimax] algorithm in its [Negamax] form.
//!
//! The search is a plain fixed-depth tree walk: no pruning, no move ordering
//! and no transposition table. It serves as a reference for correctness.
//!
//! [Minimax]: https://en.wikipedia.org/wiki/Minimax
//! [Negamax]: https://en.wikipedia.org/wiki/Negamax

use crate::chess::movegen::legal_moves;
use crate::chess::position::Position;
use crate::evaluation::material::material_advantage;
use crate::evaluation::Score;
use crate::search::Depth;

/// Scores the position from the perspective of the side to move by looking
/// `depth` plies ahead. Leaves are evaluated by
/// [`material_advantage`]. A position without legal moves is scored as
/// [`Score::LOSE`] regardless of whether it is a checkmate or a stalemate.
#[must_use]
pub fn negamax(position: &Position, depth: Depth) -> Score {
    if depth == 0 {
        return material_advantage(position);
    }
    let mut best = Score::LOSE;
    for next_move in legal_moves(position) {
        let mut child = *position;
        child.make(next_move);
        best = best.max(-negamax(&child, depth - 1));
    }
    best
}
