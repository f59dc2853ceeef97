//! Implements [iterative deepening] search on top of [`minimax::negamax`].
//!
//! The search runs depth 3, 4, 5 and so on until it is cancelled. After each
//! completed depth, the best move is handed off to the consumer through a
//! rendezvous channel. Cancellation is checked before each depth and while
//! waiting for the consumer, but not inside a depth: a deep iteration runs to
//! completion before the search notices it was stopped.
//!
//! [iterative deepening]: https://www.chessprogramming.org/Iterative_Deepening

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};

use crate::chess::core::Move;
use crate::chess::movegen::legal_moves;
use crate::chess::position::Position;
use crate::evaluation::Score;

pub mod minimax;

/// Search depth in plies.
pub type Depth = u8;

/// The first depth iterative deepening reports a move for.
pub const STARTING_DEPTH: Depth = 3;

/// Ways a search terminates other than running out of depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The search was stopped by the caller.
    #[error("search was cancelled")]
    Cancelled,
    /// The root position is a checkmate or a stalemate (or the game is over by
    /// the seventy-five move rule).
    #[error("no legal moves")]
    NoLegalMoves,
}

/// Runs iterative deepening from the position and sends the best move of each
/// completed depth to `best_moves`. The channel is expected to be a
/// rendezvous channel: the search blocks until the consumer takes the move or
/// the search is stopped.
///
/// Any message on `stop` (or its sender being dropped) cancels the search. If
/// the consumer drops its receiver, the search ends successfully.
///
/// # Errors
///
/// [`SearchError::NoLegalMoves`] if there are no moves to choose from and
/// [`SearchError::Cancelled`] if the search was stopped.
pub fn search(
    position: &Position,
    best_moves: &Sender<Move>,
    stop: &Receiver<()>,
) -> Result<(), SearchError> {
    let moves = legal_moves(position);
    if moves.is_empty() {
        log::debug!("no legal moves in {position}");
        return Err(SearchError::NoLegalMoves);
    }
    for depth in STARTING_DEPTH..=Depth::MAX {
        match stop.try_recv() {
            Err(TryRecvError::Empty) => (),
            Ok(()) | Err(TryRecvError::Disconnected) => {
                log::debug!("search cancelled before depth {depth}");
                return Err(SearchError::Cancelled);
            },
        }
        let mut best_score = Score::MIN;
        let mut best_move = moves[0];
        for next_move in &moves {
            let mut child = *position;
            child.make(*next_move);
            let score = -minimax::negamax(&child, depth - 1);
            if score > best_score {
                best_score = score;
                best_move = *next_move;
            }
        }
        log::debug!("depth {depth}: best move {best_move} ({best_score})");
        select! {
            send(best_moves, best_move) -> sent => {
                if sent.is_err() {
                    log::debug!("best move consumer is gone, finishing search");
                    return Ok(());
                }
                log::trace!("handed off {best_move} at depth {depth}");
            },
            recv(stop) -> _ => {
                log::debug!("search cancelled while handing off depth {depth}");
                return Err(SearchError::Cancelled);
            },
        }
    }
    Ok(())
}

/// A search running on a background thread.
pub struct SearchHandle {
    moves: Receiver<Move>,
    stop: Sender<()>,
    worker: JoinHandle<Result<(), SearchError>>,
}

/// Starts [`search`] on a dedicated thread. The best moves are received
/// through [`SearchHandle::moves`].
#[must_use]
pub fn spawn(position: Position) -> SearchHandle {
    let (moves_sender, moves) = bounded(0);
    let (stop, stop_receiver) = bounded(1);
    let worker = thread::spawn(move || search(&position, &moves_sender, &stop_receiver));
    SearchHandle {
        moves,
        stop,
        worker,
    }
}

impl SearchHandle {
    /// Best move of each completed depth, shallowest first.
    #[must_use]
    pub const fn moves(&self) -> &Receiver<Move> {
        &self.moves
    }

    /// Signals the search to stop. Does not wait for the current depth to
    /// complete.
    pub fn stop(&self) {
        // The search might have already finished and dropped the receiver.
        let _ = self.stop.try_send(());
    }

    /// Returns true once the search thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Blocks until the search thread exits and returns its outcome. The
    /// search only exits on its own when the position has no legal moves, so
    /// this is normally preceded by [`SearchHandle::stop`].
    ///
    /// # Errors
    ///
    /// Propagates the outcome of [`search`].
    pub fn wait(self) -> Result<(), SearchError> {
        match self.worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chess::core::Square;

    #[test]
    fn no_legal_moves() {
        let (best_moves, _moves) = bounded(0);
        let (_stop, stop) = bounded::<()>(1);
        let mated = Position::from_fen("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(
            search(&mated, &best_moves, &stop),
            Err(SearchError::NoLegalMoves)
        );
        let exhausted = Position::from_fen("7k/8/8/8/8/8/8/K2R4 w - - 75 100").unwrap();
        assert_eq!(
            search(&exhausted, &best_moves, &stop),
            Err(SearchError::NoLegalMoves)
        );
    }

    #[test]
    fn cancelled_before_first_depth() {
        let (best_moves, _moves) = bounded(0);
        let (stop_sender, stop) = bounded(1);
        stop_sender.send(()).unwrap();
        assert_eq!(
            search(&Position::starting(), &best_moves, &stop),
            Err(SearchError::Cancelled)
        );
    }

    #[test]
    fn dropped_consumer() {
        let (best_moves, moves) = bounded(0);
        drop(moves);
        let (_stop, stop) = bounded::<()>(1);
        let position = Position::from_fen("7k/8/8/3q4/8/8/8/K2R4 w - - 0 1").unwrap();
        assert_eq!(search(&position, &best_moves, &stop), Ok(()));
    }

    #[test]
    fn cancelled_during_handoff() {
        let (best_moves, moves) = bounded(0);
        let (stop_sender, stop) = bounded(1);
        let position = Position::from_fen("7k/8/8/3q4/8/8/8/K2R4 w - - 0 1").unwrap();
        let worker = thread::spawn(move || search(&position, &best_moves, &stop));
        // Depth 3 takes well under a millisecond here: the search is parked in
        // the handoff by the time it is stopped.
        thread::sleep(std::time::Duration::from_millis(200));
        assert!(!worker.is_finished());
        stop_sender.send(()).unwrap();
        assert_eq!(worker.join().unwrap(), Err(SearchError::Cancelled));
        // Nothing was handed off.
        assert!(moves.try_recv().is_err());
    }

    #[test]
    fn background_search() {
        let position = Position::from_fen("7k/8/8/3q4/8/8/8/K2R4 w - - 0 1").unwrap();
        let handle = spawn(position);
        assert_eq!(
            handle.moves().recv(),
            Ok(Move::new(Square::D1, Square::D5, None))
        );
        handle.stop();
        assert_eq!(handle.wait(), Err(SearchError::Cancelled));
    }
}
