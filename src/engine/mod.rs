//! The engine puts all pieces together and manages resources effectively. It
//! implements the [Universal Chess Interface] (UCI) for communication with the
//! client (e.g. tournament runner with other engines or GUI/Lichess endpoint).
//!
//! [`Engine::uci_loop`] is the "main loop" of the engine which communicates
//! with the environment and executes commands from the input stream.
//!
//! [Universal Chess Interface]: https://www.chessprogramming.org/UCI

use std::io::{BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{at, never, select, unbounded, Receiver};

use crate::chess::core::Move;
use crate::chess::movegen::legal_moves;
use crate::chess::position::Position;
use crate::engine::uci::Command;
use crate::search::{self, Depth, SearchHandle, STARTING_DEPTH};

mod uci;

/// Time budget for `go` without any limits.
const DEFAULT_MOVETIME: Duration = Duration::from_secs(1);

/// Search that was started by `go` and has not reported `bestmove` yet.
struct ActiveSearch {
    handle: SearchHandle,
    best_move: Option<Move>,
    /// Number of best moves received so far.
    completed: u8,
    depth_limit: Option<Depth>,
    deadline: Option<Instant>,
}

impl ActiveSearch {
    const fn is_bounded(&self) -> bool {
        self.depth_limit.is_some() || self.deadline.is_some()
    }

    /// Depth of the next best move reported by the search.
    const fn next_depth(&self) -> Depth {
        STARTING_DEPTH.saturating_add(self.completed)
    }
}

/// The Engine connects everything together handles commands sent by UCI server,
/// including I/O.
pub struct Engine {
    position: Position,
    search: Option<ActiveSearch>,
    /// Stopped search that might still be finishing its current depth.
    retired: Option<SearchHandle>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates a new instance of the engine with starting position.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Position::starting(),
            search: None,
            retired: None,
        }
    }

    /// Continuously reads the input stream and executes sent UCI commands until
    /// "quit" is sent or the input is closed.
    ///
    /// Input lines are read on a separate thread so that the engine can report
    /// search progress and respond to deadlines while waiting for commands.
    /// When the input ends, a search limited by depth or time is allowed to
    /// finish and report its best move; an infinite search is stopped.
    ///
    /// The implementation here does not aim to be complete and exhaustive:
    /// unsupported commands and invalid positions are reported via
    /// `info string` and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    pub fn uci_loop(
        &mut self,
        input: impl BufRead + Send + 'static,
        output: &mut impl Write,
    ) -> anyhow::Result<()> {
        let lines = spawn_reader(input);
        let mut input_open = true;
        loop {
            if !input_open && self.search.is_none() {
                break;
            }
            let commands = if input_open { lines.clone() } else { never() };
            let (best_moves, deadline) = self.search.as_ref().map_or_else(
                || (never(), never()),
                |active| {
                    (
                        active.handle.moves().clone(),
                        active.deadline.map_or_else(never, at),
                    )
                },
            );
            select! {
                recv(commands) -> line => match line {
                    Ok(line) => {
                        if !self.execute(&line, output)? {
                            break;
                        }
                    },
                    Err(_) => {
                        log::debug!("input closed");
                        input_open = false;
                        if self.search.as_ref().is_some_and(|active| !active.is_bounded()) {
                            self.stop_search(output)?;
                        }
                    },
                },
                recv(best_moves) -> best_move => match best_move {
                    Ok(best_move) => self.report(best_move, output)?,
                    // The search has exited on its own.
                    Err(_) => self.stop_search(output)?,
                },
                recv(deadline) -> _ => {
                    log::debug!("search deadline reached");
                    self.stop_search(output)?;
                },
            }
            output.flush()?;
        }
        output.flush()?;
        Ok(())
    }

    /// Executes a single command. Returns `false` if the engine should quit.
    fn execute(&mut self, line: &str, output: &mut impl Write) -> anyhow::Result<bool> {
        match Command::parse(line) {
            Command::Uci => Self::handle_uci(output)?,
            Command::IsReady => writeln!(output, "readyok")?,
            Command::NewGame => {
                self.stop_search(output)?;
                self.position = Position::starting();
            },
            Command::SetPosition { fen, moves } => {
                self.handle_position(fen.as_deref(), &moves, output)?;
            },
            Command::Go {
                depth,
                movetime,
                infinite,
            } => self.handle_go(depth, movetime, infinite, output)?,
            Command::Stop => self.stop_search(output)?,
            Command::Quit => {
                self.stop_search(output)?;
                return Ok(false);
            },
            Command::Unknown(command) => {
                log::warn!("unsupported command: {command}");
                writeln!(output, "info string Unsupported command: {command}")?;
            },
        }
        Ok(true)
    }

    /// Responds to the `uci` handshake command by identifying the engine.
    fn handle_uci(output: &mut impl Write) -> anyhow::Result<()> {
        writeln!(output, "id name Kestrel {}", crate::engine_version())?;
        writeln!(output, "id author {}", env!("CARGO_PKG_AUTHORS"))?;
        writeln!(output, "uciok")?;
        Ok(())
    }

    /// Changes the position of the board to the one specified in the command.
    /// The position is left unchanged if the FEN or any of the moves is
    /// invalid.
    fn handle_position(
        &mut self,
        fen: Option<&str>,
        moves: &[String],
        output: &mut impl Write,
    ) -> anyhow::Result<()> {
        let mut position = match fen {
            None => Position::starting(),
            Some(fen) => match Position::from_fen(fen) {
                Ok(position) => position,
                Err(e) => {
                    log::warn!("invalid position {fen:?}: {e:#}");
                    writeln!(output, "info string Invalid position: {e:#}")?;
                    return Ok(());
                },
            },
        };
        for next_move in moves {
            let next_move = match Move::from_uci(next_move) {
                Ok(next_move) => next_move,
                Err(e) => {
                    log::warn!("unexpected move {next_move:?}: {e:#}");
                    writeln!(output, "info string Unexpected UCI move: {e:#}")?;
                    return Ok(());
                },
            };
            if !legal_moves(&position).contains(&next_move) {
                log::warn!("illegal move {next_move} in {position}");
                writeln!(output, "info string Illegal move: {next_move}")?;
                return Ok(());
            }
            position.make(next_move);
        }
        self.position = position;
        Ok(())
    }

    /// Starts searching the current position in the background.
    ///
    /// Until the first depth is completed, the best move is the first legal
    /// move. The previously stopped search is joined first so that at most one
    /// search thread is running.
    fn handle_go(
        &mut self,
        depth: Option<Depth>,
        movetime: Option<u64>,
        infinite: bool,
        output: &mut impl Write,
    ) -> anyhow::Result<()> {
        self.stop_search(output)?;
        if let Some(retired) = self.retired.take() {
            log::debug!("waiting for the previous search to exit");
            let _ = retired.wait();
        }
        let movetime = match (depth, movetime, infinite) {
            (_, Some(movetime), _) => Some(Duration::from_millis(movetime)),
            (None, None, false) => Some(DEFAULT_MOVETIME),
            _ => None,
        };
        log::debug!("starting search: depth {depth:?}, movetime {movetime:?}");
        self.search = Some(ActiveSearch {
            handle: search::spawn(self.position),
            best_move: legal_moves(&self.position).first().copied(),
            completed: 0,
            depth_limit: depth,
            deadline: movetime.map(|movetime| Instant::now() + movetime),
        });
        Ok(())
    }

    /// Reports the best move of a completed depth and stops the search once
    /// the requested depth is reached.
    fn report(&mut self, best_move: Move, output: &mut impl Write) -> anyhow::Result<()> {
        let Some(active) = self.search.as_mut() else {
            return Ok(());
        };
        let depth = active.next_depth();
        active.completed = active.completed.saturating_add(1);
        active.best_move = Some(best_move);
        writeln!(output, "info depth {depth} pv {best_move}")?;
        if active.depth_limit.is_some_and(|limit| depth >= limit) {
            self.stop_search(output)?;
        }
        Ok(())
    }

    /// Stops the search (if any) and reports the best move found so far:
    /// `0000` is only reported for positions without legal moves.
    fn stop_search(&mut self, output: &mut impl Write) -> anyhow::Result<()> {
        let Some(active) = self.search.take() else {
            return Ok(());
        };
        active.handle.stop();
        match active.best_move {
            Some(best_move) => writeln!(output, "bestmove {best_move}")?,
            None => writeln!(output, "bestmove 0000")?,
        }
        // The search thread exits on its own once the current depth is done.
        self.retired = Some(active.handle);
        Ok(())
    }
}

/// Forwards input lines to a channel from a dedicated thread. The channel is
/// disconnected once the input ends.
fn spawn_reader(input: impl BufRead + Send + 'static) -> Receiver<String> {
    let (sender, receiver) = unbounded();
    drop(thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if sender.send(line).is_err() {
                        break;
                    }
                },
                Err(e) => {
                    log::error!("failed to read input: {e}");
                    break;
                },
            }
        }
    }));
    receiver
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    fn run(input: &str) -> String {
        let mut output = Vec::new();
        Engine::new()
            .uci_loop(Cursor::new(input.to_owned()), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn handshake() {
        let output = run("uci\nisready\n");
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with("id name Kestrel "));
        assert_eq!(lines[1], "id author Kestrel Developers");
        assert_eq!(&lines[2..], &["uciok", "readyok"]);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            run("xyzzy\n"),
            "info string Unsupported command: xyzzy\n"
        );
    }

    #[test]
    fn depth_limited_search() {
        assert_eq!(
            run("position fen 7k/8/8/3q4/8/8/8/K2R4 w - - 0 1\ngo depth 3\n"),
            "info depth 3 pv d1d5\nbestmove d1d5\n"
        );
    }

    #[test]
    fn shallow_depth_reports_first_move() {
        assert_eq!(
            run("position fen 7k/8/8/3q4/8/8/8/K2R4 w - - 0 1\ngo depth 1\n"),
            "info depth 3 pv d1d5\nbestmove d1d5\n"
        );
    }

    #[test]
    fn no_legal_moves() {
        assert_eq!(
            run("position fen 7k/6Q1/6K1/8/8/8/8/8 b - - 0 1\ngo depth 5\n"),
            "bestmove 0000\n"
        );
    }

    #[test]
    fn deadline_before_first_depth() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let output = run(&format!("position fen {fen}\ngo movetime 1\n"));
        let best_move = output
            .lines()
            .last()
            .unwrap()
            .strip_prefix("bestmove ")
            .unwrap();
        let position = Position::from_fen(fen).unwrap();
        assert!(
            legal_moves(&position)
                .iter()
                .any(|next_move| next_move.to_string() == best_move),
            "{best_move} should be legal"
        );
    }

    #[test]
    fn stopped_search_is_joined() {
        let mut engine = Engine::new();
        let mut output = Vec::new();
        assert!(engine.execute("go infinite", &mut output).unwrap());
        assert!(engine.execute("stop", &mut output).unwrap());
        assert!(engine.retired.is_some());
        assert!(engine.execute("go infinite", &mut output).unwrap());
        assert!(engine.retired.is_none());
        assert!(engine.execute("stop", &mut output).unwrap());
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(output.lines().all(|line| line != "bestmove 0000"));
    }

    #[test]
    fn moves_are_replayed() {
        let mut engine = Engine::new();
        let mut output = Vec::new();
        assert!(engine
            .execute("position startpos moves e2e4 e7e5 g1f3", &mut output)
            .unwrap());
        assert_eq!(
            engine.position.to_string(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
        assert!(output.is_empty());
    }

    #[test]
    fn illegal_moves_are_rejected() {
        let mut engine = Engine::new();
        let mut output = Vec::new();
        assert!(engine
            .execute("position startpos moves e2e4 e2e4", &mut output)
            .unwrap());
        assert_eq!(engine.position, Position::starting());
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "info string Illegal move: e2e4\n"
        );
    }

    #[test]
    fn stop_without_search() {
        let mut engine = Engine::new();
        let mut output = Vec::new();
        assert!(engine.execute("stop", &mut output).unwrap());
        assert!(!engine.execute("quit", &mut output).unwrap());
        assert!(output.is_empty());
    }

    #[test]
    fn quit_stops_search() {
        let output = run("go infinite\nquit\n");
        assert!(output.lines().last().unwrap().starts_with("bestmove "));
    }
}
