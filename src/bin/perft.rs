//! Prints the number of leaf nodes reachable from a position, broken down by
//! the first move.

use clap::Parser;
use itertools::Itertools;
use kestrel::chess::perft::divide;
use kestrel::chess::position::{Position, STARTING_FEN};

/// Counts the leaf nodes of the move tree and breaks the count down by the
/// first move. Useful for tracking down move generation bugs against another
/// engine's output.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Config {
    /// Position to start from in Forsyth-Edwards Notation.
    #[arg(long, default_value = STARTING_FEN)]
    fen: String,
    /// Number of plies to look ahead.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..))]
    depth: u8,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = Config::parse();
    let position = Position::from_fen(&config.fen)?;
    log::debug!("running divide at depth {} on {position}", config.depth);
    let counts = divide(&position, config.depth);
    println!("{}", counts.values().sum::<u64>());
    for (next_move, count) in counts
        .iter()
        .map(|(next_move, count)| (next_move.to_string(), count))
        .sorted()
    {
        println!("{next_move}\t{count}");
    }
    Ok(())
}
