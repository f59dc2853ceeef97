//! Chess rules, legal move generation, perft and a small search engine
//! speaking a subset of UCI.
//!
//! The rules live in [`chess`]: positions are cheap [`Copy`] values and
//! [`chess::position::Position::make`] is applied to a copy whenever a move
//! needs to be tried out. [`chess::perft`] walks the move tree for testing
//! move generation and [`search`] finds the best move by exhaustive
//! [`search::minimax::negamax`] with iterative deepening.

pub mod chess;
pub mod evaluation;
pub mod search;

mod engine;
pub use engine::Engine;
use shadow_rs::shadow;

shadow!(build);

/// Build type and target. Produced by `build.rs`.
const FEATURES: &str = include_str!(concat!(env!("OUT_DIR"), "/features"));

/// Returns the full engine version that can be used to identify how it was
/// built in the first place.
fn engine_version() -> String {
    format!(
        "{} (commit {}, branch {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BRANCH
    )
}

/// Prints informations about the engine version, author and repository on
/// engine startup.
pub fn print_engine_info() {
    println!("Kestrel chess engine {}", engine_version());
    println!("<{}>", env!("CARGO_PKG_REPOSITORY"));
}

/// Prints information the build type, features and whether the build is clean
/// on engine startup.
pub fn print_binary_info() {
    println!("Release build: {}", !shadow_rs::is_debug());
    println!("Features: {FEATURES}");
    if !shadow_rs::git_clean() {
        println!("Warning: built with uncommitted changes");
    }
    println!();
}
