//! UCI entry point of the Kestrel engine.

use std::io::{stdin, stdout, BufReader};

use kestrel::Engine;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    kestrel::print_engine_info();
    kestrel::print_binary_info();
    Engine::new().uci_loop(BufReader::new(stdin()), &mut stdout())
}
