//! Retrieves information about the version of the engine from Git and the build
//! environment. This information is then written to a file in the output
//! directory and can be accessed at runtime by the engine.

use std::path::Path;
use std::{env, fs};

fn generate_file(filename: &str, contents: &str) {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join(filename);
    fs::write(dest_path, contents).unwrap();
}

/// Records the target CPU features the bitboard operations can take advantage
/// of.
fn generate_build_info() {
    let enabled = env::var("CARGO_CFG_TARGET_FEATURE").unwrap_or_default();
    let enabled: Vec<&str> = enabled.split(',').collect();
    let features = ["popcnt", "bmi1", "bmi2"]
        .iter()
        .map(|feature| {
            let sign = if enabled.contains(feature) { '+' } else { '-' };
            format!("{sign}{feature}")
        })
        .collect::<Vec<_>>()
        .join(" ");
    generate_file("features", &features);
}

fn main() -> shadow_rs::SdResult<()> {
    generate_build_info();
    shadow_rs::new()
}
