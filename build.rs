use std::env;
use std::fs;
use std::path::Path;

// Bakes config.toml into the binary so the miner starts without a config file on disk.
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let defaults = fs::read_to_string("config.toml").expect("config.toml is missing");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set by cargo");
    let dest_path = Path::new(&out_dir).join("miner_defaults.rs");

    fs::write(
        dest_path,
        format!("pub const DEFAULT_CONFIG: &str = {defaults:?};"),
    )
    .expect("Failed to write embedded miner defaults");
}
