//! # SLS leader binary
//!
//! Thin wrapper around the `cli` module; all logic lives in the library so
//! it stays testable.

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    std::process::exit(sls_leader::cli::run());
}
