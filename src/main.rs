//! archsmith binary entry point
//!
//! `cli::run()` prints its own errors; this only turns them into a process exit code.

fn main() {
    if let Err(code) = archsmith::cli::run() {
        std::process::exit(code.as_i32());
    }
}
