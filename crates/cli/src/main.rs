//! Command-line entry point for `aix`.
//!
//! All work happens in the library; see [`aix::run`].

fn main() -> std::process::ExitCode {
    aix::run()
}
