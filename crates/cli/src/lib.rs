//! The `aix` command surface.
//!
//! Parsing lives in [`cli`]; [`execute`] dispatches one parsed command against
//! a set of [`Paths`](aix_state::Paths) and writes results to a writer, which
//! keeps every command testable without touching the real home directory.
//! [`run`] wires in logging, the environment, and exit codes.

#![deny(unsafe_code)]

mod app;
pub mod cli;
mod commands;
mod source;

pub use app::{execute, run};
