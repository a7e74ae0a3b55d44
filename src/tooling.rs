//! Tooling & Integration Layer
//!
//! The `norns-edit` command line: argument parsing, a session over a local
//! dust directory, and text/json rendering of results.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
