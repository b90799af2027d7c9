//! `authctl` command-line surface.

pub mod args;
pub mod commands;

pub use args::{AuthCommand, Cli, Command};
pub use commands::{execute, retry_hint, CommandContext};
