//! CLI module.
//!
//! Provides command-line interface parsing and command dispatch.

pub mod args;
pub mod commands;
pub mod output;

pub use args::{Cli, Commands, RepoArgs};
