//! Subcommand implementations.

pub mod config;
pub mod inspect;
pub mod process;
