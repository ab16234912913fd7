//! CLI layer: argument parsing, command dispatch and the interactive menu

pub mod args;
pub mod commands;
pub mod error;
pub mod menu;
pub mod output;

pub use args::{Cli, Commands};
pub use commands::execute_command;
pub use error::{CliError, CliResult};
