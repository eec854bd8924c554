//! CLI module for the roll copier
//!
//! This module contains all command-line interface related code including
//! argument parsing, command definitions, and command handlers.
//!
//! # Submodules
//!
//! - `args` - Command-line argument definitions using clap
//! - `commands` - Command handler implementations
//! - `output` - Console output helpers and the log tee writer

pub mod args;
pub mod commands;
pub mod output;

// Re-export commonly used types for convenience
pub use args::{Args, Commands};
pub use commands::run_command;
pub use output::DualWriter;
