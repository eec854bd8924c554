//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incrementally copy photo rolls from a phone to a local folder
#[derive(Parser, Debug)]
#[command(name = "photo-roll-copier")]
#[command(version)]
#[command(about = "Copy photo rolls from a connected phone, skipping files already copied", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Destination directory for rolls (overrides use_desktop/custom_path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory where connected devices are mounted (overrides config)
    #[arg(long, value_name = "DIR")]
    pub devices_root: Option<PathBuf>,

    /// Device name substring to look for (can be specified multiple times)
    #[arg(short = 'n', long = "device-name", value_name = "PATTERN")]
    pub device_names: Vec<String>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy all rolls from the connected device (the default)
    Copy,

    /// Show the configuration in effect and the resolved destination
    ShowConfig,

    /// Write a default configuration file
    ///
    /// The config file is stored at:
    /// - Windows: %APPDATA%\photo_roll_copier\config.json
    /// - Linux/macOS: ~/.config/photo_roll_copier/config.json
    ///
    /// or at the path given with --config.
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run a copy against a simulated device (no phone required)
    ///
    /// Generates rolls named 100APPLE, 101APPLE, ... and copies them into
    /// the output directory using the same pipeline as a real run.
    Simulate {
        /// Destination directory for the simulated rolls
        #[arg(short, long)]
        output: PathBuf,

        /// Number of rolls on the simulated device
        #[arg(long, default_value = "3")]
        rolls: usize,

        /// Files in each roll
        #[arg(long, default_value = "20")]
        files_per_roll: usize,

        /// Files per roll already present at the destination before the run
        #[arg(long, default_value = "0")]
        existing: usize,

        /// Files per roll that can never be copied
        #[arg(long, default_value = "0")]
        failing: usize,
    },
}

impl Args {
    /// Whether the selected command performs a run and therefore writes a log file
    pub fn performs_run(&self) -> bool {
        matches!(
            self.command,
            None | Some(Commands::Copy) | Some(Commands::Simulate { .. })
        )
    }
}
