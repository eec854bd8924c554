//! Photo Roll Copier - CLI Entry Point
//!
//! Copies photo rolls from a connected phone into a local folder, skipping
//! files that are already there.
//!
//! This binary is a thin wrapper around the library, handling argument parsing,
//! logging setup, and command dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{info, warn, LevelFilter};
use photo_roll_copier::cli::commands::{register_interrupt, Interrupt};
use photo_roll_copier::cli::{self, Args, Commands, DualWriter};
use photo_roll_copier::core::config::{Config, ConfigSource, Destination, LoadedConfig};
use photo_roll_copier::device::clear_system_clipboard;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let LoadedConfig { mut config, source } = match args.config {
        Some(ref config_path) => Config::load_or_init(config_path),
        None => Config::load_default(),
    };

    // Apply CLI overrides to config
    if let Some(ref root) = args.devices_root {
        config.devices_root = Some(root.clone());
    }
    if !args.device_names.is_empty() {
        config.device_name_patterns = args.device_names.clone();
    }
    if let Some(ref level) = args.log_level {
        config.log_level = level.clone();
    }

    let destination = match (&args.command, &args.output) {
        (Some(Commands::Simulate { output, .. }), _) => Destination {
            path: output.clone(),
            warning: None,
        },
        (_, Some(output)) => Destination {
            path: output.clone(),
            warning: None,
        },
        _ => config.resolve_destination(),
    };

    init_logger(&args, &config, &destination)?;

    match source {
        ConfigSource::Loaded(path) => info!("Configuration loaded from {}", path.display()),
        ConfigSource::CreatedDefault(path) => {
            info!("Default configuration written to {}", path.display())
        }
        ConfigSource::Fallback(e) => warn!("{}; using default configuration", e),
    }
    if let Some(ref warning) = destination.warning {
        warn!("{}", warning);
    }

    // Set up graceful shutdown handler
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();

    ctrlc::set_handler(move || match register_interrupt(&shutdown_flag_clone) {
        Interrupt::Force => {
            // Session::drop does not run on process::exit
            eprintln!("\nForce shutdown requested. Exiting immediately...");
            clear_system_clipboard();
            std::process::exit(1);
        }
        Interrupt::Graceful => {
            eprintln!("\nStopping after the current folder... (Press Ctrl+C again to force quit)");
        }
    })
    .expect("Failed to set Ctrl+C handler");

    cli::run_command(&args, &config, &destination.path, shutdown_flag)?;

    Ok(())
}

/// Log to stderr, and for runs also to the log file inside the destination
fn init_logger(args: &Args, config: &Config, destination: &Destination) -> Result<()> {
    let log_level = match config.log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let mut builder = Builder::new();
    builder.filter_level(log_level).format(|buf, record| {
        writeln!(
            buf,
            "[{} {}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        )
    });

    if args.performs_run() {
        fs::create_dir_all(&destination.path).with_context(|| {
            format!(
                "Failed to create destination directory {}",
                destination.path.display()
            )
        })?;

        let log_path = destination.path.join(&config.log_file_name);
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

        builder.target(env_logger::Target::Pipe(Box::new(DualWriter {
            console: std::io::stderr(),
            file: log_file,
        })));
        builder.init();

        info!("Photo Roll Copier v{}", photo_roll_copier::VERSION);
        info!("Destination: {}", destination.path.display());
        info!("Logging to file: {}", log_path.display());
    } else {
        builder.init();
    }

    Ok(())
}
