//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::cli::output::{print_error, print_header, print_info, print_run_verdict, print_success};
use crate::cli::{Args, Commands};
use crate::core::config::{get_config_path, Config};
use crate::core::copier::CopyTimings;
use crate::core::orchestrator::{RunOptions, RunOrchestrator, RunResult};
use crate::device::{MountedNamespace, NamespaceAccessor, RemoteEntry, Session};
use crate::testdb::{sample_jpeg, MockNamespace, STORAGE_ID};
use anyhow::{Context, Result};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Run the appropriate command based on CLI arguments
///
/// `destination` is the already-resolved directory rolls are copied into.
pub fn run_command(
    args: &Args,
    config: &Config,
    destination: &Path,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<()> {
    match &args.command {
        None | Some(Commands::Copy) => {
            copy_rolls(config, destination, shutdown_flag)?;
        }
        Some(Commands::ShowConfig) => {
            show_config(args, config, destination);
        }
        Some(Commands::InitConfig { force }) => {
            init_config(args.config.clone(), *force)?;
        }
        Some(Commands::Simulate {
            rolls,
            files_per_roll,
            existing,
            failing,
            ..
        }) => {
            let device = SimulatedDevice {
                rolls: *rolls,
                files_per_roll: *files_per_roll,
                existing: *existing,
                failing: *failing,
            };
            simulate(config, destination, &device, shutdown_flag)?;
        }
    }

    Ok(())
}

/// What a Ctrl+C press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// First press: finish the current folder, then stop
    Graceful,
    /// Any later press: exit now
    Force,
}

/// Record a Ctrl+C press on the shared shutdown flag
pub fn register_interrupt(shutdown_flag: &AtomicBool) -> Interrupt {
    if shutdown_flag.swap(true, Ordering::SeqCst) {
        Interrupt::Force
    } else {
        Interrupt::Graceful
    }
}

/// The config file this invocation reads and writes
pub fn active_config_path(args: &Args) -> Option<PathBuf> {
    args.config.clone().or_else(get_config_path)
}

/// Orchestrator settings derived from the config
pub fn run_options(config: &Config, destination: &Path) -> RunOptions {
    RunOptions {
        destination: destination.to_path_buf(),
        device_patterns: config.device_name_patterns.clone(),
        storage_folder: config.storage_folder.clone(),
        timings: config.timings.to_copy_timings(),
        scan_overhead: config.eta.scan_overhead,
        folder_size_skew: config.eta.folder_size_skew,
    }
}

const UNKNOWN_DEVICES_ROOT: &str = "Phones are not mounted as directories on this platform. \
     Mount the device (e.g. with a WebDAV or MTP filesystem tool) and set devices_root \
     in the config or pass --devices-root.";

/// Copy every roll from the mounted device
pub fn copy_rolls(
    config: &Config,
    destination: &Path,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<RunResult> {
    let Some(devices_root) = config.effective_devices_root() else {
        error!("✗ {}", UNKNOWN_DEVICES_ROOT);
        print_error(UNKNOWN_DEVICES_ROOT);
        return Ok(RunResult::default());
    };
    info!("Looking for devices in {}", devices_root.display());

    let namespace = match MountedNamespace::open(&devices_root) {
        Ok(namespace) => namespace,
        Err(e) => {
            error!("✗ {}", e);
            print_error("No device found. Connect and unlock the phone, then try again.");
            return Ok(RunResult::default());
        }
    };

    let session = Session::acquire(namespace);
    let result = run_with(session.accessor(), config, destination, shutdown_flag);
    Ok(result)
}

/// Shape of the device generated by `simulate`
#[derive(Debug, Clone, Copy)]
pub struct SimulatedDevice {
    pub rolls: usize,
    pub files_per_roll: usize,
    /// Files per roll written to the destination before the run
    pub existing: usize,
    /// Files per roll that never copy
    pub failing: usize,
}

/// Copy from a generated in-memory device into `destination`
pub fn simulate(
    config: &Config,
    destination: &Path,
    device: &SimulatedDevice,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<RunResult> {
    let namespace =
        MockNamespace::generated(device.rolls, device.files_per_roll, device.failing);
    info!(
        "Simulating device with {} rolls of {} files ({} pre-existing, {} failing per roll)",
        device.rolls, device.files_per_roll, device.existing, device.failing
    );

    if device.existing > 0 {
        seed_existing(&namespace, destination, device.existing)?;
    }

    let mut config = config.clone();
    config.device_name_patterns = vec!["iphone".to_string()];
    config.storage_folder = "Internal Storage".to_string();

    let session = Session::acquire(&namespace);
    let mut options = run_options(&config, destination);
    options.timings = CopyTimings::immediate();

    let result = RunOrchestrator::new(session.accessor(), options)
        .with_shutdown_flag(shutdown_flag)
        .run();
    print_run_verdict(&result);
    Ok(result)
}

fn run_with<A: NamespaceAccessor>(
    accessor: &A,
    config: &Config,
    destination: &Path,
    shutdown_flag: Arc<AtomicBool>,
) -> RunResult {
    let result = RunOrchestrator::new(accessor, run_options(config, destination))
        .with_shutdown_flag(shutdown_flag)
        .run();
    print_run_verdict(&result);
    result
}

/// Write the first `count` files of every generated roll to the destination
fn seed_existing(namespace: &MockNamespace, destination: &Path, count: usize) -> Result<()> {
    let storage = namespace
        .remote_folder(STORAGE_ID)
        .context("Simulated device has no storage folder")?;

    for roll in namespace
        .enumerate_children(&storage)?
        .into_iter()
        .filter_map(RemoteEntry::into_folder)
    {
        let local = destination.join(&roll.name);
        fs::create_dir_all(&local)
            .with_context(|| format!("Failed to create {}", local.display()))?;

        for file in namespace
            .enumerate_children(&roll)?
            .into_iter()
            .filter_map(RemoteEntry::into_file)
            .take(count)
        {
            fs::write(local.join(&file.name), sample_jpeg(&file.name))
                .with_context(|| format!("Failed to seed {}", file.name))?;
        }
    }

    Ok(())
}

/// Write the default configuration file
pub fn init_config(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let path = path
        .or_else(get_config_path)
        .context("Could not determine configuration directory")?;

    if path.exists() && !force {
        print_info(&format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        ));
        return Ok(path);
    }

    Config::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    print_success(&format!("Wrote default configuration to {}", path.display()));
    Ok(path)
}

/// Show the current configuration settings
pub fn show_config(args: &Args, config: &Config, destination: &Path) {
    print_header("Photo Roll Copier configuration");

    match active_config_path(args) {
        Some(path) if path.exists() => print_info(&format!("Config file: {}", path.display())),
        Some(path) => print_info(&format!(
            "Config file: {} (not found, using defaults)",
            path.display()
        )),
        None => print_info("Config file: (no configuration directory, using defaults)"),
    }

    println!();
    println!("  use_desktop          = {}", config.use_desktop);
    println!("  custom_path          = {:?}", config.custom_path);
    match config.effective_devices_root() {
        Some(root) => println!("  devices_root         = \"{}\"", root.display()),
        None => println!("  devices_root         = (not set, required on this platform)"),
    }
    println!("  device_name_patterns = {:?}", config.device_name_patterns);
    println!("  storage_folder       = {:?}", config.storage_folder);
    println!(
        "  timings              = primary {} ms, fallback {} ms, verify timeout {}",
        config.timings.primary_settle_ms,
        config.timings.fallback_settle_ms,
        config
            .timings
            .verify_timeout_ms
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "(off)".to_string())
    );
    println!(
        "  eta                  = scan overhead {}, folder size skew {}",
        config.eta.scan_overhead, config.eta.folder_size_skew
    );
    println!("  log_level            = {}", config.log_level);
    println!("  log_file_name        = {}", config.log_file_name);
    println!();
    print_info(&format!("Destination: {}", destination.display()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_shutdown() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn test_second_interrupt_forces_exit() {
        let flag = AtomicBool::new(false);

        assert_eq!(register_interrupt(&flag), Interrupt::Graceful);
        assert!(flag.load(Ordering::SeqCst));
        assert_eq!(register_interrupt(&flag), Interrupt::Force);
        assert_eq!(register_interrupt(&flag), Interrupt::Force);
    }

    #[test]
    fn test_simulate_copies_everything() {
        let dest = TempDir::new().unwrap();
        let device = SimulatedDevice {
            rolls: 2,
            files_per_roll: 3,
            existing: 0,
            failing: 0,
        };

        let result = simulate(&Config::default(), dest.path(), &device, no_shutdown()).unwrap();

        assert_eq!(result.completed, vec!["100APPLE", "101APPLE"]);
        assert_eq!(result.files_copied, 6);
        assert!(dest.path().join("101APPLE").join("IMG_0006.JPG").exists());
    }

    #[test]
    fn test_simulate_with_existing_and_failing_files() {
        let dest = TempDir::new().unwrap();
        let device = SimulatedDevice {
            rolls: 2,
            files_per_roll: 4,
            existing: 4,
            failing: 0,
        };

        let result = simulate(&Config::default(), dest.path(), &device, no_shutdown()).unwrap();
        assert_eq!(result.skipped, vec!["100APPLE", "101APPLE"]);
        assert_eq!(result.files_copied, 0);

        let other = TempDir::new().unwrap();
        let device = SimulatedDevice {
            rolls: 1,
            files_per_roll: 4,
            existing: 1,
            failing: 1,
        };
        let result = simulate(&Config::default(), other.path(), &device, no_shutdown()).unwrap();
        assert_eq!(result.errored, vec!["100APPLE"]);
        assert_eq!(result.files_copied, 2);
    }

    #[test]
    fn test_run_options_follow_config() {
        let mut config = Config::default();
        config.device_name_patterns = vec!["pixel".to_string()];
        config.timings.verify_timeout_ms = Some(500);

        let options = run_options(&config, Path::new("/tmp/rolls"));

        assert_eq!(options.destination, PathBuf::from("/tmp/rolls"));
        assert_eq!(options.device_patterns, vec!["pixel"]);
        assert_eq!(
            options.timings.verify_timeout,
            Some(std::time::Duration::from_millis(500))
        );
    }

    #[test]
    fn test_copy_rolls_without_devices_root() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.devices_root = Some(dir.path().join("missing"));

        let result = copy_rolls(&config, dir.path(), no_shutdown()).unwrap();

        assert_eq!(result, RunResult::default());
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    #[test]
    fn test_copy_rolls_without_known_devices_root() {
        let dir = TempDir::new().unwrap();

        let result = copy_rolls(&Config::default(), dir.path(), no_shutdown()).unwrap();

        assert_eq!(result, RunResult::default());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_init_config_respects_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        init_config(Some(path.clone()), false).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());

        fs::write(&path, r#"{ "use_desktop": false }"#).unwrap();
        init_config(Some(path.clone()), false).unwrap();
        assert!(!Config::load(&path).unwrap().use_desktop);

        init_config(Some(path.clone()), true).unwrap();
        assert!(Config::load(&path).unwrap().use_desktop);
    }
}
