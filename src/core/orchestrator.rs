//! Run orchestrator
//!
//! Locates the device and its storage folder, then processes every roll in
//! ascending name order. A roll that fails outright is recorded as errored and
//! the run moves on; only a missing device or storage folder ends the run
//! early, before anything has been copied.

use crate::core::copier::{CopyEngine, CopyTimings};
use crate::core::error::{CopyError, Result};
use crate::core::eta::{
    format_duration, EtaEstimator, DEFAULT_FOLDER_SIZE_SKEW, DEFAULT_SCAN_OVERHEAD,
};
use crate::core::sync::{FolderResult, FolderSynchronizer, TransferTotals};
use crate::device::traits::{NamespaceAccessor, RemoteEntry, RemoteFile, RemoteFolder};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    /// Rolls where at least one file was copied and none failed
    pub completed: Vec<String>,
    /// Rolls that were already fully present
    pub skipped: Vec<String>,
    /// Rolls with failed files or a critical error
    pub errored: Vec<String>,
    pub total_elapsed: Duration,
    pub files_copied: usize,
    /// Files per minute over the whole run; 0 when nothing was copied
    pub average_speed: f64,
    /// The run stopped early on user request
    pub interrupted: bool,
}

impl RunResult {
    pub fn folders_processed(&self) -> usize {
        self.completed.len() + self.skipped.len() + self.errored.len()
    }
}

/// Settings for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Local root under which one folder per roll is created
    pub destination: PathBuf,
    /// Case-insensitive substrings identifying the device entry
    pub device_patterns: Vec<String>,
    /// Name of the storage folder beneath the device entry
    pub storage_folder: String,
    pub timings: CopyTimings,
    pub scan_overhead: f64,
    pub folder_size_skew: f64,
}

impl RunOptions {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            device_patterns: vec!["iphone".to_string(), "apple".to_string()],
            storage_folder: "Internal Storage".to_string(),
            timings: CopyTimings::default(),
            scan_overhead: DEFAULT_SCAN_OVERHEAD,
            folder_size_skew: DEFAULT_FOLDER_SIZE_SKEW,
        }
    }
}

/// Drives one copy run over a namespace accessor
pub struct RunOrchestrator<'a, A: NamespaceAccessor> {
    accessor: &'a A,
    options: RunOptions,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl<'a, A: NamespaceAccessor> RunOrchestrator<'a, A> {
    pub fn new(accessor: &'a A, options: RunOptions) -> Self {
        Self {
            accessor,
            options,
            shutdown_flag: None,
        }
    }

    /// Stop before the next roll once `flag` is set
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Execute the run
    ///
    /// Never fails: a missing device or storage folder is logged and yields
    /// an empty result.
    pub fn run(&self) -> RunResult {
        let start = Instant::now();

        let storage = match self.locate_storage() {
            Ok(storage) => storage,
            Err(e) => {
                error!("✗ {}", e);
                return RunResult::default();
            }
        };

        let rolls = match self.list_rolls(&storage) {
            Ok(rolls) => rolls,
            Err(e) => {
                error!("✗ {}", e);
                return RunResult::default();
            }
        };

        let total = rolls.len();
        info!("Starting copy of {} folders…", total);

        let engine = CopyEngine::new(self.accessor, self.options.timings);
        let synchronizer = FolderSynchronizer::new(engine);
        let mut totals = TransferTotals::new(EtaEstimator::new(
            self.options.scan_overhead,
            self.options.folder_size_skew,
        ));
        let mut result = RunResult::default();
        let mut files_seen = 0usize;
        let mut folders_with_files = 0usize;

        for (position, roll) in rolls.iter().enumerate() {
            let index = position + 1;

            if self.shutdown_requested() {
                warn!(
                    "Shutdown requested, stopping before '{}' ({} folders left)",
                    roll.name,
                    total - position
                );
                result.interrupted = true;
                break;
            }

            info!("[{}/{}] Analyzing folder: {}", index, total, roll.name);

            let status = self
                .list_files(roll)
                .and_then(|files| {
                    if !files.is_empty() {
                        files_seen += files.len();
                        folders_with_files += 1;
                    }
                    synchronizer.sync_folder(
                        roll,
                        &files,
                        &self.options.destination,
                        index,
                        total,
                        &mut totals,
                    )
                })
                .map(|report| report.result());

            match &status {
                Ok(FolderResult::Completed) => result.completed.push(roll.name.clone()),
                Ok(FolderResult::AlreadyComplete) => result.skipped.push(roll.name.clone()),
                Ok(FolderResult::CompletedWithErrors) => result.errored.push(roll.name.clone()),
                Err(e) => {
                    error!("✗ Critical error in folder {}: {}", roll.name, e);
                    result.errored.push(roll.name.clone());
                }
            }

            if should_log_eta(index, total, totals.files_copied, &status) {
                let avg_files = totals
                    .estimator
                    .average_files_per_folder(files_seen, folders_with_files);
                let eta = totals.estimator.estimate_remaining(index, total, avg_files);
                info!(
                    "Estimated time remaining: {} [statistical estimate, not based on actual missing files]",
                    eta
                );
            }
        }

        result.total_elapsed = start.elapsed();
        result.files_copied = totals.files_copied;
        result.average_speed = average_speed(result.files_copied, result.total_elapsed);

        log_summary(&result, total);
        result
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Find the device entry, then its storage folder
    fn locate_storage(&self) -> Result<RemoteFolder> {
        let patterns: Vec<String> = self
            .options
            .device_patterns
            .iter()
            .map(|p| p.to_lowercase())
            .collect();

        let device = self
            .accessor
            .top_level()?
            .into_iter()
            .filter_map(RemoteEntry::into_folder)
            .find(|entry| {
                let name = entry.name.to_lowercase();
                patterns.iter().any(|p| name.contains(p.as_str()))
            })
            .ok_or_else(|| CopyError::DeviceNotFound {
                patterns: self.options.device_patterns.clone(),
            })?;

        info!("Found device: {}", device.name);

        self.accessor
            .find_folder(&device, &self.options.storage_folder)?
            .ok_or_else(|| CopyError::StorageNotFound {
                device: device.name.clone(),
                storage: self.options.storage_folder.clone(),
            })
    }

    /// Folder children of the storage, sorted by name
    fn list_rolls(&self, storage: &RemoteFolder) -> Result<Vec<RemoteFolder>> {
        let mut rolls: Vec<RemoteFolder> = self
            .accessor
            .enumerate_children(storage)?
            .into_iter()
            .filter_map(RemoteEntry::into_folder)
            .collect();
        rolls.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rolls)
    }

    /// Immediate file children of a roll, in listing order
    fn list_files(&self, roll: &RemoteFolder) -> Result<Vec<RemoteFile>> {
        Ok(self
            .accessor
            .enumerate_children(roll)?
            .into_iter()
            .filter_map(RemoteEntry::into_file)
            .collect())
    }
}

/// Whether an ETA line follows the folder at `index`
///
/// Never after the last folder, before the first copy, or after a folder
/// that needed no copying or failed outright.
pub fn should_log_eta(
    index: usize,
    total: usize,
    files_copied: usize,
    status: &Result<FolderResult>,
) -> bool {
    index < total
        && files_copied > 0
        && matches!(
            status,
            Ok(FolderResult::Completed) | Ok(FolderResult::CompletedWithErrors)
        )
}

/// Files per minute, 0 when nothing was copied
pub fn average_speed(files_copied: usize, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if files_copied == 0 || seconds <= 0.0 {
        return 0.0;
    }
    files_copied as f64 / seconds * 60.0
}

fn log_summary(result: &RunResult, total: usize) {
    let headline = if result.interrupted {
        format!(
            "INTERRUPTED SUMMARY ({} of {} folders processed)",
            result.folders_processed(),
            total
        )
    } else {
        format!("FINAL SUMMARY ({} total folders)", total)
    };

    info!(
        "{}:\n   ✓ Completed: {}\n   • Skipped: {}\n   ✗ With errors: {}\n\nSTATISTICS:\n   Total time: {}\n   Files copied: {}\n   Average speed: {:.1} files/minute",
        headline,
        result.completed.len(),
        result.skipped.len(),
        result.errored.len(),
        format_duration(result.total_elapsed.as_secs_f64()),
        result.files_copied,
        result.average_speed
    );

    if !result.errored.is_empty() {
        warn!("Folders to retry: {}", result.errored.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdb::{MockFileBehavior, MockNamespace, STORAGE_ID};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn options(dest: &Path) -> RunOptions {
        RunOptions {
            timings: CopyTimings::immediate(),
            ..RunOptions::new(dest)
        }
    }

    #[test]
    fn test_end_to_end_with_existing_file() {
        let dest = TempDir::new().unwrap();
        let local = dest.path().join("Roll1");
        fs::create_dir_all(&local).unwrap();
        fs::write(local.join("a.jpg"), b"already here").unwrap();

        let mut ns = MockNamespace::iphone();
        ns.add_roll("Roll1", &["a.jpg", "b.jpg"]);

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result.completed, vec!["Roll1"]);
        assert!(result.skipped.is_empty());
        assert!(result.errored.is_empty());
        assert_eq!(result.files_copied, 1);
        assert!(result.average_speed > 0.0);
        assert_eq!(fs::read(local.join("a.jpg")).unwrap(), b"already here");
        assert!(local.join("b.jpg").exists());
    }

    #[test]
    fn test_rolls_processed_in_name_order() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        ns.add_roll("2024-03", &["c.jpg"]);
        ns.add_roll("2024-01", &["a.jpg"]);
        ns.add_roll("2024-02", &["b.jpg"]);

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result.completed, vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn test_second_run_skips_everything() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        ns.add_roll("2024-01", &["a.jpg", "b.jpg"]);
        ns.add_roll("2024-02", &["c.jpg"]);

        let first = RunOrchestrator::new(&ns, options(dest.path())).run();
        assert_eq!(first.files_copied, 3);

        let second = RunOrchestrator::new(&ns, options(dest.path())).run();
        assert_eq!(second.skipped, vec!["2024-01", "2024-02"]);
        assert!(second.completed.is_empty());
        assert_eq!(second.files_copied, 0);
        assert_eq!(second.average_speed, 0.0);
    }

    #[test]
    fn test_device_not_found_returns_empty_result() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::new();
        ns.add_folder(crate::testdb::ROOT_ID, "USB Stick");

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result, RunResult::default());
        assert_eq!(ns.stats().copy_here_calls, 0);
    }

    #[test]
    fn test_storage_not_found_returns_empty_result() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::new();
        let device = ns.add_folder(crate::testdb::ROOT_ID, "Jane's iPhone");
        ns.add_folder(&device, "Photos");

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result.folders_processed(), 0);
        assert!(fs::read_dir(dest.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_device_and_storage_matched_case_insensitively() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::new();
        let device = ns.add_folder(crate::testdb::ROOT_ID, "APPLE iPHONE 15");
        let storage = ns.add_folder(&device, "INTERNAL STORAGE");
        let roll = ns.add_folder(&storage, "100APPLE");
        ns.add_file(&roll, "IMG_0001.JPG", vec![1, 2, 3]);

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result.completed, vec!["100APPLE"]);
    }

    #[test]
    fn test_critical_folder_error_does_not_abort_run() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        ns.add_roll("2024-01", &["a.jpg"]);
        let broken = ns.add_roll("2024-02", &["b.jpg"]);
        ns.add_roll("2024-03", &["c.jpg"]);
        ns.fail_enumeration_of(&broken);

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result.completed, vec!["2024-01", "2024-03"]);
        assert_eq!(result.errored, vec!["2024-02"]);
        assert_eq!(result.files_copied, 2);
    }

    #[test]
    fn test_failed_files_mark_folder_errored() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        let roll = ns.add_roll("2024-01", &["a.jpg", "b.jpg"]);
        ns.set_file_behavior(&roll, "b.jpg", MockFileBehavior::unreachable());
        ns.add_roll("2024-02", &["c.jpg"]);

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result.errored, vec!["2024-01"]);
        assert_eq!(result.completed, vec!["2024-02"]);
        assert_eq!(result.files_copied, 2);
    }

    #[test]
    fn test_loose_files_in_storage_are_ignored() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        ns.add_file(STORAGE_ID, "stray.jpg", vec![0]);
        ns.add_roll("Roll", &["a.jpg"]);

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result.folders_processed(), 1);
        assert!(!dest.path().join("stray.jpg").exists());
    }

    #[test]
    fn test_subfolders_of_rolls_are_not_copied() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        let roll = ns.add_roll("Roll", &["a.jpg"]);
        let nested = ns.add_folder(&roll, "nested");
        ns.add_file(&nested, "deep.jpg", vec![0]);

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result.files_copied, 1);
        assert!(!dest.path().join("Roll").join("nested").exists());
    }

    #[test]
    fn test_shutdown_flag_stops_before_next_folder() {
        let dest = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        ns.add_roll("2024-01", &["a.jpg"]);
        ns.add_roll("2024-02", &["b.jpg"]);

        let flag = Arc::new(AtomicBool::new(true));
        let result = RunOrchestrator::new(&ns, options(dest.path()))
            .with_shutdown_flag(flag)
            .run();

        assert!(result.interrupted);
        assert_eq!(result.folders_processed(), 0);
        assert_eq!(ns.stats().copy_here_calls, 0);
    }

    #[test]
    fn test_generated_device() {
        let dest = TempDir::new().unwrap();
        let ns = MockNamespace::generated(4, 5, 1);

        let result = RunOrchestrator::new(&ns, options(dest.path())).run();

        assert_eq!(result.errored.len(), 4);
        assert_eq!(result.files_copied, 16);
    }

    #[test]
    fn test_average_speed() {
        assert_eq!(average_speed(0, Duration::from_secs(10)), 0.0);
        assert_eq!(average_speed(10, Duration::from_secs(60)), 10.0);
        assert_eq!(average_speed(3, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_eta_logged_after_copy_work_with_folders_left() {
        assert!(should_log_eta(1, 3, 5, &Ok(FolderResult::Completed)));
        assert!(should_log_eta(2, 3, 5, &Ok(FolderResult::CompletedWithErrors)));
    }

    #[test]
    fn test_no_eta_after_last_folder() {
        assert!(!should_log_eta(3, 3, 5, &Ok(FolderResult::Completed)));
    }

    #[test]
    fn test_no_eta_before_first_copy() {
        assert!(!should_log_eta(1, 3, 0, &Ok(FolderResult::Completed)));
        assert!(!should_log_eta(1, 3, 0, &Ok(FolderResult::CompletedWithErrors)));
    }

    #[test]
    fn test_no_eta_for_already_complete_or_critical_folder() {
        assert!(!should_log_eta(1, 3, 5, &Ok(FolderResult::AlreadyComplete)));

        let critical = Err(CopyError::EnumerationError {
            folder: "2024-02".to_string(),
            message: "device busy".to_string(),
        });
        assert!(!should_log_eta(2, 3, 5, &critical));
    }
}
