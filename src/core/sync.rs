//! Incremental folder synchronizer
//!
//! Copies the files of one roll that are missing from its local folder. A
//! file counts as already copied when a path with the same name exists in the
//! destination folder; sizes and contents are never compared and existing
//! files are never touched.

use crate::core::copier::{CopyAttempt, CopyEngine};
use crate::core::error::Result;
use crate::core::eta::EtaEstimator;
use crate::device::traits::{NamespaceAccessor, RemoteFile, RemoteFolder};
use log::{info, warn};
use std::fmt;
use std::fs;
use std::path::Path;

/// Result of processing one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Skipped,
    Failed,
}

impl CopyOutcome {
    fn glyph(&self) -> &'static str {
        match self {
            CopyOutcome::Copied => "✓",
            CopyOutcome::Skipped => "•",
            CopyOutcome::Failed => "✗",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CopyOutcome::Copied => "Copied",
            CopyOutcome::Skipped => "Already exists",
            CopyOutcome::Failed => "Failed",
        }
    }
}

/// Overall status of a folder once all its files were processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderResult {
    /// At least one file copied, none failed
    Completed,
    /// Every file was already present
    AlreadyComplete,
    /// At least one file failed
    CompletedWithErrors,
}

impl fmt::Display for FolderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FolderResult::Completed => "Completed",
            FolderResult::AlreadyComplete => "Already complete",
            FolderResult::CompletedWithErrors => "Completed with errors",
        };
        f.write_str(text)
    }
}

/// Per-folder counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderReport {
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Number of files listed for the folder
    pub total: usize,
}

impl FolderReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: CopyOutcome) {
        match outcome {
            CopyOutcome::Copied => self.copied += 1,
            CopyOutcome::Skipped => self.skipped += 1,
            CopyOutcome::Failed => self.failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.copied + self.skipped + self.failed
    }

    /// Failures take precedence over everything else
    pub fn result(&self) -> FolderResult {
        if self.failed > 0 {
            FolderResult::CompletedWithErrors
        } else if self.copied == 0 && self.skipped == self.total {
            FolderResult::AlreadyComplete
        } else {
            FolderResult::Completed
        }
    }
}

/// Run-wide state updated on every successful copy
#[derive(Debug, Clone, Default)]
pub struct TransferTotals {
    pub files_copied: usize,
    pub estimator: EtaEstimator,
}

impl TransferTotals {
    pub fn new(estimator: EtaEstimator) -> Self {
        Self {
            files_copied: 0,
            estimator,
        }
    }
}

/// Copies the missing files of one remote folder
pub struct FolderSynchronizer<'a, A: NamespaceAccessor> {
    engine: CopyEngine<'a, A>,
}

impl<'a, A: NamespaceAccessor> FolderSynchronizer<'a, A> {
    pub fn new(engine: CopyEngine<'a, A>) -> Self {
        Self { engine }
    }

    /// Bring `dest_root/remote.name` up to date with `files`
    ///
    /// `files` is processed in the order given. `index` and `total` position
    /// the folder within the run and only affect log output. Fails only when
    /// the local folder cannot be created.
    pub fn sync_folder(
        &self,
        remote: &RemoteFolder,
        files: &[RemoteFile],
        dest_root: &Path,
        index: usize,
        total: usize,
        totals: &mut TransferTotals,
    ) -> Result<FolderReport> {
        let local_dir = dest_root.join(&remote.name);
        let file_count = files.len();

        if local_dir.is_dir() {
            info!(
                "[{}/{}] Checking folder: {} ({} files)",
                index, total, remote.name, file_count
            );
        } else {
            fs::create_dir_all(&local_dir)?;
            info!(
                "[{}/{}] New folder: {} ({} files to copy)",
                index, total, remote.name, file_count
            );
        }

        let mut report = FolderReport::new(file_count);

        for (file_index, file) in files.iter().enumerate() {
            let destination = local_dir.join(&file.name);

            let outcome = if destination.exists() {
                CopyOutcome::Skipped
            } else {
                match self.engine.copy(file, &destination) {
                    CopyAttempt::Copied { elapsed, .. } => {
                        totals.estimator.record_sample(elapsed);
                        totals.files_copied += 1;
                        CopyOutcome::Copied
                    }
                    CopyAttempt::Failed(reason) => {
                        warn!("  {}/{}: {}", remote.name, file.name, reason);
                        CopyOutcome::Failed
                    }
                }
            };

            report.record(outcome);
            info!(
                "  [{}/{}] {} {}: {}/{}",
                file_index + 1,
                file_count,
                outcome.glyph(),
                outcome.label(),
                remote.name,
                file.name
            );
        }

        match report.result() {
            FolderResult::CompletedWithErrors => warn!(
                "⚠ [{}/{}] Completed with errors: {} ({} copied, {} skipped, {} failed)",
                index, total, remote.name, report.copied, report.skipped, report.failed
            ),
            FolderResult::AlreadyComplete => info!(
                "✓ [{}/{}] Already complete: {} ({} files)",
                index, total, remote.name, report.skipped
            ),
            FolderResult::Completed => info!(
                "✓ [{}/{}] Completed: {} ({} copied, {} skipped)",
                index, total, remote.name, report.copied, report.skipped
            ),
        }

        Ok(report)
    }
}
