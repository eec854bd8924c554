//! Copy strategy engine
//!
//! Copies one remote file into a local directory. The direct transfer is tried
//! first; if it errors or the file has not appeared once the settle interval
//! has passed, the clipboard fallback (`copy` on the file, `paste` on the
//! folder) is tried exactly once. Success is only ever established by the
//! destination path existing on the local filesystem.
//!
//! Errors never leave this module: they are logged and turned into a
//! [`CopyAttempt::Failed`].

use crate::core::error::CopyError;
use crate::device::traits::{
    CopyFlags, LocalFolder, NamespaceAccessor, RemoteFile, Verb, VerbTarget,
};
use log::{debug, error, trace};
use std::fmt;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Waits inserted between issuing a transfer and checking its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyTimings {
    /// Settle interval after the direct transfer
    pub primary_settle: Duration,
    /// Settle interval after the clipboard paste
    pub fallback_settle: Duration,
    /// When set, keep polling every settle interval until this much time has
    /// passed instead of checking once
    pub verify_timeout: Option<Duration>,
}

impl Default for CopyTimings {
    fn default() -> Self {
        Self {
            primary_settle: Duration::from_millis(30),
            fallback_settle: Duration::from_millis(100),
            verify_timeout: None,
        }
    }
}

impl CopyTimings {
    /// No waiting at all, for in-memory devices
    pub fn immediate() -> Self {
        Self {
            primary_settle: Duration::ZERO,
            fallback_settle: Duration::ZERO,
            verify_timeout: None,
        }
    }
}

/// Which strategy produced the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    Clipboard,
}

/// Why a copy did not produce the destination file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyFailure {
    /// The calls succeeded but the file never appeared
    NotMaterialized,
    /// Polling gave up after the configured timeout
    TimedOut(Duration),
    /// The accessor reported an error
    Error(String),
}

impl fmt::Display for CopyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyFailure::NotMaterialized => write!(f, "file did not appear at destination"),
            CopyFailure::TimedOut(after) => {
                write!(f, "file did not appear within {} ms", after.as_millis())
            }
            CopyFailure::Error(message) => write!(f, "{}", message),
        }
    }
}

/// Result of copying one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyAttempt {
    /// The destination exists; `elapsed` runs from the start of the attempt
    /// to the successful existence check
    Copied { elapsed: Duration, strategy: Strategy },
    Failed(CopyFailure),
}

impl CopyAttempt {
    pub fn is_success(&self) -> bool {
        matches!(self, CopyAttempt::Copied { .. })
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            CopyAttempt::Copied { elapsed, .. } => Some(*elapsed),
            CopyAttempt::Failed(_) => None,
        }
    }
}

enum Verification {
    Present,
    Missing,
    TimedOut(Duration),
}

/// Two-tier copy of single files through a namespace accessor
pub struct CopyEngine<'a, A: NamespaceAccessor> {
    accessor: &'a A,
    timings: CopyTimings,
}

impl<'a, A: NamespaceAccessor> CopyEngine<'a, A> {
    pub fn new(accessor: &'a A, timings: CopyTimings) -> Self {
        Self { accessor, timings }
    }

    /// Copy `file` so that it ends up at `destination`
    ///
    /// `destination` is the full target path; its parent directory must
    /// already exist.
    pub fn copy(&self, file: &RemoteFile, destination: &Path) -> CopyAttempt {
        let start = Instant::now();

        match self.try_copy(file, destination, start) {
            Ok(attempt) => attempt,
            Err(e) => {
                error!("✗ Error during copy of '{}': {}", file.name, e);
                CopyAttempt::Failed(CopyFailure::Error(e.to_string()))
            }
        }
    }

    fn try_copy(
        &self,
        file: &RemoteFile,
        destination: &Path,
        start: Instant,
    ) -> Result<CopyAttempt, CopyError> {
        let parent = destination
            .parent()
            .ok_or_else(|| CopyError::DestinationUnavailable(destination.to_path_buf()))?;
        let folder = self
            .accessor
            .resolve_local_folder(parent)?
            .ok_or_else(|| CopyError::DestinationUnavailable(parent.to_path_buf()))?;

        match self
            .accessor
            .copy_here(&folder, file, CopyFlags::NO_CONFIRMATION)
        {
            Ok(()) => {
                let settle = self.timings.primary_settle;
                if matches!(self.wait_for(destination, settle), Verification::Present) {
                    return Ok(CopyAttempt::Copied {
                        elapsed: start.elapsed(),
                        strategy: Strategy::Direct,
                    });
                }
                debug!(
                    "Direct transfer of '{}' did not produce the file, trying clipboard",
                    file.name
                );
            }
            Err(e) => {
                debug!(
                    "Direct transfer of '{}' failed ({}), trying clipboard",
                    file.name, e
                );
            }
        }

        self.copy_via_clipboard(file, &folder, destination, start)
    }

    fn copy_via_clipboard(
        &self,
        file: &RemoteFile,
        folder: &LocalFolder,
        destination: &Path,
        start: Instant,
    ) -> Result<CopyAttempt, CopyError> {
        self.accessor.clear_clipboard();
        self.accessor.invoke_verb(VerbTarget::Remote(file), Verb::Copy)?;
        self.accessor.invoke_verb(VerbTarget::Local(folder), Verb::Paste)?;

        let attempt = match self.wait_for(destination, self.timings.fallback_settle) {
            Verification::Present => CopyAttempt::Copied {
                elapsed: start.elapsed(),
                strategy: Strategy::Clipboard,
            },
            Verification::Missing => CopyAttempt::Failed(CopyFailure::NotMaterialized),
            Verification::TimedOut(after) => CopyAttempt::Failed(CopyFailure::TimedOut(after)),
        };
        Ok(attempt)
    }

    fn wait_for(&self, path: &Path, settle: Duration) -> Verification {
        let waited_from = Instant::now();
        thread::sleep(settle);
        if path.exists() {
            return Verification::Present;
        }

        let Some(timeout) = self.timings.verify_timeout else {
            return Verification::Missing;
        };

        let poll = settle.max(Duration::from_millis(1));
        while waited_from.elapsed() < timeout {
            thread::sleep(poll);
            if path.exists() {
                trace!("'{}' appeared after polling", path.display());
                return Verification::Present;
            }
        }
        Verification::TimedOut(timeout)
    }
}
