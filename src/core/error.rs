//! Error types for the roll copier
//!
//! Only device/storage absence is terminal for a run. Everything else is
//! recovered at the file or folder level and surfaces as a logged line plus a
//! classification in the final summary.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for device access and copy operations
#[derive(Error, Debug)]
pub enum CopyError {
    /// No top-level namespace entry matched the configured device patterns
    #[error("No device found matching {patterns:?}. Make sure the phone is connected, unlocked and trusted.")]
    DeviceNotFound { patterns: Vec<String> },

    /// The device was found but has no storage folder with the expected name
    #[error("'{storage}' not found on device '{device}'")]
    StorageNotFound { device: String, storage: String },

    /// The namespace root itself could not be opened
    #[error("Device namespace unavailable at '{}': {message}", .path.display())]
    NamespaceUnavailable { path: PathBuf, message: String },

    /// Listing the children of a remote folder failed
    #[error("Failed to enumerate '{folder}': {message}")]
    EnumerationError { folder: String, message: String },

    /// A local destination folder could not be resolved by the accessor
    #[error("Destination folder not available: {}", .0.display())]
    DestinationUnavailable(PathBuf),

    /// The accessor rejected or failed a transfer
    #[error("Transfer failed for '{filename}': {message}")]
    TransferError { filename: String, message: String },

    /// A verb was invoked on a target that does not support it
    #[error("Verb '{verb}' is not supported on '{target}'")]
    UnsupportedVerb { verb: String, target: String },

    /// `paste` was invoked with nothing staged by a previous `copy`
    #[error("Nothing to paste: the clipboard is empty")]
    NothingToPaste,

    /// General I/O error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CopyError>;

impl From<std::io::Error> for CopyError {
    fn from(err: std::io::Error) -> Self {
        CopyError::IoError(err.to_string())
    }
}

impl CopyError {
    /// Whether the error ends the run before any folder is processed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CopyError::DeviceNotFound { .. }
                | CopyError::StorageNotFound { .. }
                | CopyError::NamespaceUnavailable { .. }
        )
    }
}
