//! Namespace abstraction traits for testability
//!
//! This module defines the read-only view of a device's file namespace that the
//! copy engine works against. Both the mounted-directory backend and the
//! in-memory mock implement [`NamespaceAccessor`], so the copy strategy,
//! folder synchronizer and run orchestrator never depend on a transport.
//!
//! # Capability set
//!
//! - list the namespace root (devices) and the children of any folder
//! - distinguish folders from files
//! - copy a file into a local folder with prompts suppressed
//! - invoke the `copy`/`paste` verbs used by the clipboard fallback
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use photo_roll_copier::device::traits::{NamespaceAccessor, RemoteEntry};
//!
//! fn list_rolls<A: NamespaceAccessor>(accessor: &A) -> Result<Vec<String>, String> {
//!     let mut names = Vec::new();
//!     for entry in accessor.top_level().map_err(|e| e.to_string())? {
//!         if let RemoteEntry::Folder(folder) = entry {
//!             names.push(folder.name);
//!         }
//!     }
//!     Ok(names)
//! }
//! ```

use crate::core::error::Result;
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

/// A folder on the device (a roll, the storage container, or the device itself)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    /// Accessor-specific identifier (a path for mounted devices)
    pub object_id: String,
    /// Folder name, unique among its siblings
    pub name: String,
}

impl RemoteFolder {
    pub fn new(object_id: &str, name: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            name: name.to_string(),
        }
    }
}

/// A single transferable file on the device; its size is not known up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Accessor-specific identifier
    pub object_id: String,
    /// File name, unique within its parent folder
    pub name: String,
}

impl RemoteFile {
    pub fn new(object_id: &str, name: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            name: name.to_string(),
        }
    }
}

/// One child returned by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEntry {
    Folder(RemoteFolder),
    File(RemoteFile),
}

impl RemoteEntry {
    pub fn name(&self) -> &str {
        match self {
            RemoteEntry::Folder(folder) => &folder.name,
            RemoteEntry::File(file) => &file.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, RemoteEntry::Folder(_))
    }

    pub fn into_folder(self) -> Option<RemoteFolder> {
        match self {
            RemoteEntry::Folder(folder) => Some(folder),
            RemoteEntry::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<RemoteFile> {
        match self {
            RemoteEntry::File(file) => Some(file),
            RemoteEntry::Folder(_) => None,
        }
    }
}

/// Handle to a local destination folder, as resolved by the accessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFolder {
    path: PathBuf,
}

impl LocalFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Flags for [`NamespaceAccessor::copy_here`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyFlags(u32);

impl CopyFlags {
    /// Answer "Yes to All" to any confirmation the transfer would raise
    pub const NO_CONFIRMATION: CopyFlags = CopyFlags(16);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: CopyFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Shell verbs used by the clipboard fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Copy,
    Paste,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Copy => "copy",
            Verb::Paste => "paste",
        }
    }
}

impl Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a verb is invoked on
#[derive(Debug, Clone, Copy)]
pub enum VerbTarget<'a> {
    Remote(&'a RemoteFile),
    Local(&'a LocalFolder),
}

impl Display for VerbTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbTarget::Remote(file) => write!(f, "{}", file.name),
            VerbTarget::Local(folder) => write!(f, "{}", folder.path().display()),
        }
    }
}

/// Read-only access to a device namespace
///
/// Calls are synchronous and may block for as long as the underlying
/// transport needs; no timeout is applied at this level.
pub trait NamespaceAccessor {
    /// Entries directly under the namespace root (one per connected device)
    fn top_level(&self) -> Result<Vec<RemoteEntry>>;

    /// Children of a folder, in the order the transport reports them
    fn enumerate_children(&self, folder: &RemoteFolder) -> Result<Vec<RemoteEntry>>;

    /// Resolve a local directory into a folder handle able to receive copies
    ///
    /// Returns `Ok(None)` when the path is not an existing directory.
    fn resolve_local_folder(&self, path: &Path) -> Result<Option<LocalFolder>>;

    /// Transfer `file` into `destination`, keeping its name
    fn copy_here(&self, destination: &LocalFolder, file: &RemoteFile, flags: CopyFlags)
        -> Result<()>;

    /// Activate a shell verb on a remote file or a local folder
    fn invoke_verb(&self, target: VerbTarget<'_>, verb: Verb) -> Result<()>;

    /// Empty the shared clipboard; failures are ignored
    fn clear_clipboard(&self);

    /// Release process-wide resources at the end of a session
    fn release(&self) {
        self.clear_clipboard();
    }

    /// Find a direct child folder by name, ignoring case
    fn find_folder(&self, parent: &RemoteFolder, name: &str) -> Result<Option<RemoteFolder>> {
        let wanted = name.to_lowercase();
        Ok(self
            .enumerate_children(parent)?
            .into_iter()
            .filter_map(RemoteEntry::into_folder)
            .find(|folder| folder.name.to_lowercase() == wanted))
    }
}

impl<A: NamespaceAccessor + ?Sized> NamespaceAccessor for &A {
    fn top_level(&self) -> Result<Vec<RemoteEntry>> {
        (**self).top_level()
    }

    fn enumerate_children(&self, folder: &RemoteFolder) -> Result<Vec<RemoteEntry>> {
        (**self).enumerate_children(folder)
    }

    fn resolve_local_folder(&self, path: &Path) -> Result<Option<LocalFolder>> {
        (**self).resolve_local_folder(path)
    }

    fn copy_here(
        &self,
        destination: &LocalFolder,
        file: &RemoteFile,
        flags: CopyFlags,
    ) -> Result<()> {
        (**self).copy_here(destination, file, flags)
    }

    fn invoke_verb(&self, target: VerbTarget<'_>, verb: Verb) -> Result<()> {
        (**self).invoke_verb(target, verb)
    }

    fn clear_clipboard(&self) {
        (**self).clear_clipboard()
    }

    fn release(&self) {
        (**self).release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_accessors() {
        let folder = RemoteEntry::Folder(RemoteFolder::new("f-1", "2024-01"));
        let file = RemoteEntry::File(RemoteFile::new("o-1", "IMG_0001.JPG"));

        assert!(folder.is_folder());
        assert!(!file.is_folder());
        assert_eq!(folder.name(), "2024-01");
        assert_eq!(file.name(), "IMG_0001.JPG");

        assert!(folder.clone().into_file().is_none());
        assert_eq!(folder.into_folder().unwrap().object_id, "f-1");
        assert_eq!(file.into_file().unwrap().object_id, "o-1");
    }

    #[test]
    fn test_copy_flags() {
        let flags = CopyFlags::NO_CONFIRMATION;
        assert_eq!(flags.bits(), 16);
        assert!(flags.contains(CopyFlags::NO_CONFIRMATION));
        assert!(!CopyFlags::default().contains(CopyFlags::NO_CONFIRMATION));
    }

    #[test]
    fn test_verb_display() {
        assert_eq!(Verb::Copy.to_string(), "copy");
        assert_eq!(Verb::Paste.as_str(), "paste");

        let file = RemoteFile::new("o-1", "a.jpg");
        assert_eq!(VerbTarget::Remote(&file).to_string(), "a.jpg");
    }
}
