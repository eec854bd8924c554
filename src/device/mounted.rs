//! Mounted-directory namespace backend
//!
//! Exposes a device that the operating system has mounted as a directory tree
//! (gvfs/ifuse on Linux, a volume on macOS) through [`NamespaceAccessor`]. The
//! namespace root is the directory containing one entry per mounted device;
//! object identifiers are absolute paths.
//!
//! The `copy` verb stages the source path and also publishes it as text on
//! the system clipboard when one is available; `paste` streams the staged file
//! into the target folder.

use crate::core::error::{CopyError, Result};
use crate::device::traits::{
    CopyFlags, LocalFolder, NamespaceAccessor, RemoteEntry, RemoteFile, RemoteFolder, Verb,
    VerbTarget,
};
use log::{debug, trace, warn};
use std::cell::RefCell;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// A device namespace rooted at a local directory
pub struct MountedNamespace {
    root: PathBuf,
    clipboard: RefCell<Option<arboard::Clipboard>>,
    staged: RefCell<Option<PathBuf>>,
}

impl MountedNamespace {
    /// Open the namespace at `root`, attaching to the system clipboard if possible
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let namespace = Self::without_system_clipboard(root)?;
        match arboard::Clipboard::new() {
            Ok(clipboard) => *namespace.clipboard.borrow_mut() = Some(clipboard),
            Err(e) => debug!("System clipboard unavailable: {}", e),
        }
        Ok(namespace)
    }

    /// Open the namespace at `root` without touching the system clipboard
    pub fn without_system_clipboard(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CopyError::NamespaceUnavailable {
                path: root,
                message: "not a directory".to_string(),
            });
        }
        Ok(Self {
            root,
            clipboard: RefCell::new(None),
            staged: RefCell::new(None),
        })
    }

    /// The path currently staged by the `copy` verb
    pub fn staged(&self) -> Option<PathBuf> {
        self.staged.borrow().clone()
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let id = path.to_string_lossy().into_owned();

            // Follows symlinks, some mount helpers expose storage that way
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    continue;
                }
            };

            if metadata.is_dir() {
                entries.push(RemoteEntry::Folder(RemoteFolder::new(&id, &name)));
            } else if metadata.is_file() {
                entries.push(RemoteEntry::File(RemoteFile::new(&id, &name)));
            }
        }
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }
}

/// Copy `source` to `target` through a hidden `.part` sibling
///
/// `target` only appears once every byte has been written; on failure the
/// partial file is removed.
fn transfer(source: &Path, target: &Path, name: &str) -> Result<u64> {
    let to_error = |e: io::Error| CopyError::TransferError {
        filename: name.to_string(),
        message: e.to_string(),
    };

    let partial = target.with_file_name(format!(".{}.part", name));
    let written = File::open(source)
        .and_then(|mut reader| {
            let mut writer = File::create(&partial)?;
            let written = io::copy(&mut reader, &mut writer)?;
            writer.sync_all()?;
            Ok(written)
        })
        .and_then(|written| fs::rename(&partial, target).map(|()| written));

    match written {
        Ok(written) => Ok(written),
        Err(e) => {
            if partial.exists() {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    warn!("Could not remove {}: {}", partial.display(), cleanup);
                }
            }
            Err(to_error(e))
        }
    }
}

/// Empty the system clipboard outside of any session
///
/// For exit paths that bypass [`Session`](crate::device::Session) release.
pub fn clear_system_clipboard() {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.clear() {
                debug!("Could not clear clipboard: {}", e);
            }
        }
        Err(e) => debug!("System clipboard unavailable: {}", e),
    }
}

impl NamespaceAccessor for MountedNamespace {
    fn top_level(&self) -> Result<Vec<RemoteEntry>> {
        self.list(&self.root)
            .map_err(|e| CopyError::NamespaceUnavailable {
                path: self.root.clone(),
                message: e.to_string(),
            })
    }

    fn enumerate_children(&self, folder: &RemoteFolder) -> Result<Vec<RemoteEntry>> {
        trace!("Enumerating {}", folder.object_id);
        self.list(Path::new(&folder.object_id))
            .map_err(|e| CopyError::EnumerationError {
                folder: folder.name.clone(),
                message: e.to_string(),
            })
    }

    fn resolve_local_folder(&self, path: &Path) -> Result<Option<LocalFolder>> {
        Ok(path.is_dir().then(|| LocalFolder::new(path)))
    }

    fn copy_here(
        &self,
        destination: &LocalFolder,
        file: &RemoteFile,
        flags: CopyFlags,
    ) -> Result<()> {
        let target = destination.path().join(&file.name);
        if target.exists() && !flags.contains(CopyFlags::NO_CONFIRMATION) {
            return Err(CopyError::TransferError {
                filename: file.name.clone(),
                message: "destination exists and confirmation is required".to_string(),
            });
        }

        transfer(Path::new(&file.object_id), &target, &file.name)?;
        Ok(())
    }

    fn invoke_verb(&self, target: VerbTarget<'_>, verb: Verb) -> Result<()> {
        match (target, verb) {
            (VerbTarget::Remote(file), Verb::Copy) => {
                let source = PathBuf::from(&file.object_id);
                if !source.is_file() {
                    return Err(CopyError::TransferError {
                        filename: file.name.clone(),
                        message: "source no longer exists".to_string(),
                    });
                }

                if let Some(clipboard) = self.clipboard.borrow_mut().as_mut() {
                    if let Err(e) = clipboard.set_text(file.object_id.clone()) {
                        debug!("Could not publish {} to clipboard: {}", file.name, e);
                    }
                }
                *self.staged.borrow_mut() = Some(source);
                Ok(())
            }
            (VerbTarget::Local(folder), Verb::Paste) => {
                let source = self.staged().ok_or(CopyError::NothingToPaste)?;
                let name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or(CopyError::NothingToPaste)?;

                let bytes = transfer(&source, &folder.path().join(&name), &name)?;
                trace!("Pasted {} ({} bytes)", name, bytes);
                Ok(())
            }
            (target, verb) => Err(CopyError::UnsupportedVerb {
                verb: verb.to_string(),
                target: target.to_string(),
            }),
        }
    }

    fn clear_clipboard(&self) {
        *self.staged.borrow_mut() = None;
        if let Some(clipboard) = self.clipboard.borrow_mut().as_mut() {
            if let Err(e) = clipboard.clear() {
                debug!("Could not clear clipboard: {}", e);
            }
        }
    }
}
