//! Mock device implementation for testing without a real device
//!
//! [`MockNamespace`] is an in-memory namespace tree that implements
//! [`NamespaceAccessor`]. Files are written into real local directories when
//! a transfer "succeeds", so the existence checks the copy engine relies on
//! behave exactly as with a real device. Per-file behaviour can be scripted to
//! exercise the fallback path and failure handling.

use crate::core::error::{CopyError, Result};
use crate::device::traits::{
    CopyFlags, LocalFolder, NamespaceAccessor, RemoteEntry, RemoteFile, RemoteFolder, Verb,
    VerbTarget,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Parent id of top-level objects
pub const ROOT_ID: &str = "ROOT";

/// Object id of the device created by [`MockNamespace::iphone`]
pub const DEVICE_ID: &str = "device";

/// Object id of the storage folder created by [`MockNamespace::iphone`]
pub const STORAGE_ID: &str = "storage";

/// What the primary `copy_here` transfer does for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimaryBehavior {
    /// The file lands in the destination folder
    #[default]
    Deliver,
    /// The call returns without error but nothing is written
    NeverMaterialize,
    /// The call fails
    Error,
}

/// What the `copy`/`paste` fallback does for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackBehavior {
    #[default]
    Deliver,
    NeverMaterialize,
    Error,
}

/// Scripted transfer behaviour of one mock file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MockFileBehavior {
    pub primary: PrimaryBehavior,
    pub fallback: FallbackBehavior,
}

impl MockFileBehavior {
    /// Primary transfer works
    pub fn normal() -> Self {
        Self::default()
    }

    /// Primary transfer silently does nothing; the clipboard fallback works
    pub fn fallback_only() -> Self {
        Self {
            primary: PrimaryBehavior::NeverMaterialize,
            fallback: FallbackBehavior::Deliver,
        }
    }

    /// Primary transfer raises an error; the clipboard fallback works
    pub fn primary_error() -> Self {
        Self {
            primary: PrimaryBehavior::Error,
            fallback: FallbackBehavior::Deliver,
        }
    }

    /// Neither strategy ever produces the file
    pub fn unreachable() -> Self {
        Self {
            primary: PrimaryBehavior::NeverMaterialize,
            fallback: FallbackBehavior::NeverMaterialize,
        }
    }

    /// Both strategies raise errors
    pub fn broken() -> Self {
        Self {
            primary: PrimaryBehavior::Error,
            fallback: FallbackBehavior::Error,
        }
    }
}

/// Represents a file or folder in the mock namespace
#[derive(Debug, Clone)]
pub struct MockObject {
    /// Unique object ID
    pub object_id: String,
    /// Parent object ID ([`ROOT_ID`] for devices)
    pub parent_id: String,
    /// Object name (file/folder name)
    pub name: String,
    /// Whether this is a folder
    pub is_folder: bool,
    /// Bytes written when the file is delivered
    pub content: Vec<u8>,
    /// Scripted transfer behaviour
    pub behavior: MockFileBehavior,
}

impl MockObject {
    pub fn folder(object_id: &str, parent_id: &str, name: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            is_folder: true,
            content: Vec::new(),
            behavior: MockFileBehavior::default(),
        }
    }

    pub fn file(object_id: &str, parent_id: &str, name: &str, content: Vec<u8>) -> Self {
        Self {
            object_id: object_id.to_string(),
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            is_folder: false,
            content,
            behavior: MockFileBehavior::default(),
        }
    }

    fn to_entry(&self) -> RemoteEntry {
        if self.is_folder {
            RemoteEntry::Folder(RemoteFolder::new(&self.object_id, &self.name))
        } else {
            RemoteEntry::File(RemoteFile::new(&self.object_id, &self.name))
        }
    }
}

/// Counters of calls made against the mock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockStats {
    pub enumerations: usize,
    pub copy_here_calls: usize,
    pub copy_verbs: usize,
    pub paste_verbs: usize,
    pub clipboard_clears: usize,
    pub files_delivered: usize,
}

/// In-memory device namespace
#[derive(Debug, Default)]
pub struct MockNamespace {
    /// All objects indexed by object ID
    objects: HashMap<String, MockObject>,
    /// Children index: parent_id -> Vec<object_id>, in insertion order
    children_index: HashMap<String, Vec<String>>,
    /// Folders whose enumeration fails
    failing_enumerations: HashSet<String>,
    /// Object id placed on the clipboard by the `copy` verb
    staged: RefCell<Option<String>>,
    stats: RefCell<MockStats>,
    next_id: usize,
}

impl MockNamespace {
    /// Create an empty namespace with no devices
    pub fn new() -> Self {
        Self::default()
    }

    /// A namespace with one iPhone exposing an empty "Internal Storage"
    pub fn iphone() -> Self {
        let mut ns = Self::new();
        ns.add_object(MockObject::folder(DEVICE_ID, ROOT_ID, "Apple iPhone"));
        ns.add_object(MockObject::folder(STORAGE_ID, DEVICE_ID, "Internal Storage"));
        ns
    }

    /// An iPhone with `rolls` generated rolls of `files_per_roll` files each
    ///
    /// The last `failing_per_roll` files of every roll can never be copied.
    pub fn generated(rolls: usize, files_per_roll: usize, failing_per_roll: usize) -> Self {
        let mut ns = Self::iphone();
        for roll in 0..rolls {
            let roll_name = format!("{}APPLE", 100 + roll);
            let roll_id = ns.add_folder(STORAGE_ID, &roll_name);
            for file in 0..files_per_roll {
                let name = format!("IMG_{:04}.JPG", roll * files_per_roll + file + 1);
                let file_id = ns.add_file(&roll_id, &name, sample_jpeg(&name));
                if file + failing_per_roll >= files_per_roll {
                    ns.set_behavior(&file_id, MockFileBehavior::unreachable());
                }
            }
        }
        ns
    }

    /// Add an object to the namespace
    pub fn add_object(&mut self, object: MockObject) {
        let object_id = object.object_id.clone();
        let parent_id = object.parent_id.clone();

        self.objects.insert(object_id.clone(), object);
        self.children_index
            .entry(parent_id)
            .or_default()
            .push(object_id);
    }

    /// Add a folder under `parent_id`, returning its generated id
    pub fn add_folder(&mut self, parent_id: &str, name: &str) -> String {
        let id = self.generate_id();
        self.add_object(MockObject::folder(&id, parent_id, name));
        id
    }

    /// Add a file under `parent_id`, returning its generated id
    pub fn add_file(&mut self, parent_id: &str, name: &str, content: Vec<u8>) -> String {
        let id = self.generate_id();
        self.add_object(MockObject::file(&id, parent_id, name, content));
        id
    }

    /// Add a roll under the iPhone's storage with the given file names
    pub fn add_roll(&mut self, name: &str, files: &[&str]) -> String {
        let roll_id = self.add_folder(STORAGE_ID, name);
        for file in files {
            self.add_file(&roll_id, file, sample_jpeg(file));
        }
        roll_id
    }

    /// Change the scripted behaviour of an object
    pub fn set_behavior(&mut self, object_id: &str, behavior: MockFileBehavior) {
        if let Some(obj) = self.objects.get_mut(object_id) {
            obj.behavior = behavior;
        }
    }

    /// Change the behaviour of the file `name` inside folder `parent_id`
    pub fn set_file_behavior(&mut self, parent_id: &str, name: &str, behavior: MockFileBehavior) {
        if let Some(id) = self.child_id(parent_id, name) {
            self.set_behavior(&id, behavior);
        }
    }

    /// Make enumeration of a folder fail
    pub fn fail_enumeration_of(&mut self, folder_id: &str) {
        self.failing_enumerations.insert(folder_id.to_string());
    }

    /// Id of the child of `parent_id` named `name`
    pub fn child_id(&self, parent_id: &str, name: &str) -> Option<String> {
        self.children_index.get(parent_id).and_then(|ids| {
            ids.iter()
                .find(|id| self.objects.get(*id).is_some_and(|o| o.name == name))
                .cloned()
        })
    }

    /// Remote file handle for an object id
    pub fn remote_file(&self, object_id: &str) -> Option<RemoteFile> {
        self.objects
            .get(object_id)
            .filter(|o| !o.is_folder)
            .map(|o| RemoteFile::new(&o.object_id, &o.name))
    }

    /// Remote folder handle for an object id
    pub fn remote_folder(&self, object_id: &str) -> Option<RemoteFolder> {
        self.objects
            .get(object_id)
            .filter(|o| o.is_folder)
            .map(|o| RemoteFolder::new(&o.object_id, &o.name))
    }

    /// Count files only
    pub fn file_count(&self) -> usize {
        self.objects.values().filter(|o| !o.is_folder).count()
    }

    /// Snapshot of the call counters
    pub fn stats(&self) -> MockStats {
        self.stats.borrow().clone()
    }

    fn generate_id(&mut self) -> String {
        self.next_id += 1;
        format!("obj-{:05}", self.next_id)
    }

    fn object(&self, object_id: &str) -> Result<&MockObject> {
        self.objects.get(object_id).ok_or_else(|| CopyError::TransferError {
            filename: object_id.to_string(),
            message: "Object not found".to_string(),
        })
    }

    fn deliver(&self, obj: &MockObject, destination: &Path, flags: CopyFlags) -> Result<()> {
        let target = destination.join(&obj.name);
        if target.exists() && !flags.contains(CopyFlags::NO_CONFIRMATION) {
            return Err(CopyError::TransferError {
                filename: obj.name.clone(),
                message: "Destination exists and confirmation is required".to_string(),
            });
        }
        fs::write(&target, &obj.content)?;
        self.stats.borrow_mut().files_delivered += 1;
        Ok(())
    }
}

impl NamespaceAccessor for MockNamespace {
    fn top_level(&self) -> Result<Vec<RemoteEntry>> {
        let root = RemoteFolder::new(ROOT_ID, "");
        self.enumerate_children(&root)
    }

    fn enumerate_children(&self, folder: &RemoteFolder) -> Result<Vec<RemoteEntry>> {
        self.stats.borrow_mut().enumerations += 1;

        if self.failing_enumerations.contains(&folder.object_id) {
            return Err(CopyError::EnumerationError {
                folder: folder.name.clone(),
                message: "Simulated enumeration failure".to_string(),
            });
        }

        Ok(self
            .children_index
            .get(&folder.object_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.objects.get(id))
                    .map(MockObject::to_entry)
                    .collect()
            })
            .unwrap_or_default())
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
        self.stats.borrow_mut().copy_here_calls += 1;
        let obj = self.object(&file.object_id)?;

        match obj.behavior.primary {
            PrimaryBehavior::Deliver => self.deliver(obj, destination.path(), flags),
            PrimaryBehavior::NeverMaterialize => Ok(()),
            PrimaryBehavior::Error => Err(CopyError::TransferError {
                filename: obj.name.clone(),
                message: "Simulated transfer error".to_string(),
            }),
        }
    }

    fn invoke_verb(&self, target: VerbTarget<'_>, verb: Verb) -> Result<()> {
        match (target, verb) {
            (VerbTarget::Remote(file), Verb::Copy) => {
                self.stats.borrow_mut().copy_verbs += 1;
                self.object(&file.object_id)?;
                *self.staged.borrow_mut() = Some(file.object_id.clone());
                Ok(())
            }
            (VerbTarget::Local(folder), Verb::Paste) => {
                self.stats.borrow_mut().paste_verbs += 1;
                let staged = self.staged.borrow().clone();
                let object_id = staged.ok_or(CopyError::NothingToPaste)?;
                let obj = self.object(&object_id)?;

                match obj.behavior.fallback {
                    FallbackBehavior::Deliver => {
                        self.deliver(obj, folder.path(), CopyFlags::NO_CONFIRMATION)
                    }
                    FallbackBehavior::NeverMaterialize => Ok(()),
                    FallbackBehavior::Error => Err(CopyError::TransferError {
                        filename: obj.name.clone(),
                        message: "Simulated paste error".to_string(),
                    }),
                }
            }
            (target, verb) => Err(CopyError::UnsupportedVerb {
                verb: verb.to_string(),
                target: target.to_string(),
            }),
        }
    }

    fn clear_clipboard(&self) {
        self.stats.borrow_mut().clipboard_clears += 1;
        *self.staged.borrow_mut() = None;
    }
}

/// Small JPEG-looking payload that differs per file name
pub fn sample_jpeg(name: &str) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend_from_slice(name.as_bytes());
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_iphone_layout() {
        let mut ns = MockNamespace::iphone();
        ns.add_roll("2024-01", &["a.jpg", "b.jpg"]);

        let top = ns.top_level().unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name(), "Apple iPhone");

        let device = ns.remote_folder(DEVICE_ID).unwrap();
        let storage = ns.find_folder(&device, "internal storage").unwrap().unwrap();
        assert_eq!(storage.object_id, STORAGE_ID);

        let rolls = ns.enumerate_children(&storage).unwrap();
        assert_eq!(rolls.len(), 1);
        assert_eq!(ns.file_count(), 2);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut ns = MockNamespace::iphone();
        let roll = ns.add_roll("Roll", &["c.jpg", "a.jpg", "b.jpg"]);

        let names: Vec<String> = ns
            .enumerate_children(&ns.remote_folder(&roll).unwrap())
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["c.jpg", "a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_copy_here_delivers_file() {
        let dir = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        let roll = ns.add_roll("Roll", &["a.jpg"]);
        let file = ns.remote_file(&ns.child_id(&roll, "a.jpg").unwrap()).unwrap();

        let dest = ns.resolve_local_folder(dir.path()).unwrap().unwrap();
        ns.copy_here(&dest, &file, CopyFlags::NO_CONFIRMATION)
            .unwrap();

        assert_eq!(
            fs::read(dir.path().join("a.jpg")).unwrap(),
            sample_jpeg("a.jpg")
        );
        assert_eq!(ns.stats().files_delivered, 1);
    }

    #[test]
    fn test_copy_here_without_confirmation_flag_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), b"original").unwrap();

        let mut ns = MockNamespace::iphone();
        let roll = ns.add_roll("Roll", &["a.jpg"]);
        let file = ns.remote_file(&ns.child_id(&roll, "a.jpg").unwrap()).unwrap();
        let dest = LocalFolder::new(dir.path());

        let result = ns.copy_here(&dest, &file, CopyFlags::default());
        assert!(matches!(result, Err(CopyError::TransferError { .. })));
        assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), b"original");
    }

    #[test]
    fn test_clipboard_verbs() {
        let dir = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        let roll = ns.add_roll("Roll", &["a.jpg"]);
        ns.set_file_behavior(&roll, "a.jpg", MockFileBehavior::fallback_only());
        let file = ns.remote_file(&ns.child_id(&roll, "a.jpg").unwrap()).unwrap();
        let dest = LocalFolder::new(dir.path());

        ns.copy_here(&dest, &file, CopyFlags::NO_CONFIRMATION)
            .unwrap();
        assert!(!dir.path().join("a.jpg").exists());

        ns.invoke_verb(VerbTarget::Remote(&file), Verb::Copy).unwrap();
        ns.invoke_verb(VerbTarget::Local(&dest), Verb::Paste).unwrap();
        assert!(dir.path().join("a.jpg").exists());

        let stats = ns.stats();
        assert_eq!(stats.copy_verbs, 1);
        assert_eq!(stats.paste_verbs, 1);
    }

    #[test]
    fn test_paste_after_clear_fails() {
        let dir = TempDir::new().unwrap();
        let mut ns = MockNamespace::iphone();
        let roll = ns.add_roll("Roll", &["a.jpg"]);
        let file = ns.remote_file(&ns.child_id(&roll, "a.jpg").unwrap()).unwrap();
        let dest = LocalFolder::new(dir.path());

        ns.invoke_verb(VerbTarget::Remote(&file), Verb::Copy).unwrap();
        ns.clear_clipboard();

        let result = ns.invoke_verb(VerbTarget::Local(&dest), Verb::Paste);
        assert!(matches!(result, Err(CopyError::NothingToPaste)));
    }

    #[test]
    fn test_unsupported_verb_combination() {
        let mut ns = MockNamespace::iphone();
        let roll = ns.add_roll("Roll", &["a.jpg"]);
        let file = ns.remote_file(&ns.child_id(&roll, "a.jpg").unwrap()).unwrap();

        let result = ns.invoke_verb(VerbTarget::Remote(&file), Verb::Paste);
        assert!(matches!(result, Err(CopyError::UnsupportedVerb { .. })));
    }

    #[test]
    fn test_enumeration_failure() {
        let mut ns = MockNamespace::iphone();
        let roll = ns.add_roll("Broken", &["a.jpg"]);
        ns.fail_enumeration_of(&roll);

        let result = ns.enumerate_children(&ns.remote_folder(&roll).unwrap());
        assert!(matches!(result, Err(CopyError::EnumerationError { .. })));
    }

    #[test]
    fn test_generated_namespace() {
        let ns = MockNamespace::generated(3, 4, 1);
        assert_eq!(ns.file_count(), 12);

        let storage = ns.remote_folder(STORAGE_ID).unwrap();
        let rolls = ns.enumerate_children(&storage).unwrap();
        assert_eq!(rolls.len(), 3);
        assert_eq!(rolls[0].name(), "100APPLE");

        let first_roll = rolls[0].clone().into_folder().unwrap();
        let last = ns.child_id(&first_roll.object_id, "IMG_0004.JPG").unwrap();
        let first = ns.child_id(&first_roll.object_id, "IMG_0001.JPG").unwrap();
        assert_eq!(ns.objects[&last].behavior, MockFileBehavior::unreachable());
        assert_eq!(ns.objects[&first].behavior, MockFileBehavior::normal());
    }
}
