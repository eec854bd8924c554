//! Device interaction module
//!
//! This module provides access to a phone's file namespace.
//!
//! # Submodules
//!
//! - `traits` - The [`NamespaceAccessor`] abstraction and its value types
//! - `mounted` - Backend for devices mounted as a local directory tree
//! - `session` - Scoped acquisition and release of an accessor
//!
//! # Architecture
//!
//! The copy pipeline only talks to [`NamespaceAccessor`]. Both
//! [`MountedNamespace`] and the in-memory mock in `testdb` implement it,
//! allowing the pipeline to run against either.

pub mod mounted;
pub mod session;
pub mod traits;

pub use mounted::{clear_system_clipboard, MountedNamespace};
pub use session::Session;
pub use traits::{
    CopyFlags, LocalFolder, NamespaceAccessor, RemoteEntry, RemoteFile, RemoteFolder, Verb,
    VerbTarget,
};
