//! Photo Roll Copier Library
//!
//! Incrementally copies photo rolls (the top-level folders of a phone's
//! internal storage) into a local directory. Files already present at the
//! destination are skipped, so re-running after an interruption only copies
//! what is missing.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`core`] - Configuration, error handling, the copy engine, the folder
//!   synchronizer, the ETA estimator and the run orchestrator
//! - [`device`] - The namespace abstraction and the mounted-directory backend
//! - [`cli`] - Command-line interface (only used by the binary)
//! - [`testdb`] - In-memory mock device for tests and simulation
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use photo_roll_copier::core::orchestrator::{RunOptions, RunOrchestrator};
//! use photo_roll_copier::device::{MountedNamespace, Session};
//!
//! fn main() -> anyhow::Result<()> {
//!     let namespace = MountedNamespace::open("/run/user/1000/gvfs")?;
//!     let session = Session::acquire(namespace);
//!
//!     let options = RunOptions::new("/home/me/Desktop/photo_iphone");
//!     let result = RunOrchestrator::new(session.accessor(), options).run();
//!
//!     println!("{} files copied", result.files_copied);
//!     Ok(())
//! }
//! ```
//!
//! # Testing Without a Device
//!
//! ```rust
//! use photo_roll_copier::core::copier::CopyTimings;
//! use photo_roll_copier::core::orchestrator::{RunOptions, RunOrchestrator};
//! use photo_roll_copier::testdb::MockNamespace;
//!
//! let dest = std::env::temp_dir().join("photo_roll_copier_doctest");
//! let device = MockNamespace::generated(2, 5, 0);
//! let options = RunOptions {
//!     timings: CopyTimings::immediate(),
//!     ..RunOptions::new(&dest)
//! };
//!
//! let result = RunOrchestrator::new(&device, options).run();
//! assert_eq!(result.folders_processed(), 2);
//! # let _ = std::fs::remove_dir_all(&dest);
//! ```

pub mod cli;
pub mod core;
pub mod device;
pub mod testdb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
