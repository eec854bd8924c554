//! Test Database Module
//!
//! In-memory device namespaces for exercising the copy engine without a phone
//! attached. Used by the unit tests and by the `simulate` CLI command.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use photo_roll_copier::testdb::{MockFileBehavior, MockNamespace};
//!
//! let mut device = MockNamespace::iphone();
//! let roll = device.add_roll("2024-01", &["IMG_0001.JPG", "IMG_0002.JPG"]);
//! device.set_file_behavior(&roll, "IMG_0002.JPG", MockFileBehavior::fallback_only());
//! ```

pub mod mock_device;

pub use mock_device::{
    sample_jpeg, FallbackBehavior, MockFileBehavior, MockNamespace, MockObject, MockStats,
    PrimaryBehavior, DEVICE_ID, ROOT_ID, STORAGE_ID,
};
