//! Core functionality module
//!
//! This module contains the copy logic itself: configuration, error types,
//! the per-file copy engine, the incremental folder synchronizer, the ETA
//! estimator and the run orchestrator that ties them together.
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and destination resolution
//! - `error` - Error types and result aliases
//! - `copier` - Single-file copy with primary and clipboard fallback paths
//! - `sync` - Skip-existing synchronization of one roll
//! - `eta` - Statistical time-remaining estimate
//! - `orchestrator` - Device discovery and the run over all rolls

pub mod config;
pub mod copier;
pub mod error;
pub mod eta;
pub mod orchestrator;
pub mod sync;
