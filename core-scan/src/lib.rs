//! # Library Scan Module
//!
//! Walks the configured music directories, extracts metadata, and reconciles
//! the result against the persisted catalog.
//!
//! ## Overview
//!
//! - **Walker** (`walker`): eager recursive traversal with symlink following
//!   and directory-name exclusion pruning
//! - **Settings** (`settings`): immutable per-pass scan configuration parsed
//!   from the settings store
//! - **Progress** (`progress`): bounded progress emission on the event bus
//! - **Scanner** (`scanner`): the reconciliation pass itself; computes the
//!   minimal add/update/tombstone mutation set and applies it in one
//!   catalog transaction
//!
//! A scan never hard-deletes: files that disappear are tombstoned so a
//! transient unmount cannot discard sync preferences or history.

pub mod error;
pub mod progress;
pub mod scanner;
pub mod settings;
pub mod walker;

pub use error::{Result, ScanError};
pub use progress::ProgressReporter;
pub use scanner::{ScanSummary, Scanner};
pub use settings::ScanSettings;
pub use walker::{walk, WalkedFile};
