//! Workspace umbrella crate.
//!
//! Re-exports the individual workspace crates so host applications can
//! depend on `audiosync` and reach the scanner, syncer, catalog, and
//! runtime pieces without wiring each crate individually.

pub use core_library as library;
pub use core_metadata as metadata;
pub use core_runtime as runtime;
pub use core_scan as scan;
pub use core_sync as sync;
