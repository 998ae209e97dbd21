//! # Metadata Extraction Module
//!
//! Reads audio tags from media files via the `lofty` crate and maps them
//! onto the catalog's [`TrackPatch`](core_library::TrackPatch) update
//! structure.
//!
//! Extraction never propagates an error to the caller: one unreadable file
//! must not abort a scan of thousands, so failures degrade to a status
//! marker on the patch instead.

pub mod error;
pub mod extractor;

pub use error::{MetadataError, Result};
pub use extractor::{extract, STATUS_ERROR, STATUS_NO_TAGS};
