//! Domain models for the media catalog
//!
//! Rows map 1:1 onto the SQLite schema via `sqlx::FromRow`. The scan pass
//! communicates its catalog changes as [`ScanMutation`] values so the whole
//! pass can be applied inside one transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One known media file.
///
/// `file_path` is the unique key. `relative_path` is derived from the
/// configured scan roots (suffix starting at the root's parent directory,
/// canonical `/` separator) and doubles as the remote-relative path during a
/// device sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Track {
    /// Row identifier
    pub id: i64,
    /// Absolute source path (unique)
    pub file_path: String,
    /// Root-independent path, leading `/`, canonical separator
    pub relative_path: String,
    /// File name without extension
    pub file_name: String,
    /// Track title
    pub title: Option<String>,
    /// Track artist
    pub artist: Option<String>,
    /// Album name
    pub album: Option<String>,
    /// Album artist (for compilations)
    pub album_artist: Option<String>,
    /// Composer
    pub composer: Option<String>,
    /// Track number, rendered `"3"` or `"3/12"`
    pub track_number: Option<String>,
    /// Duration in whole seconds
    pub duration: Option<i64>,
    /// Container codec (`mp3`, `mp4`)
    pub codec: Option<String>,
    /// Free-text status marker (`"!"` = no tag header, `"Error"` = extraction failed)
    pub status: Option<String>,
    /// Include this track in device sync
    pub sync: bool,
    /// Tombstone: file not observed by the latest scan
    pub missing: bool,
    /// Last observed modification time (unix seconds)
    pub mtime: i64,
    /// When the track was first cataloged
    pub added_at: DateTime<Utc>,
}

/// Metadata fields extracted from a file, applied field by field.
///
/// An unset field means "nothing extracted" and overwrites the stored value
/// with `NULL` on a metadata refresh; a path-only rewrite never touches these
/// fields at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPatch {
    /// File name without extension (always derivable)
    pub file_name: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub composer: Option<String>,
    pub track_number: Option<String>,
    pub duration: Option<i64>,
    pub codec: Option<String>,
    /// Extraction status marker; `None` means a clean extraction
    pub status: Option<String>,
}

/// A track to insert, produced by the scanner for a newly observed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub file_path: String,
    pub relative_path: String,
    pub mtime: i64,
    pub added_at: DateTime<Utc>,
    pub patch: TrackPatch,
}

/// One catalog change computed by a scan pass.
///
/// The full mutation list for a pass is applied in a single transaction, so a
/// crashed pass leaves the catalog at its previous commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMutation {
    /// First observation of a path
    Insert(NewTrack),
    /// Modification time changed: re-extracted metadata overwrites the
    /// display fields, the status marker is cleared or replaced, and the
    /// relative path and mtime are updated
    Refresh {
        file_path: String,
        relative_path: String,
        mtime: i64,
        patch: TrackPatch,
    },
    /// Root configuration changed but the bytes did not: only the relative
    /// path is rewritten, metadata is left untouched
    RewritePath {
        file_path: String,
        relative_path: String,
    },
    /// Path reappeared after being tombstoned
    ClearMissing { file_path: String },
    /// Path was not observed by this pass
    MarkMissing { file_path: String },
}

/// A named, ordered collection of tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
}

/// Membership row linking a track into a playlist at a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlaylistEntry {
    pub id: i64,
    pub playlist_id: i64,
    pub track_id: i64,
    pub position: i64,
}
