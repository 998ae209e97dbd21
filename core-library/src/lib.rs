//! # Catalog Library Module
//!
//! Persisted media catalog backed by SQLite.
//!
//! ## Overview
//!
//! This crate owns the catalog data model and its persistence:
//! - **Connection pooling** (`db`): WAL-mode SQLite with embedded migrations
//! - **Domain models** (`models`): tracks, playlists, settings rows, and the
//!   typed scan mutations applied by a reconciliation pass
//! - **Repositories** (`repositories`): `async_trait` data-access interfaces
//!   with SQLite implementations
//!
//! Scans never hard-delete a track; a file that disappears from disk is
//! tombstoned with `missing = true` so sync preferences and history survive a
//! transient unmount. Hard deletion is an explicit repository operation used
//! by the external CRUD layer.

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use models::{NewTrack, Playlist, PlaylistEntry, ScanMutation, Track, TrackPatch};
pub use repositories::{
    PlaylistRepository, SettingsRepository, SqlitePlaylistRepository, SqliteSettingsRepository,
    SqliteTrackRepository, TrackRepository,
};
