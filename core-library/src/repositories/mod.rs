//! Repository traits and SQLite implementations.

pub mod playlist;
pub mod settings;
pub mod track;

pub use playlist::{PlaylistRepository, SqlitePlaylistRepository};
pub use settings::{SettingsRepository, SqliteSettingsRepository};
pub use track::{SqliteTrackRepository, TrackRepository};
