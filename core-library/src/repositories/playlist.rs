//! Playlist repository trait and implementation

use crate::error::Result;
use crate::models::{Playlist, Track};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

/// Playlist repository interface for data access operations
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Find a playlist by its ID
    async fn find_by_id(&self, id: i64) -> Result<Option<Playlist>>;

    /// Create a playlist with the given name
    ///
    /// # Errors
    /// Returns error if a playlist with the same name already exists
    async fn create(&self, name: &str) -> Result<Playlist>;

    /// Delete a playlist by ID; entries are removed by cascade
    ///
    /// # Returns
    /// - `Ok(true)` if the playlist was deleted
    /// - `Ok(false)` if it was not found
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List all playlists
    async fn all(&self) -> Result<Vec<Playlist>>;

    /// Append or insert a track at a position
    async fn add_track(&self, playlist_id: i64, track_id: i64, position: i64) -> Result<()>;

    /// Remove a track from a playlist
    async fn remove_track(&self, playlist_id: i64, track_id: i64) -> Result<bool>;

    /// Tracks of one playlist, in position order
    async fn tracks(&self, playlist_id: i64) -> Result<Vec<Track>>;

    /// Every playlist with its ordered tracks, as consumed by a sync pass
    async fn all_with_tracks(&self) -> Result<Vec<(Playlist, Vec<Track>)>>;
}

/// SQLite implementation of PlaylistRepository
pub struct SqlitePlaylistRepository {
    pool: SqlitePool,
}

impl SqlitePlaylistRepository {
    /// Create a new SQLite playlist repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaylistRepository for SqlitePlaylistRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Playlist>> {
        let playlist = query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(playlist)
    }

    async fn create(&self, name: &str) -> Result<Playlist> {
        let result = query("INSERT INTO playlists (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(Playlist {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn all(&self) -> Result<Vec<Playlist>> {
        let playlists = query_as::<_, Playlist>("SELECT * FROM playlists ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(playlists)
    }

    async fn add_track(&self, playlist_id: i64, track_id: i64, position: i64) -> Result<()> {
        query("INSERT INTO playlist_entries (playlist_id, track_id, position) VALUES (?, ?, ?)")
            .bind(playlist_id)
            .bind(track_id)
            .bind(position)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn remove_track(&self, playlist_id: i64, track_id: i64) -> Result<bool> {
        let result = query("DELETE FROM playlist_entries WHERE playlist_id = ? AND track_id = ?")
            .bind(playlist_id)
            .bind(track_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn tracks(&self, playlist_id: i64) -> Result<Vec<Track>> {
        let tracks = query_as::<_, Track>(
            r#"
            SELECT t.* FROM tracks t
            JOIN playlist_entries pe ON pe.track_id = t.id
            WHERE pe.playlist_id = ?
            ORDER BY pe.position
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tracks)
    }

    async fn all_with_tracks(&self) -> Result<Vec<(Playlist, Vec<Track>)>> {
        let playlists = self.all().await?;
        let mut result = Vec::with_capacity(playlists.len());

        for playlist in playlists {
            let tracks = self.tracks(playlist.id).await?;
            result.push((playlist, tracks));
        }

        Ok(result)
    }
}
