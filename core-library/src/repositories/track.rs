//! Track repository trait and implementation

use crate::error::Result;
use crate::models::{NewTrack, ScanMutation, Track, TrackPatch};
use async_trait::async_trait;
use sqlx::{query, query_as, Sqlite, SqlitePool, Transaction};
use tracing::debug;

/// Track repository interface for data access operations
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Find a track by its absolute file path
    ///
    /// # Returns
    /// - `Ok(Some(track))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if a database error occurs
    async fn find_by_path(&self, file_path: &str) -> Result<Option<Track>>;

    /// Load every track in the catalog.
    ///
    /// Library sizes are assumed to fit in memory; the scan and sync passes
    /// need the full set to compute their diffs.
    async fn all(&self) -> Result<Vec<Track>>;

    /// Insert a single track outside a scan pass
    async fn insert(&self, track: &NewTrack) -> Result<i64>;

    /// Toggle the "include in device sync" flag
    ///
    /// # Returns
    /// - `Ok(true)` if the track existed and was updated
    /// - `Ok(false)` if no track has this id
    async fn set_sync(&self, id: i64, sync: bool) -> Result<bool>;

    /// Hard-delete a track by id (explicit catalog operation; scans only
    /// ever tombstone)
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Hard-delete every tombstoned track, returning the number removed
    async fn delete_missing(&self) -> Result<u64>;

    /// Apply the full mutation list of one scan pass in a single transaction
    async fn apply_scan_mutations(&self, mutations: &[ScanMutation]) -> Result<()>;

    /// Count total tracks
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of TrackRepository
pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    /// Create a new SQLite track repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert_in_tx(tx: &mut Transaction<'_, Sqlite>, track: &NewTrack) -> Result<i64> {
        let result = Self::insert_query(track).execute(&mut **tx).await?;
        Ok(result.last_insert_rowid())
    }

    fn insert_query(
        track: &NewTrack,
    ) -> sqlx::query::Query<'_, Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
        query(
            r#"
            INSERT INTO tracks (
                file_path, relative_path, file_name,
                title, artist, album, album_artist, composer,
                track_number, duration, codec, status,
                sync, missing, mtime, added_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
            "#,
        )
        .bind(&track.file_path)
        .bind(&track.relative_path)
        .bind(&track.patch.file_name)
        .bind(&track.patch.title)
        .bind(&track.patch.artist)
        .bind(&track.patch.album)
        .bind(&track.patch.album_artist)
        .bind(&track.patch.composer)
        .bind(&track.patch.track_number)
        .bind(track.patch.duration)
        .bind(&track.patch.codec)
        .bind(&track.patch.status)
        .bind(track.mtime)
        .bind(track.added_at)
    }

    async fn refresh_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        file_path: &str,
        relative_path: &str,
        mtime: i64,
        patch: &TrackPatch,
    ) -> Result<()> {
        query(
            r#"
            UPDATE tracks SET
                relative_path = ?, file_name = ?,
                title = ?, artist = ?, album = ?, album_artist = ?, composer = ?,
                track_number = ?, duration = ?, codec = ?, status = ?,
                mtime = ?, missing = 0
            WHERE file_path = ?
            "#,
        )
        .bind(relative_path)
        .bind(&patch.file_name)
        .bind(&patch.title)
        .bind(&patch.artist)
        .bind(&patch.album)
        .bind(&patch.album_artist)
        .bind(&patch.composer)
        .bind(&patch.track_number)
        .bind(patch.duration)
        .bind(&patch.codec)
        .bind(&patch.status)
        .bind(mtime)
        .bind(file_path)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn find_by_path(&self, file_path: &str) -> Result<Option<Track>> {
        let track = query_as::<_, Track>("SELECT * FROM tracks WHERE file_path = ?")
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await?;

        Ok(track)
    }

    async fn all(&self) -> Result<Vec<Track>> {
        let tracks = query_as::<_, Track>("SELECT * FROM tracks ORDER BY file_path")
            .fetch_all(&self.pool)
            .await?;

        Ok(tracks)
    }

    async fn insert(&self, track: &NewTrack) -> Result<i64> {
        let result = Self::insert_query(track).execute(&self.pool).await?;
        Ok(result.last_insert_rowid())
    }

    async fn set_sync(&self, id: i64, sync: bool) -> Result<bool> {
        let result = query("UPDATE tracks SET sync = ? WHERE id = ?")
            .bind(sync)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = query("DELETE FROM tracks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_missing(&self) -> Result<u64> {
        let result = query("DELETE FROM tracks WHERE missing = 1")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn apply_scan_mutations(&self, mutations: &[ScanMutation]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for mutation in mutations {
            match mutation {
                ScanMutation::Insert(track) => {
                    Self::insert_in_tx(&mut tx, track).await?;
                }
                ScanMutation::Refresh {
                    file_path,
                    relative_path,
                    mtime,
                    patch,
                } => {
                    Self::refresh_in_tx(&mut tx, file_path, relative_path, *mtime, patch).await?;
                }
                ScanMutation::RewritePath {
                    file_path,
                    relative_path,
                } => {
                    query("UPDATE tracks SET relative_path = ?, missing = 0 WHERE file_path = ?")
                        .bind(relative_path)
                        .bind(file_path)
                        .execute(&mut *tx)
                        .await?;
                }
                ScanMutation::ClearMissing { file_path } => {
                    query("UPDATE tracks SET missing = 0 WHERE file_path = ?")
                        .bind(file_path)
                        .execute(&mut *tx)
                        .await?;
                }
                ScanMutation::MarkMissing { file_path } => {
                    query("UPDATE tracks SET missing = 1 WHERE file_path = ?")
                        .bind(file_path)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        debug!(mutations = mutations.len(), "Scan mutations committed");

        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
