//! ## Overview
//!
//! One sync pass reconciles the catalog's selected tracks against the
//! device: it lists what is already there, copies what is missing,
//! prunes managed files that fell out of the selection, and delivers the
//! playlists as M3U files. Foreign files on the device are left alone.
//!
//! The adb and FTP modes run that reconciliation file by file through a
//! [`Transport`]; rsync mode hands copy and pruning to a single batch
//! invocation and only delivers playlists itself.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;

use sqlx::SqlitePool;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use core_library::models::Track;
use core_library::repositories::{
    PlaylistRepository, SettingsRepository, SqlitePlaylistRepository, SqliteSettingsRepository,
    SqliteTrackRepository, TrackRepository,
};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};

use crate::error::SyncError;
use crate::playlist::{self, RenderedPlaylist};
use crate::settings::{SyncMode, SyncSettings};
use crate::transport::adb::AdbTransport;
use crate::transport::ftp::FtpTransport;
use crate::transport::rsync::{self, RsyncTransport};
use crate::transport::Transport;

/// Emits sync progress both as tracing output and as bus events, so the
/// blocking worker can publish without touching the async runtime.
#[derive(Clone)]
pub struct SyncLogger {
    events: EventBus,
}

impl SyncLogger {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.events
            .emit(CoreEvent::Sync(SyncEvent::Log { message }))
            .ok();
    }
}

pub struct Syncer {
    pool: SqlitePool,
    events: EventBus,
}

impl Syncer {
    pub fn new(pool: SqlitePool, events: EventBus) -> Self {
        Self { pool, events }
    }

    /// Runs one full sync pass against the configured destination.
    pub async fn run(&self) -> Result<(), SyncError> {
        self.events.emit(CoreEvent::Sync(SyncEvent::Started)).ok();
        let result = self.execute().await;
        match &result {
            Ok(()) => {
                self.events.emit(CoreEvent::Sync(SyncEvent::Completed)).ok();
            }
            Err(e) => {
                warn!(error = %e, "sync failed");
                self.events
                    .emit(CoreEvent::Sync(SyncEvent::Failed {
                        error: e.to_string(),
                    }))
                    .ok();
            }
        }
        result
    }

    async fn execute(&self) -> Result<(), SyncError> {
        let settings_repo = SqliteSettingsRepository::new(self.pool.clone());
        let settings = SyncSettings::from_map(&settings_repo.all().await?)?;

        let tracks = SqliteTrackRepository::new(self.pool.clone()).all().await?;
        let playlists = SqlitePlaylistRepository::new(self.pool.clone())
            .all_with_tracks()
            .await?;
        let playlists =
            playlist::render_all(playlists.into_iter().map(|(p, t)| (p.name, t)).collect());

        let logger = SyncLogger::new(self.events.clone());
        tokio::task::spawn_blocking(move || run_pass(settings, tracks, playlists, &logger))
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?
    }
}

fn run_pass(
    settings: SyncSettings,
    tracks: Vec<Track>,
    playlists: Vec<RenderedPlaylist>,
    logger: &SyncLogger,
) -> Result<(), SyncError> {
    match settings.mode {
        SyncMode::Adb => {
            let mut transport = AdbTransport::new(settings.dest.clone());
            reconcile(&mut transport, &tracks, &settings.target_exts, logger)?;
            deliver_playlists(&mut transport, &playlists, logger)
        }
        SyncMode::Ftp => {
            let mut transport = FtpTransport::connect(&settings.ftp, settings.dest.clone())?;
            reconcile(&mut transport, &tracks, &settings.target_exts, logger)?;
            deliver_playlists(&mut transport, &playlists, logger)
        }
        SyncMode::Rsync => {
            let selected: Vec<String> = selection(&tracks).into_keys().collect();
            rsync::run_batch(&settings, &selected, logger)?;
            let mut transport = RsyncTransport::new(&settings);
            deliver_playlists(&mut transport, &playlists, logger)
        }
    }
}

/// Tracks that should exist on the device, keyed by their normalized
/// destination-relative path. Tombstoned tracks stay in the selection so
/// a transient unmount does not prune their device copies; they just
/// cannot be copied until they reappear.
fn selection(tracks: &[Track]) -> HashMap<String, &Track> {
    tracks
        .iter()
        .filter(|t| t.sync)
        .filter_map(|t| {
            let rel = normalize_rel(&t.relative_path);
            if rel.is_empty() {
                None
            } else {
                Some((rel, t))
            }
        })
        .collect()
}

/// File-by-file reconciliation: copy selected tracks the device lacks,
/// then prune managed-extension files the selection no longer covers.
/// Per-file failures are logged and skipped; connection loss aborts.
pub fn reconcile(
    transport: &mut dyn Transport,
    tracks: &[Track],
    target_exts: &[String],
    logger: &SyncLogger,
) -> Result<(), SyncError> {
    let wanted = selection(tracks);
    let remote = collect_remote(transport, logger)?;

    let to_copy: Vec<(&String, &Track)> = wanted
        .iter()
        .filter(|(rel, track)| !remote.contains(*rel) && !track.missing)
        .map(|(rel, track)| (rel, *track))
        .collect();
    // The denominator is the whole selection, not just what needs copying.
    let total = wanted.len();
    for (index, (rel, track)) in to_copy.into_iter().enumerate() {
        logger.log(format!("[{}/{}] Copying: {}", index + 1, total, track.file_name));
        if let Err(e) = copy_one(transport, track, rel) {
            if e.is_fatal() {
                return Err(e);
            }
            logger.log(format!("Failed to copy {}: {e}", track.file_name));
        }
    }

    for rel in &remote {
        if !has_target_extension(rel, target_exts) || wanted.contains_key(rel) {
            continue;
        }
        logger.log(format!("Removing remote file: {rel}"));
        if let Err(e) = transport.remove(rel) {
            if e.is_fatal() {
                return Err(e);
            }
            logger.log(format!("Failed to remove {rel}: {e}"));
        }
    }
    Ok(())
}

fn copy_one(transport: &mut dyn Transport, track: &Track, rel: &str) -> Result<(), SyncError> {
    if let Some((parent, _)) = rel.rsplit_once('/') {
        transport.make_dir_all(parent)?;
    }
    transport.copy_in(Path::new(&track.file_path), rel)
}

/// Writes each rendered playlist to the destination root.
pub fn deliver_playlists(
    transport: &mut dyn Transport,
    playlists: &[RenderedPlaylist],
    logger: &SyncLogger,
) -> Result<(), SyncError> {
    for pl in playlists {
        let name = pl.file_name();
        logger.log(format!("Copying playlist: {name}"));
        let result = write_temp(&pl.content)
            .map_err(SyncError::from)
            .and_then(|tmp| transport.copy_in(tmp.path(), &name));
        if let Err(e) = result {
            if e.is_fatal() {
                return Err(e);
            }
            logger.log(format!("Failed to copy playlist {name}: {e}"));
        }
    }
    Ok(())
}

fn write_temp(content: &str) -> std::io::Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new()?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    Ok(tmp)
}

/// Flat set of every file under the destination root. A destination
/// that does not exist yet simply means nothing is there to reuse or
/// prune.
fn collect_remote(
    transport: &mut dyn Transport,
    logger: &SyncLogger,
) -> Result<BTreeSet<String>, SyncError> {
    let mut files = BTreeSet::new();
    match walk_remote(transport, "", &mut files) {
        Ok(()) => {}
        Err(SyncError::RemoteNotFound(path)) => {
            logger.log(format!("Remote directory not found, starting fresh: {path}"));
        }
        Err(e) => return Err(e),
    }
    Ok(files)
}

fn walk_remote(
    transport: &mut dyn Transport,
    rel: &str,
    files: &mut BTreeSet<String>,
) -> Result<(), SyncError> {
    let entries = transport.list(rel)?;
    for entry in entries {
        let child = if rel.is_empty() {
            entry.name.clone()
        } else {
            format!("{rel}/{}", entry.name)
        };
        if entry.is_dir {
            // A directory that vanishes mid-walk is treated as empty.
            match walk_remote(transport, &child, files) {
                Ok(()) | Err(SyncError::RemoteNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        } else {
            files.insert(child);
        }
    }
    Ok(())
}

fn normalize_rel(raw: &str) -> String {
    raw.replace('\\', "/").trim_start_matches('/').to_string()
}

fn has_target_extension(rel: &str, target_exts: &[String]) -> bool {
    let name = rel.rsplit('/').next().unwrap_or(rel);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let dotted = format!(".{}", ext.to_lowercase());
            target_exts.iter().any(|t| *t == dotted)
        }
        _ => false,
    }
}
