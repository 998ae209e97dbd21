//! Library scanner reconciliation
//!
//! One scan pass diffs the materialized on-disk file list against the
//! persisted catalog and applies the minimal mutation set:
//!
//! 1. Load scan settings; no configured roots ends the pass early.
//! 2. Walk the roots on a worker thread (blocking traversal).
//! 3. Load all catalog rows keyed by absolute path.
//! 4. Per walked file: new path inserts; a changed mtime re-extracts and
//!    refreshes; a changed relative path with an unchanged mtime rewrites
//!    the path only (the bytes did not change, so re-extraction would be
//!    wasted work at scale); an unchanged file at most clears its tombstone.
//! 5. Any row not observed on disk is tombstoned, never deleted.
//! 6. The whole mutation list commits in one catalog transaction.
//!
//! Progress and per-file log lines flow through the event bus; the summary
//! counts are always reported, even when individual files failed.

use crate::error::{Result, ScanError};
use crate::progress::ProgressReporter;
use crate::settings::ScanSettings;
use crate::walker::{self, WalkedFile};
use chrono::Utc;
use core_library::{
    NewTrack, ScanMutation, SettingsRepository, SqliteSettingsRepository, SqliteTrackRepository,
    Track, TrackRepository,
};
use core_runtime::{CoreEvent, EventBus, ScanEvent};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{info, warn};

/// Counts reported by a completed scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub added: u64,
    pub updated: u64,
    pub missing: u64,
}

/// Drives one library scan pass.
///
/// Holds no state between passes; a second invocation while one is in
/// flight is the caller's responsibility to prevent.
pub struct Scanner {
    pool: SqlitePool,
    events: EventBus,
}

impl Scanner {
    pub fn new(pool: SqlitePool, events: EventBus) -> Self {
        Self { pool, events }
    }

    /// Run one scan pass to completion.
    pub async fn run(&self) -> Result<ScanSummary> {
        info!("Scan started");
        self.emit(ScanEvent::Started);

        let settings_repo = SqliteSettingsRepository::new(self.pool.clone());
        let settings = ScanSettings::from_map(&settings_repo.all().await?);

        if settings.roots.is_empty() {
            warn!("No scan paths configured");
            self.log("No scan paths configured.");
            let summary = ScanSummary::default();
            self.emit(ScanEvent::Completed {
                added: 0,
                updated: 0,
                missing: 0,
            });
            return Ok(summary);
        }

        let mut progress = ProgressReporter::new(self.events.clone());
        progress.start();

        // Blocking traversal runs off the async loop.
        let walk_settings = settings.clone();
        let walked = tokio::task::spawn_blocking(move || {
            walker::walk(
                &walk_settings.roots,
                &walk_settings.extensions,
                &walk_settings.exclude_dirs,
            )
        })
        .await
        .map_err(|e| ScanError::Task(e.to_string()))?;

        // Overlapping roots observe the same file more than once; keep the
        // first observation so one pass yields one mutation per path.
        let mut seen_paths = HashSet::new();
        let walked: Vec<WalkedFile> = walked
            .into_iter()
            .filter(|f| seen_paths.insert(f.abs_path.clone()))
            .collect();

        let track_repo = SqliteTrackRepository::new(self.pool.clone());
        let existing: HashMap<String, Track> = track_repo
            .all()
            .await?
            .into_iter()
            .map(|t| (t.file_path.clone(), t))
            .collect();

        let mut mutations = Vec::new();
        let mut summary = ScanSummary::default();
        let total = walked.len();

        for (index, file) in walked.iter().enumerate() {
            if let Some(mutation) = self.reconcile_file(file, &existing).await? {
                match &mutation {
                    ScanMutation::Insert(track) => {
                        summary.added += 1;
                        self.log(&format!("New file added: {}", track.file_path));
                    }
                    ScanMutation::Refresh { file_path, .. } => {
                        summary.updated += 1;
                        self.log(&format!("File updated: {}", file_path));
                    }
                    ScanMutation::RewritePath { file_path, .. } => {
                        summary.updated += 1;
                        self.log(&format!("Relative path updated: {}", file_path));
                    }
                    _ => {}
                }
                mutations.push(mutation);
            }
            progress.update(index + 1, total);
        }

        // Tombstone rows whose path was not observed on disk.
        let observed: HashSet<String> = walked
            .iter()
            .map(|f| f.abs_path.to_string_lossy().into_owned())
            .collect();
        for (file_path, track) in &existing {
            if !observed.contains(file_path) && !track.missing {
                summary.missing += 1;
                self.log(&format!("File missing: {}", file_path));
                mutations.push(ScanMutation::MarkMissing {
                    file_path: file_path.clone(),
                });
            }
        }

        track_repo.apply_scan_mutations(&mutations).await?;
        progress.finish();

        let message = format!(
            "Scan complete. Added: {}, Updated: {}, Missing: {}",
            summary.added, summary.updated, summary.missing
        );
        info!("{}", message);
        self.log(&message);
        self.emit(ScanEvent::Completed {
            added: summary.added,
            updated: summary.updated,
            missing: summary.missing,
        });

        Ok(summary)
    }

    /// Decide the mutation for one walked file, or `None` when nothing
    /// needs to change.
    async fn reconcile_file(
        &self,
        file: &WalkedFile,
        existing: &HashMap<String, Track>,
    ) -> Result<Option<ScanMutation>> {
        let file_path = file.abs_path.to_string_lossy().into_owned();

        let Some(track) = existing.get(&file_path) else {
            let patch = extract_off_loop(file.abs_path.clone()).await?;
            return Ok(Some(ScanMutation::Insert(NewTrack {
                file_path,
                relative_path: file.relative_path.clone(),
                mtime: file.mtime,
                added_at: Utc::now(),
                patch,
            })));
        };

        if track.mtime != file.mtime {
            let patch = extract_off_loop(file.abs_path.clone()).await?;
            return Ok(Some(ScanMutation::Refresh {
                file_path,
                relative_path: file.relative_path.clone(),
                mtime: file.mtime,
                patch,
            }));
        }

        // Same bytes, different root configuration: rewrite the path only.
        if track.relative_path != file.relative_path {
            return Ok(Some(ScanMutation::RewritePath {
                file_path,
                relative_path: file.relative_path.clone(),
            }));
        }

        if track.missing {
            return Ok(Some(ScanMutation::ClearMissing { file_path }));
        }

        Ok(None)
    }

    fn emit(&self, event: ScanEvent) {
        self.events.emit(CoreEvent::Scan(event)).ok();
    }

    fn log(&self, message: &str) {
        self.emit(ScanEvent::Log {
            message: message.to_string(),
        });
    }
}

/// Metadata extraction is blocking file I/O; run it on a worker thread.
async fn extract_off_loop(path: PathBuf) -> Result<core_library::TrackPatch> {
    tokio::task::spawn_blocking(move || core_metadata::extract(&path))
        .await
        .map_err(|e| ScanError::Task(e.to_string()))
}
