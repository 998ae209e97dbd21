//! End-to-end reconciliation behavior against a fake in-memory device.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use chrono::Utc;

use core_library::db::create_test_pool;
use core_library::models::{NewTrack, Track, TrackPatch};
use core_library::repositories::{
    PlaylistRepository, SettingsRepository, SqlitePlaylistRepository, SqliteSettingsRepository,
    SqliteTrackRepository, TrackRepository,
};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use core_sync::syncer::{deliver_playlists, reconcile, SyncLogger, Syncer};
use core_sync::{RemoteEntry, RenderedPlaylist, SyncError, Transport};

/// Device stand-in that keeps the remote tree in memory and records
/// every operation the pass performs.
#[derive(Default)]
struct MemoryTransport {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
    root_exists: bool,
    fail_copy: HashSet<String>,
    copied: Vec<String>,
    removed: Vec<String>,
    playlist_bodies: BTreeMap<String, String>,
}

impl MemoryTransport {
    fn with_root() -> Self {
        Self {
            root_exists: true,
            ..Self::default()
        }
    }

    fn seed_file(&mut self, rel: &str) {
        self.root_exists = true;
        self.files.insert(rel.to_string());
        if let Some((dir, _)) = rel.rsplit_once('/') {
            let mut prefix = String::new();
            for part in dir.split('/') {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(part);
                self.dirs.insert(prefix.clone());
            }
        }
    }
}

impl Transport for MemoryTransport {
    fn copy_in(&mut self, local: &Path, remote_rel: &str) -> Result<(), SyncError> {
        if self.fail_copy.contains(remote_rel) {
            return Err(SyncError::Transport(format!("simulated failure: {remote_rel}")));
        }
        if remote_rel.ends_with(".m3u") {
            let body = std::fs::read_to_string(local)?;
            self.playlist_bodies.insert(remote_rel.to_string(), body);
        }
        self.root_exists = true;
        self.files.insert(remote_rel.to_string());
        self.copied.push(remote_rel.to_string());
        Ok(())
    }

    fn remove(&mut self, remote_rel: &str) -> Result<(), SyncError> {
        self.files.remove(remote_rel);
        self.removed.push(remote_rel.to_string());
        Ok(())
    }

    fn make_dir_all(&mut self, remote_rel: &str) -> Result<(), SyncError> {
        self.root_exists = true;
        let mut prefix = String::new();
        for part in remote_rel.split('/').filter(|p| !p.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            self.dirs.insert(prefix.clone());
        }
        Ok(())
    }

    fn list(&mut self, remote_rel: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        if !self.root_exists {
            return Err(SyncError::RemoteNotFound(remote_rel.to_string()));
        }
        let prefix = if remote_rel.is_empty() {
            String::new()
        } else if self.dirs.contains(remote_rel) {
            format!("{remote_rel}/")
        } else {
            return Err(SyncError::RemoteNotFound(remote_rel.to_string()));
        };
        let mut entries = Vec::new();
        let mut seen = BTreeSet::new();
        for path in self.files.iter().chain(self.dirs.iter()) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let head = rest.split('/').next().unwrap().to_string();
            if seen.insert(head.clone()) {
                let full = format!("{prefix}{head}");
                entries.push(RemoteEntry {
                    is_dir: self.dirs.contains(&full),
                    name: head,
                });
            }
        }
        Ok(entries)
    }
}

fn track(rel: &str, sync: bool, missing: bool) -> Track {
    let file_name = rel.rsplit('/').next().unwrap().to_string();
    Track {
        id: 0,
        file_path: format!("/music{rel}"),
        relative_path: rel.to_string(),
        file_name,
        title: None,
        artist: None,
        album: None,
        album_artist: None,
        composer: None,
        track_number: None,
        duration: None,
        codec: None,
        status: None,
        sync,
        missing,
        mtime: 0,
        added_at: Utc::now(),
    }
}

fn logger() -> SyncLogger {
    SyncLogger::new(EventBus::default())
}

#[test]
fn copies_only_selected_present_tracks() {
    let mut device = MemoryTransport::with_root();
    let tracks = vec![
        track("/Collection/keep.mp3", true, false),
        track("/Collection/skip.mp3", false, false),
        track("/Collection/gone.mp3", true, true),
    ];
    reconcile(&mut device, &tracks, &[".mp3".into()], &logger()).unwrap();
    assert_eq!(device.copied, vec!["Collection/keep.mp3"]);
    assert!(device.dirs.contains("Collection"));
}

#[test]
fn prunes_managed_extensions_but_keeps_foreign_files() {
    let mut device = MemoryTransport::default();
    device.seed_file("Collection/old.mp3");
    device.seed_file("Collection/keep.txt");
    device.seed_file("Collection/cover.jpg");
    let tracks = vec![track("/Collection/new.mp3", true, false)];
    reconcile(&mut device, &tracks, &[".mp3".into()], &logger()).unwrap();
    assert_eq!(device.removed, vec!["Collection/old.mp3"]);
    assert!(device.files.contains("Collection/keep.txt"));
    assert!(device.files.contains("Collection/cover.jpg"));
    assert!(device.files.contains("Collection/new.mp3"));
}

#[test]
fn tombstoned_track_keeps_its_device_copy() {
    let mut device = MemoryTransport::default();
    device.seed_file("Collection/unplugged.mp3");
    let tracks = vec![track("/Collection/unplugged.mp3", true, true)];
    reconcile(&mut device, &tracks, &[".mp3".into()], &logger()).unwrap();
    assert!(device.copied.is_empty());
    assert!(device.removed.is_empty());
    assert!(device.files.contains("Collection/unplugged.mp3"));
}

#[test]
fn already_present_files_are_not_recopied() {
    let mut device = MemoryTransport::default();
    device.seed_file("Collection/sub/song.mp3");
    let tracks = vec![track("/Collection/sub/song.mp3", true, false)];
    reconcile(&mut device, &tracks, &[".mp3".into()], &logger()).unwrap();
    assert!(device.copied.is_empty());
    assert!(device.removed.is_empty());
}

#[test]
fn missing_destination_means_everything_gets_copied() {
    let mut device = MemoryTransport::default();
    let tracks = vec![
        track("/A/one.mp3", true, false),
        track("/B/deep/two.mp3", true, false),
    ];
    reconcile(&mut device, &tracks, &[".mp3".into()], &logger()).unwrap();
    let copied: BTreeSet<_> = device.copied.iter().cloned().collect();
    assert_eq!(
        copied,
        BTreeSet::from(["A/one.mp3".to_string(), "B/deep/two.mp3".to_string()])
    );
}

#[test]
fn one_failed_copy_does_not_abort_the_pass() {
    let mut device = MemoryTransport::with_root();
    device.fail_copy.insert("A/bad.mp3".to_string());
    let tracks = vec![
        track("/A/bad.mp3", true, false),
        track("/A/good.mp3", true, false),
    ];
    reconcile(&mut device, &tracks, &[".mp3".into()], &logger()).unwrap();
    assert!(device.files.contains("A/good.mp3"));
    assert!(!device.files.contains("A/bad.mp3"));
}

#[test]
fn copy_log_counts_against_the_full_selection() {
    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let logger = SyncLogger::new(bus);

    let mut device = MemoryTransport::default();
    device.seed_file("Collection/already.mp3");
    let tracks = vec![
        track("/Collection/already.mp3", true, false),
        track("/Collection/fresh.mp3", true, false),
    ];
    reconcile(&mut device, &tracks, &[".mp3".into()], &logger).unwrap();

    let mut logs = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CoreEvent::Sync(SyncEvent::Log { message }) = event {
            logs.push(message);
        }
    }
    assert!(logs.iter().any(|m| m == "[1/2] Copying: fresh.mp3"));
}

#[test]
fn playlists_land_at_the_destination_root() {
    let mut device = MemoryTransport::with_root();
    let playlists = vec![RenderedPlaylist {
        name: "Road Trip".into(),
        content: "#EXTM3U\n\n#EXTINF:-1,Alpha\nCollection/a.mp3\n\n".into(),
    }];
    deliver_playlists(&mut device, &playlists, &logger()).unwrap();
    assert_eq!(
        device.playlist_bodies.get("Road Trip.m3u").map(String::as_str),
        Some("#EXTM3U\n\n#EXTINF:-1,Alpha\nCollection/a.mp3\n\n")
    );
}

#[tokio::test]
async fn unknown_mode_fails_the_pass_and_emits_failed() {
    let pool = create_test_pool().await.unwrap();
    let settings = SqliteSettingsRepository::new(pool.clone());
    settings.set("sync_mode", "teleport").await.unwrap();
    settings.set("sync_dest", "/dev/null").await.unwrap();

    let events = EventBus::default();
    let mut rx = events.subscribe();
    let result = Syncer::new(pool, events).run().await;
    assert!(matches!(result, Err(SyncError::UnknownMode(m)) if m == "teleport"));

    assert!(matches!(rx.try_recv(), Ok(CoreEvent::Sync(SyncEvent::Started))));
    assert!(matches!(
        rx.try_recv(),
        Ok(CoreEvent::Sync(SyncEvent::Failed { .. }))
    ));
}

#[tokio::test]
async fn rsync_mode_without_selection_still_delivers_playlists_locally() {
    let pool = create_test_pool().await.unwrap();
    let dest = tempfile::tempdir().unwrap();

    let settings = SqliteSettingsRepository::new(pool.clone());
    settings.set("sync_mode", "rsync").await.unwrap();
    settings
        .set("sync_dest", dest.path().to_str().unwrap())
        .await
        .unwrap();

    let tracks = SqliteTrackRepository::new(pool.clone());
    let id = tracks
        .insert(&NewTrack {
            file_path: "/music/Collection/a.mp3".into(),
            relative_path: "/Collection/a.mp3".into(),
            mtime: 0,
            added_at: Utc::now(),
            patch: TrackPatch {
                file_name: "a.mp3".into(),
                title: Some("Alpha".into()),
                ..TrackPatch::default()
            },
        })
        .await
        .unwrap();

    let playlists = SqlitePlaylistRepository::new(pool.clone());
    let playlist = playlists.create("Road Trip").await.unwrap();
    playlists.add_track(playlist.id, id, 0).await.unwrap();

    Syncer::new(pool, EventBus::default()).run().await.unwrap();

    let body = std::fs::read_to_string(dest.path().join("Road Trip.m3u")).unwrap();
    assert_eq!(body, "#EXTM3U\n\n#EXTINF:-1,Alpha\nCollection/a.mp3\n\n");
}
