//! Integration tests for the catalog repositories against an in-memory
//! SQLite database.

use chrono::Utc;
use core_library::{
    create_test_pool, NewTrack, PlaylistRepository, ScanMutation, SettingsRepository,
    SqlitePlaylistRepository, SqliteSettingsRepository, SqliteTrackRepository, TrackPatch,
    TrackRepository,
};

fn new_track(file_path: &str, relative_path: &str, title: Option<&str>) -> NewTrack {
    let stem = std::path::Path::new(file_path)
        .file_stem()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    NewTrack {
        file_path: file_path.to_string(),
        relative_path: relative_path.to_string(),
        mtime: 1_700_000_000,
        added_at: Utc::now(),
        patch: TrackPatch {
            file_name: stem,
            title: title.map(str::to_string),
            codec: Some("mp3".to_string()),
            ..TrackPatch::default()
        },
    }
}

#[tokio::test]
async fn test_insert_and_find_by_path() {
    let pool = create_test_pool().await.unwrap();
    let repo = SqliteTrackRepository::new(pool);

    let id = repo
        .insert(&new_track("/lib/A/1.mp3", "/A/1.mp3", Some("X")))
        .await
        .unwrap();
    assert!(id > 0);

    let track = repo.find_by_path("/lib/A/1.mp3").await.unwrap().unwrap();
    assert_eq!(track.title.as_deref(), Some("X"));
    assert_eq!(track.relative_path, "/A/1.mp3");
    assert!(!track.sync);
    assert!(!track.missing);

    assert!(repo.find_by_path("/lib/A/2.mp3").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_path_is_rejected() {
    let pool = create_test_pool().await.unwrap();
    let repo = SqliteTrackRepository::new(pool);

    repo.insert(&new_track("/lib/A/1.mp3", "/A/1.mp3", None))
        .await
        .unwrap();
    let result = repo.insert(&new_track("/lib/A/1.mp3", "/A/1.mp3", None)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_set_sync_and_hard_delete() {
    let pool = create_test_pool().await.unwrap();
    let repo = SqliteTrackRepository::new(pool);

    let id = repo
        .insert(&new_track("/lib/A/1.mp3", "/A/1.mp3", None))
        .await
        .unwrap();

    assert!(repo.set_sync(id, true).await.unwrap());
    assert!(repo.find_by_path("/lib/A/1.mp3").await.unwrap().unwrap().sync);

    assert!(!repo.set_sync(id + 100, true).await.unwrap());

    assert!(repo.delete(id).await.unwrap());
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_scan_mutations_commit_in_one_pass() {
    let pool = create_test_pool().await.unwrap();
    let repo = SqliteTrackRepository::new(pool);

    repo.insert(&new_track("/lib/A/old.mp3", "/A/old.mp3", Some("Old")))
        .await
        .unwrap();

    let mutations = vec![
        ScanMutation::Insert(new_track("/lib/B/new.mp3", "/B/new.mp3", Some("New"))),
        ScanMutation::Refresh {
            file_path: "/lib/A/old.mp3".to_string(),
            relative_path: "/A/old.mp3".to_string(),
            mtime: 1_700_000_999,
            patch: TrackPatch {
                file_name: "old".to_string(),
                title: Some("Renamed".to_string()),
                codec: Some("mp3".to_string()),
                ..TrackPatch::default()
            },
        },
    ];

    repo.apply_scan_mutations(&mutations).await.unwrap();

    let old = repo.find_by_path("/lib/A/old.mp3").await.unwrap().unwrap();
    assert_eq!(old.title.as_deref(), Some("Renamed"));
    assert_eq!(old.mtime, 1_700_000_999);

    let new = repo.find_by_path("/lib/B/new.mp3").await.unwrap().unwrap();
    assert_eq!(new.title.as_deref(), Some("New"));
}

#[tokio::test]
async fn test_tombstone_preserves_fields_and_delete_missing_removes() {
    let pool = create_test_pool().await.unwrap();
    let repo = SqliteTrackRepository::new(pool);

    let id = repo
        .insert(&new_track("/lib/A/1.mp3", "/A/1.mp3", Some("X")))
        .await
        .unwrap();
    repo.set_sync(id, true).await.unwrap();

    repo.apply_scan_mutations(&[ScanMutation::MarkMissing {
        file_path: "/lib/A/1.mp3".to_string(),
    }])
    .await
    .unwrap();

    let track = repo.find_by_path("/lib/A/1.mp3").await.unwrap().unwrap();
    assert!(track.missing);
    // Tombstoning keeps everything else.
    assert!(track.sync);
    assert_eq!(track.title.as_deref(), Some("X"));

    repo.apply_scan_mutations(&[ScanMutation::ClearMissing {
        file_path: "/lib/A/1.mp3".to_string(),
    }])
    .await
    .unwrap();
    let track = repo.find_by_path("/lib/A/1.mp3").await.unwrap().unwrap();
    assert!(!track.missing);
    assert!(track.sync);

    repo.apply_scan_mutations(&[ScanMutation::MarkMissing {
        file_path: "/lib/A/1.mp3".to_string(),
    }])
    .await
    .unwrap();
    assert_eq!(repo.delete_missing().await.unwrap(), 1);
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_rewrite_path_leaves_metadata_untouched() {
    let pool = create_test_pool().await.unwrap();
    let repo = SqliteTrackRepository::new(pool);

    repo.insert(&new_track("/lib/A/1.mp3", "/A/1.mp3", Some("X")))
        .await
        .unwrap();

    repo.apply_scan_mutations(&[ScanMutation::RewritePath {
        file_path: "/lib/A/1.mp3".to_string(),
        relative_path: "/music/A/1.mp3".to_string(),
    }])
    .await
    .unwrap();

    let track = repo.find_by_path("/lib/A/1.mp3").await.unwrap().unwrap();
    assert_eq!(track.relative_path, "/music/A/1.mp3");
    assert_eq!(track.title.as_deref(), Some("X"));
    assert_eq!(track.mtime, 1_700_000_000);
}

#[tokio::test]
async fn test_playlists_ordered_tracks() {
    let pool = create_test_pool().await.unwrap();
    let tracks = SqliteTrackRepository::new(pool.clone());
    let playlists = SqlitePlaylistRepository::new(pool);

    let a = tracks
        .insert(&new_track("/lib/A/1.mp3", "/A/1.mp3", Some("First")))
        .await
        .unwrap();
    let b = tracks
        .insert(&new_track("/lib/A/2.mp3", "/A/2.mp3", Some("Second")))
        .await
        .unwrap();

    let playlist = playlists.create("Road Trip").await.unwrap();
    // Insert out of order; retrieval must honor position.
    playlists.add_track(playlist.id, b, 1).await.unwrap();
    playlists.add_track(playlist.id, a, 0).await.unwrap();

    let ordered = playlists.tracks(playlist.id).await.unwrap();
    assert_eq!(ordered.len(), 2);
    assert_eq!(ordered[0].title.as_deref(), Some("First"));
    assert_eq!(ordered[1].title.as_deref(), Some("Second"));

    let all = playlists.all_with_tracks().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].0.name, "Road Trip");
    assert_eq!(all[0].1.len(), 2);

    assert!(playlists.remove_track(playlist.id, a).await.unwrap());
    assert!(playlists.delete(playlist.id).await.unwrap());
    assert!(playlists.find_by_id(playlist.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_settings_upsert_and_read() {
    let pool = create_test_pool().await.unwrap();
    let settings = SqliteSettingsRepository::new(pool);

    assert!(settings.get("sync_mode").await.unwrap().is_none());

    settings.set("sync_mode", "adb").await.unwrap();
    settings.set("sync_mode", "ftp").await.unwrap();
    assert_eq!(settings.get("sync_mode").await.unwrap().as_deref(), Some("ftp"));

    settings.set("sync_dest", "/sdcard/Music").await.unwrap();
    let all = settings.all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.get("sync_dest").map(String::as_str), Some("/sdcard/Music"));

    assert!(settings.delete("sync_mode").await.unwrap());
    assert!(!settings.delete("sync_mode").await.unwrap());
}
