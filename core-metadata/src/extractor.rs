//! Audio tag extraction
//!
//! Dispatches on the file extension to one of two tag-reading strategies:
//! ID3-style containers (`.mp3`) and atom-style containers (`.mp4`/`.m4a`).
//! Anything else is probed generically. All strategies produce a
//! [`TrackPatch`]; failures are captured in `patch.status` rather than
//! returned, and the two marker values distinguish "readable file, no tag
//! header" (recoverable, the file still gets cataloged) from "could not be
//! parsed at all".

use core_library::TrackPatch;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::prelude::ItemKey;
use lofty::tag::{Accessor, Tag};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;

/// Status marker for a container with no tag header.
pub const STATUS_NO_TAGS: &str = "!";

/// Status marker for a file that could not be parsed.
pub const STATUS_ERROR: &str = "Error";

/// Extract metadata from an audio file into a [`TrackPatch`].
///
/// Blocking; scan passes run this on a worker thread. Never fails: a parse
/// error yields a patch whose `status` is [`STATUS_ERROR`] with the tag
/// fields left unset, and a tag-less container yields [`STATUS_NO_TAGS`].
pub fn extract(path: &Path) -> TrackPatch {
    let mut patch = TrackPatch {
        file_name: file_stem(path),
        ..TrackPatch::default()
    };

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp3" => {
            patch.codec = Some("mp3".to_string());
            match read_container(path) {
                Ok(file) => apply_id3(&mut patch, &file),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Metadata extraction failed");
                    patch.status = Some(STATUS_ERROR.to_string());
                }
            }
        }
        "mp4" | "m4a" => {
            patch.codec = Some("mp4".to_string());
            match read_container(path) {
                Ok(file) => apply_atoms(&mut patch, &file),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Metadata extraction failed");
                    patch.status = Some(STATUS_ERROR.to_string());
                }
            }
        }
        _ => match read_container(path) {
            Ok(file) => {
                patch.codec = Some(format!("{:?}", file.file_type()).to_lowercase());
                apply_id3(&mut patch, &file);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Metadata extraction failed");
                patch.status = Some(STATUS_ERROR.to_string());
            }
        },
    }

    debug!(
        path = %path.display(),
        status = patch.status.as_deref().unwrap_or("ok"),
        "Extracted metadata"
    );

    patch
}

fn read_container(path: &Path) -> Result<TaggedFile> {
    Ok(lofty::read_from_path(path)?)
}

/// ID3-style strategy: the raw track-number text is kept as stored in the
/// tag (may already be `"3/12"`).
fn apply_id3(patch: &mut TrackPatch, file: &TaggedFile) {
    // Duration comes from the container properties, not the tag, so a
    // tag-less file still gets one.
    patch.duration = Some(file.properties().duration().as_secs() as i64);
    let Some(tag) = primary_tag(file) else {
        patch.status = Some(STATUS_NO_TAGS.to_string());
        return;
    };

    apply_common(patch, tag);
    patch.track_number = tag
        .get_string(&ItemKey::TrackNumber)
        .map(str::to_string)
        .or_else(|| tag.track().map(|n| n.to_string()));
}

/// Atom-style strategy: the track atom is a `(index, total)` pair rendered
/// `"index"` or `"index/total"` when a total is present.
fn apply_atoms(patch: &mut TrackPatch, file: &TaggedFile) {
    patch.duration = Some(file.properties().duration().as_secs() as i64);
    let Some(tag) = primary_tag(file) else {
        patch.status = Some(STATUS_NO_TAGS.to_string());
        return;
    };

    apply_common(patch, tag);
    patch.track_number = render_track_pair(tag.track(), tag.track_total());
}

fn apply_common(patch: &mut TrackPatch, tag: &Tag) {
    patch.title = tag.title().map(|s| s.into_owned());
    patch.artist = tag.artist().map(|s| s.into_owned());
    patch.album = tag.album().map(|s| s.into_owned());
    patch.album_artist = tag.get_string(&ItemKey::AlbumArtist).map(str::to_string);
    patch.composer = tag.get_string(&ItemKey::Composer).map(str::to_string);
}

fn primary_tag(file: &TaggedFile) -> Option<&Tag> {
    file.primary_tag().or_else(|| file.first_tag())
}

fn render_track_pair(index: Option<u32>, total: Option<u32>) -> Option<String> {
    let index = index?;
    match total {
        Some(total) if total > 0 => Some(format!("{}/{}", index, total)),
        _ => Some(index.to_string()),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_track_pair() {
        assert_eq!(render_track_pair(Some(3), Some(12)).as_deref(), Some("3/12"));
        assert_eq!(render_track_pair(Some(3), Some(0)).as_deref(), Some("3"));
        assert_eq!(render_track_pair(Some(3), None).as_deref(), Some("3"));
        assert_eq!(render_track_pair(None, Some(12)), None);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("/lib/A/Song.mp3")), "Song");
        assert_eq!(file_stem(Path::new("noext")), "noext");
    }

    #[test]
    fn test_missing_file_degrades_to_error_status() {
        let patch = extract(Path::new("/nonexistent/file.mp3"));
        assert_eq!(patch.status.as_deref(), Some(STATUS_ERROR));
        assert_eq!(patch.codec.as_deref(), Some("mp3"));
        assert_eq!(patch.file_name, "file");
        assert!(patch.title.is_none());
    }

    #[test]
    fn test_garbage_bytes_degrade_to_error_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.m4a");
        std::fs::write(&path, b"this is not an mp4 container").unwrap();

        let patch = extract(&path);
        assert_eq!(patch.status.as_deref(), Some(STATUS_ERROR));
        assert_eq!(patch.codec.as_deref(), Some("mp4"));
    }
}
