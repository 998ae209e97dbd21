//! M3U rendering for delivering playlists alongside the synced files.

use core_library::models::Track;

/// A playlist rendered to its on-device file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPlaylist {
    pub name: String,
    pub content: String,
}

impl RenderedPlaylist {
    /// File name the playlist is delivered under at the destination root.
    pub fn file_name(&self) -> String {
        format!("{}.m3u", self.name)
    }
}

/// Renders playlist entries as an extended M3U, with every path relative
/// to the destination root. Entries without a usable path are skipped.
pub fn render_m3u(tracks: &[Track]) -> String {
    let mut out = String::from("#EXTM3U\n\n");
    for track in tracks {
        let path = normalize_entry_path(&track.relative_path);
        if path.is_empty() {
            continue;
        }
        let title = track
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&track.file_name);
        out.push_str(&format!("#EXTINF:-1,{title}\n{path}\n\n"));
    }
    out
}

/// Renders every non-empty playlist; empty ones produce no file.
pub fn render_all(playlists: Vec<(String, Vec<Track>)>) -> Vec<RenderedPlaylist> {
    playlists
        .into_iter()
        .filter(|(_, tracks)| !tracks.is_empty())
        .map(|(name, tracks)| RenderedPlaylist {
            content: render_m3u(&tracks),
            name,
        })
        .collect()
}

fn normalize_entry_path(raw: &str) -> String {
    raw.replace('\\', "/").trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn track(relative_path: &str, file_name: &str, title: Option<&str>) -> Track {
        Track {
            id: 0,
            file_path: format!("/music{relative_path}"),
            relative_path: relative_path.to_string(),
            file_name: file_name.to_string(),
            title: title.map(str::to_string),
            artist: None,
            album: None,
            album_artist: None,
            composer: None,
            track_number: None,
            duration: None,
            codec: None,
            status: None,
            sync: true,
            missing: false,
            mtime: 0,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn renders_header_and_entries() {
        let rendered = render_m3u(&[
            track("/Collection/a.mp3", "a.mp3", Some("Alpha")),
            track("/Collection/sub/b.mp3", "b.mp3", None),
        ]);
        assert_eq!(
            rendered,
            "#EXTM3U\n\n#EXTINF:-1,Alpha\nCollection/a.mp3\n\n#EXTINF:-1,b.mp3\nCollection/sub/b.mp3\n\n"
        );
    }

    #[test]
    fn skips_entries_without_a_path() {
        let rendered = render_m3u(&[track("", "ghost.mp3", Some("Ghost"))]);
        assert_eq!(rendered, "#EXTM3U\n\n");
    }

    #[test]
    fn empty_playlists_are_dropped() {
        let rendered = render_all(vec![
            ("Road Trip".into(), vec![track("/a.mp3", "a.mp3", None)]),
            ("Empty".into(), vec![]),
        ]);
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].file_name(), "Road Trip.m3u");
    }
}
