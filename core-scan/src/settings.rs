//! Scan settings
//!
//! Parsed once from the settings store at the start of a pass and treated as
//! an immutable value object from then on.

use std::collections::HashMap;
use tracing::warn;

/// Default extension list when `target_exts` is unset.
pub const DEFAULT_TARGET_EXTS: &str = "mp3,mp4,m4a";

/// Read-only input to one scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// Ordered scan root directories
    pub roots: Vec<String>,
    /// Included extensions, lowercased, stored with a leading dot (`.mp3`)
    pub extensions: Vec<String>,
    /// Directory names pruned at every tree level
    pub exclude_dirs: Vec<String>,
}

impl ScanSettings {
    /// Build scan settings from the raw key/value settings map.
    ///
    /// `scan_paths` is a JSON list of strings; a legacy value that is a bare
    /// path (not starting with `[`) is accepted as a single root.
    /// `target_exts` and `exclude_dirs` are comma-separated lists.
    pub fn from_map(settings: &HashMap<String, String>) -> Self {
        let roots = parse_roots(settings.get("scan_paths").map(String::as_str).unwrap_or("[]"));

        let extensions = parse_extensions(
            settings
                .get("target_exts")
                .map(String::as_str)
                .unwrap_or(DEFAULT_TARGET_EXTS),
        );

        let exclude_dirs = settings
            .get("exclude_dirs")
            .map(String::as_str)
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            roots,
            extensions,
            exclude_dirs,
        }
    }
}

/// Dotted, lowercased extension list from a comma-separated value.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.trim_start_matches('.').to_lowercase()))
        .collect()
}

fn parse_roots(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(roots) => roots,
        Err(_) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('[') {
                if !trimmed.is_empty() {
                    warn!(value = raw, "Unparseable scan_paths setting, treating as empty");
                }
                Vec::new()
            } else {
                // Legacy single-path value.
                vec![trimmed.to_string()]
            }
        }
    }
}
