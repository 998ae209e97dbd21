//! Filesystem walker
//!
//! Eagerly materializes the full on-disk file list for the configured roots.
//! The reconciliation pass needs complete knowledge of what exists before it
//! can compute tombstones, so this is a finite, restartable sequence rather
//! than a lazy stream.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One file observed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Absolute source path
    pub abs_path: PathBuf,
    /// Catalog-relative path: the suffix of `abs_path` starting at the
    /// parent of the scan root, `/`-separated with a leading `/`, so the
    /// root's own directory name (the album/collection folder) is preserved
    pub relative_path: String,
    /// Modification time, unix seconds
    pub mtime: i64,
}

/// Walk the given roots, yielding files whose lowercased name ends with one
/// of `extensions` (dotted, e.g. `.mp3`).
///
/// Symlinked subtrees are followed. Any directory whose simple name is in
/// `excludes` is pruned before descent, at every level. Missing roots are
/// skipped with a warning; per-file stat failures are skipped and logged.
///
/// Blocking; callers run this off the async loop.
pub fn walk(roots: &[String], extensions: &[String], excludes: &[String]) -> Vec<WalkedFile> {
    let mut results = Vec::new();

    for root in roots {
        let root_path = Path::new(root.trim_end_matches('/'));
        if !root_path.exists() {
            warn!(root = %root, "Scan root does not exist, skipping");
            continue;
        }

        // Relative paths start at the root's parent so "/music/A" yields "/A/...".
        let base = root_path.parent().unwrap_or(root_path);

        let walker = WalkDir::new(root_path).follow_links(true).into_iter();
        let entries = walker.filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !excludes.iter().any(|ex| ex.as_str() == name)
        });

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %root, error = %e, "Walk error, skipping entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Stat failed, skipping file");
                    continue;
                }
            };

            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);

            results.push(WalkedFile {
                abs_path: entry.path().to_path_buf(),
                relative_path: relative_to(entry.path(), base),
                mtime,
            });
        }
    }

    debug!(files = results.len(), "Filesystem walk complete");
    results
}

/// `/`-separated suffix of `path` below `base`, with a leading `/`.
fn relative_to(path: &Path, base: &Path) -> String {
    let suffix = path.strip_prefix(base).unwrap_or(path);
    let joined = suffix
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    format!("/{}", joined.trim_start_matches('/'))
}
