//! ## Overview
//!
//! Delivery backends behind a common [`Transport`] trait. Every path a
//! transport receives is relative to the configured destination root,
//! uses `/` separators, and has no leading slash. Implementations are
//! blocking and run from a dedicated worker thread.

pub mod adb;
pub mod ftp;
pub mod rsync;

use std::path::Path;

use crate::error::SyncError;

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Minimal file operations a sync pass needs against a destination.
///
/// `list` distinguishes a missing directory ([`SyncError::RemoteNotFound`])
/// from an existing empty one; `remove` and `make_dir_all` tolerate
/// already-absent and already-present targets respectively.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Copies a local file to `remote_rel` under the destination root.
    fn copy_in(&mut self, local: &Path, remote_rel: &str) -> Result<(), SyncError>;

    /// Removes a remote file. A missing target is not an error.
    fn remove(&mut self, remote_rel: &str) -> Result<(), SyncError>;

    /// Creates a remote directory and any missing parents.
    fn make_dir_all(&mut self, remote_rel: &str) -> Result<(), SyncError>;

    /// Lists a remote directory, non-recursively.
    fn list(&mut self, remote_rel: &str) -> Result<Vec<RemoteEntry>, SyncError>;
}

/// Joins a destination root and a relative path with single separators.
pub(crate) fn join_remote(root: &str, rel: &str) -> String {
    let rel = rel.trim_matches('/');
    if rel.is_empty() {
        root.to_string()
    } else {
        format!("{}/{}", root.trim_end_matches('/'), rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_remote_normalizes_separators() {
        assert_eq!(join_remote("/sdcard/Music", "a/b.mp3"), "/sdcard/Music/a/b.mp3");
        assert_eq!(join_remote("/sdcard/Music/", "/a.mp3"), "/sdcard/Music/a.mp3");
        assert_eq!(join_remote("/sdcard/Music", ""), "/sdcard/Music");
    }
}
