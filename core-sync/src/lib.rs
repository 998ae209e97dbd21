//! ## Overview
//!
//! Pushes the catalog's selected tracks and playlists onto a device.
//! [`syncer::Syncer`] drives a pass end to end; the delivery mechanism
//! is chosen by the `sync_mode` setting and implemented behind the
//! [`transport::Transport`] trait (adb, FTP, or rsync).

pub mod error;
pub mod playlist;
pub mod settings;
pub mod syncer;
pub mod transport;

pub use error::SyncError;
pub use playlist::{render_all, render_m3u, RenderedPlaylist};
pub use settings::{SyncMode, SyncSettings};
pub use syncer::{SyncLogger, Syncer};
pub use transport::{RemoteEntry, Transport};
