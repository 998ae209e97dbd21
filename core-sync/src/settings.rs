//! Sync configuration read from the settings table.

use std::collections::HashMap;

use crate::error::SyncError;

const DEFAULT_TARGET_EXTS: &str = "mp3,mp4,m4a";
const DEFAULT_FTP_PORT: u16 = 2221;
const DEFAULT_SSH_PORT: u16 = 22;

/// Which delivery mechanism a sync pass runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Adb,
    Rsync,
    Ftp,
}

impl SyncMode {
    pub fn parse(value: &str) -> Result<Self, SyncError> {
        match value.trim().to_lowercase().as_str() {
            "adb" => Ok(SyncMode::Adb),
            "rsync" => Ok(SyncMode::Rsync),
            "ftp" => Ok(SyncMode::Ftp),
            other => Err(SyncError::UnknownMode(other.to_string())),
        }
    }
}

/// FTP endpoint coordinates.
#[derive(Debug, Clone)]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

/// Rsync-over-ssh coordinates. `host == None` means the destination is a
/// local directory and no ssh tunnel is involved.
#[derive(Debug, Clone)]
pub struct RsyncConfig {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub key_file: Option<String>,
}

/// Everything a sync pass needs, resolved from raw settings rows.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub mode: SyncMode,
    pub dest: String,
    pub target_exts: Vec<String>,
    pub roots: Vec<String>,
    pub ftp: FtpConfig,
    pub rsync: RsyncConfig,
}

impl SyncSettings {
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, SyncError> {
        let mode = SyncMode::parse(map.get("sync_mode").map(String::as_str).unwrap_or("adb"))?;

        let dest = map
            .get("sync_dest")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_default();
        if dest.is_empty() {
            return Err(SyncError::Config("sync_dest is not configured".into()));
        }

        let target_exts = parse_extensions(
            map.get("target_exts")
                .map(String::as_str)
                .unwrap_or(DEFAULT_TARGET_EXTS),
        );

        let ftp = FtpConfig {
            host: map.get("ftp_host").cloned().unwrap_or_default(),
            port: parse_port(map.get("ftp_port"), DEFAULT_FTP_PORT),
            user: map.get("ftp_user").cloned().unwrap_or_default(),
            pass: map.get("ftp_pass").cloned().unwrap_or_default(),
        };

        let rsync = RsyncConfig {
            host: non_empty(map.get("rsync_host")),
            port: parse_port(map.get("rsync_port"), DEFAULT_SSH_PORT),
            user: non_empty(map.get("rsync_user")),
            password: non_empty(map.get("rsync_password")),
            key_file: non_empty(map.get("rsync_key_file")),
        };

        Ok(SyncSettings {
            mode,
            dest,
            target_exts,
            roots: parse_roots(map.get("scan_paths")),
            ftp,
            rsync,
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_port(value: Option<&String>, default: u16) -> u16 {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Comma-separated extension list, normalized to lowercase with a
/// leading dot.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{e}"))
        .collect()
}

/// `scan_paths` is a JSON array of directories, with a single bare path
/// accepted for catalogs written before the list form existed.
fn parse_roots(raw: Option<&String>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }
    let single = raw.trim();
    if single.is_empty() {
        Vec::new()
    } else {
        vec![single.to_string()]
    }
}
