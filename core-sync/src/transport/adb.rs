//! Device delivery over `adb push`/`adb shell`.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::SyncError;
use crate::transport::{join_remote, RemoteEntry, Transport};

pub struct AdbTransport {
    root: String,
}

impl AdbTransport {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    fn shell(&self, command: String) -> Result<std::process::Output, SyncError> {
        debug!(%command, "adb shell");
        Command::new("adb")
            .arg("shell")
            .arg(command)
            .output()
            .map_err(|e| SyncError::Connection(format!("adb not available: {e}")))
    }
}

impl Transport for AdbTransport {
    fn copy_in(&mut self, local: &Path, remote_rel: &str) -> Result<(), SyncError> {
        let target = join_remote(&self.root, remote_rel);
        let output = Command::new("adb")
            .arg("push")
            .arg(local)
            .arg(&target)
            .output()
            .map_err(|e| SyncError::Connection(format!("adb not available: {e}")))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(SyncError::Transport(format!(
                "adb push {} failed: {}",
                target,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn remove(&mut self, remote_rel: &str) -> Result<(), SyncError> {
        let target = join_remote(&self.root, remote_rel);
        // rm -f keeps an already-absent target from failing the call.
        let output = self.shell(format!("rm -f {}", quote(&target)))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(SyncError::Transport(format!(
                "adb rm {} failed: {}",
                target,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn make_dir_all(&mut self, remote_rel: &str) -> Result<(), SyncError> {
        let target = join_remote(&self.root, remote_rel);
        let output = self.shell(format!("mkdir -p {}", quote(&target)))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(SyncError::Transport(format!(
                "adb mkdir {} failed: {}",
                target,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn list(&mut self, remote_rel: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        let target = join_remote(&self.root, remote_rel);
        let output = self.shell(format!("ls {} -F1", quote(&target)))?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() || stderr.contains("No such file or directory") {
            return Err(SyncError::RemoteNotFound(target));
        }
        Ok(parse_ls_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Quotes a path for the device-side shell, escaping characters the
/// shell would otherwise interpret inside double quotes.
fn quote(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len() + 2);
    escaped.push('"');
    for c in path.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('"');
    escaped
}

/// Parses `ls -F1` output: a trailing `/` marks a directory, a trailing
/// `*` marks an executable file; anything else is a plain file.
fn parse_ls_output(stdout: &str) -> Vec<RemoteEntry> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if let Some(name) = line.strip_suffix('/') {
                RemoteEntry {
                    name: name.to_string(),
                    is_dir: true,
                }
            } else {
                RemoteEntry {
                    name: line.strip_suffix('*').unwrap_or(line).to_string(),
                    is_dir: false,
                }
            }
        })
        .collect()
}
